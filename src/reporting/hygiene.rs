//! Summary print output for the public-health (hygiene) authority.
//!
//! Covers clients whose first encounter of the calendar year falls inside
//! the reporting window and who have an anamnesis filled up; each is
//! classified by intravenous-application and syringe-sharing risk.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_anamnesis_for_client, get_person, get_risky_manners};
use crate::db::DatabaseError;
use crate::models::enums::{Periodicity, RiskyBehavior, ServiceKind};
use crate::models::{Person, ReportScope, RiskyManners};

use super::queries::{first_encounters_in_year, matched_encounters, matched_services};
use super::rows::{normalize_filename, Cell, Report, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HygieneKind {
    /// Every classified client in the window.
    Prevalence,
    /// Only clients never treated before the window.
    Incidence,
}

/// Intravenous-application risk class. The letters are the codes the
/// hygiene-authority form uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntravenousClass {
    /// a — applied intravenously in the past, not at present
    PastOnly,
    /// b — applies intravenously at present
    Current,
    /// c — never applied intravenously
    Never,
    /// d — unknown or not stated
    Unknown,
}

impl IntravenousClass {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PastOnly => "a",
            Self::Current => "b",
            Self::Never => "c",
            Self::Unknown => "d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingClass {
    Yes,
    No,
    Unknown,
}

impl SharingClass {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }
}

/// Classifies intravenous application from the risky-manners record, if
/// any. Pure function of the two periodicity fields; a missing record or an
/// unexpected combination degrades to `Unknown`.
pub fn classify_intravenous(record: Option<&RiskyManners>) -> IntravenousClass {
    use Periodicity::{Never, Often, Once};

    let Some(manners) = record else {
        return IntravenousClass::Unknown;
    };
    match (manners.periodicity_in_present, manners.periodicity_in_past) {
        (Some(Never), Some(Never)) => IntravenousClass::Never,
        (Some(Once | Often), _) => IntravenousClass::Current,
        (Some(Never), Some(Once | Often)) => IntravenousClass::PastOnly,
        _ => IntravenousClass::Unknown,
    }
}

/// Classifies syringe sharing; only meaningful for classes `a` and `b`, so
/// any other first-stage result yields `None`. Past periodicity is examined
/// for past-only users, present periodicity for current users.
pub fn classify_sharing(
    intravenous: IntravenousClass,
    record: Option<&RiskyManners>,
) -> Option<SharingClass> {
    use Periodicity::{Never, Often, Once};

    let periodicity = match intravenous {
        IntravenousClass::Current => record.and_then(|m| m.periodicity_in_present),
        IntravenousClass::PastOnly => record.and_then(|m| m.periodicity_in_past),
        IntravenousClass::Never | IntravenousClass::Unknown => return None,
    };
    Some(match periodicity {
        Some(Once | Often) => SharingClass::Yes,
        Some(Never) => SharingClass::No,
        None => SharingClass::Unknown,
    })
}

/// One classified client of the hygiene report.
#[derive(Debug, Clone)]
pub struct HygieneRecord {
    pub client: Person,
    pub first_encounter: NaiveDate,
    /// True iff no income-examination service exists among the client's
    /// matched encounters.
    pub been_cured_before: bool,
    pub intravenous: IntravenousClass,
    pub sharing: Option<SharingClass>,
}

pub struct HygieneReport {
    scope: ReportScope,
    kind: HygieneKind,
}

impl HygieneReport {
    pub fn new(scope: ReportScope, kind: HygieneKind) -> Self {
        Self { scope, kind }
    }

    /// Collects and classifies the clients to report, in a deterministic
    /// order (first encounter date, then client code).
    pub fn records(&self, conn: &Connection) -> Result<Vec<HygieneRecord>, DatabaseError> {
        let scope = &self.scope;

        // Clients whose first encounter of the year falls into the window.
        let first_of_year = first_encounters_in_year(conn, scope.year(), &scope.towns)?;
        let candidates: HashSet<Uuid> = first_of_year
            .iter()
            .filter(|(_, first)| scope.contains_date(**first))
            .map(|(person_id, _)| *person_id)
            .collect();

        // Their encounters inside the window, grouped per client.
        let mut encounters_by_client: HashMap<Uuid, (NaiveDate, Vec<Uuid>)> = HashMap::new();
        for e in matched_encounters(conn, scope)? {
            if !candidates.contains(&e.person_id) {
                continue;
            }
            let entry = encounters_by_client
                .entry(e.person_id)
                .or_insert((e.performed_on, Vec::new()));
            entry.0 = entry.0.min(e.performed_on);
            entry.1.push(e.id);
        }

        // Encounters that included an income examination (first contact).
        let examined_encounters: HashSet<Uuid> = matched_services(conn, scope)?
            .iter()
            .filter(|s| s.kind() == ServiceKind::IncomeExamination)
            .map(|s| s.encounter_id)
            .collect();

        let mut records = Vec::new();
        for (client_id, (first_encounter, encounter_ids)) in &encounters_by_client {
            // Only clients with an anamnesis filled up are reported.
            let Some(anamnesis) = get_anamnesis_for_client(conn, client_id)? else {
                continue;
            };

            let been_cured_before = !encounter_ids
                .iter()
                .any(|id| examined_encounters.contains(id));
            if self.kind == HygieneKind::Incidence && been_cured_before {
                continue;
            }

            let iv_record =
                get_risky_manners(conn, &anamnesis.id, RiskyBehavior::IntravenousApplication)?;
            let intravenous = classify_intravenous(iv_record.as_ref());

            let sharing = if matches!(
                intravenous,
                IntravenousClass::PastOnly | IntravenousClass::Current
            ) {
                let sharing_record =
                    get_risky_manners(conn, &anamnesis.id, RiskyBehavior::SyringeSharing)?;
                classify_sharing(intravenous, sharing_record.as_ref())
            } else {
                None
            };

            let Some(client) = get_person(conn, client_id)? else {
                tracing::warn!(client = %client_id, "anamnesis without person record, skipping");
                continue;
            };

            records.push(HygieneRecord {
                client,
                first_encounter: *first_encounter,
                been_cured_before,
                intravenous,
                sharing,
            });
        }

        records.sort_by(|a, b| {
            (a.first_encounter, &a.client.code).cmp(&(b.first_encounter, &b.client.code))
        });
        Ok(records)
    }
}

impl Report for HygieneReport {
    fn title(&self) -> String {
        "Výstup pro hygienu".into()
    }

    fn description(&self) -> String {
        "Souhrnný tiskový výstup pro hygienu.".into()
    }

    fn filename(&self) -> String {
        normalize_filename(&format!(
            "vystup_pro_hygienu_{}_{}.doc",
            self.scope.date_from, self.scope.date_to
        ))
    }

    fn rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError> {
        let records = self.records(conn)?;
        Ok(records
            .into_iter()
            .map(|r| {
                Row::values(
                    r.client.code.clone(),
                    vec![
                        Cell::text(r.client.sex.as_str()),
                        r.client
                            .birthdate
                            .map_or(Cell::Empty, |d| Cell::number(i64::from(d.year()))),
                        Cell::text(r.first_encounter.to_string()),
                        Cell::text(if r.been_cured_before { "yes" } else { "no" }),
                        Cell::text(r.intravenous.code()),
                        r.sharing.map_or(Cell::Empty, |s| Cell::text(s.code())),
                    ],
                )
            })
            .collect())
    }
}
