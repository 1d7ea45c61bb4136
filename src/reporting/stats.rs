//! Per-subtype service statistics: one count row per service kind plus
//! breakdown rows for the kinds that carry countable flags or quantities.

use rusqlite::Connection;

use crate::db::DatabaseError;
use crate::models::enums::ServiceKind;
use crate::models::{ReportScope, ServiceDetail};

use super::queries::{matched_services, MatchedService};
use super::rows::{normalize_filename, Cell, Report, Row};

/// Fixed row order of the statistics sheet; the numbered kinds keep their
/// historical form code numbers.
const KIND_ORDER: [ServiceKind; 22] = [
    ServiceKind::IncomeExamination,
    ServiceKind::Address,
    ServiceKind::HarmReduction,
    ServiceKind::ContactWork,
    ServiceKind::IndividualCounselling,
    ServiceKind::SocialWork,
    ServiceKind::CrisisIntervention,
    ServiceKind::DiseaseTest,
    ServiceKind::AsistService,
    ServiceKind::InformationService,
    ServiceKind::PhoneCounselling,
    ServiceKind::UtilityWork,
    ServiceKind::BasicMedicalTreatment,
    ServiceKind::IncomeFormFillup,
    ServiceKind::GroupCounselling,
    ServiceKind::WorkTherapy,
    ServiceKind::WorkTherapyMeeting,
    ServiceKind::WorkWithFamily,
    ServiceKind::HygienicService,
    ServiceKind::FoodService,
    ServiceKind::PostUsage,
    ServiceKind::UrineTest,
];

pub fn service_title(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Address => "Oslovení",
        ServiceKind::ContactWork => "Kontaktní práce",
        ServiceKind::IncomeFormFillup => "Vyplnění IN-COME dotazníku",
        ServiceKind::IncomeExamination => "První kontakt",
        ServiceKind::IndividualCounselling => "Základní poradenství",
        ServiceKind::GroupCounselling => "Skupinové poradenství",
        ServiceKind::CrisisIntervention => "Krizová intervence",
        ServiceKind::SocialWork => "Případová práce",
        ServiceKind::HarmReduction => "Výměnný a jiný harm reduction program",
        ServiceKind::BasicMedicalTreatment => "Základní zdravotní ošetření",
        ServiceKind::InformationService => "Informační servis",
        ServiceKind::DiseaseTest => "Testování infekčních nemocí",
        ServiceKind::HygienicService => "Hygienický servis",
        ServiceKind::FoodService => "Potravinový servis",
        ServiceKind::WorkTherapy => "Pracovní terapie",
        ServiceKind::WorkTherapyMeeting => "Setkání pracovní terapie",
        ServiceKind::UtilityWork => "Odkazy",
        ServiceKind::AsistService => "Doprovod klienta",
        ServiceKind::PostUsage => "Korespondenční práce",
        ServiceKind::UrineTest => "Orientační test z moči",
        ServiceKind::WorkWithFamily => "Práce s rodinou",
        ServiceKind::PhoneCounselling => "Telefonický kontakt",
    }
}

pub struct ServiceStatsReport {
    scope: ReportScope,
}

impl ServiceStatsReport {
    pub fn new(scope: ReportScope) -> Self {
        Self { scope }
    }

    fn kind_rows(kind: ServiceKind, services: &[&MatchedService]) -> Vec<Row> {
        let title = service_title(kind);
        let count = services.len();
        let flag = |label: &str, predicate: fn(&ServiceDetail) -> bool| {
            Row::values(
                label,
                vec![Cell::from(
                    services.iter().filter(|s| predicate(&s.detail)).count(),
                )],
            )
        };

        match kind {
            ServiceKind::HarmReduction => {
                let (mut in_sum, mut out_sum, mut svip_sum, mut svip_max) = (0i64, 0i64, 0i64, 0i64);
                for s in services {
                    if let ServiceDetail::HarmReduction {
                        in_count,
                        out_count,
                        svip_person_count,
                        ..
                    } = &s.detail
                    {
                        in_sum += i64::from(*in_count);
                        out_sum += i64::from(*out_count);
                        svip_sum += i64::from(*svip_person_count);
                        svip_max = svip_max.max(i64::from(*svip_person_count));
                    }
                }
                let svip_avg = if services.is_empty() {
                    0
                } else {
                    (svip_sum as f64 / services.len() as f64).round() as i64
                };

                let mut rows = vec![Row::values(title, vec![Cell::from(count)])];
                for (label, pick) in HARM_REDUCTION_FLAGS {
                    rows.push(flag(label, pick));
                }
                rows.push(Row::values("IN", vec![Cell::number(in_sum)]));
                rows.push(Row::values("OUT", vec![Cell::number(out_sum)]));
                rows.push(Row::values(
                    "Průměrný počet osob ve SVIP",
                    vec![Cell::number(svip_avg)],
                ));
                rows.push(Row::values(
                    "Nejvyšší počet osob ve SVIP",
                    vec![Cell::number(svip_max)],
                ));
                rows
            }
            ServiceKind::DiseaseTest => {
                let mut rows = vec![Row::values(title, vec![Cell::from(count)])];
                for (label, pick) in DISEASE_TEST_FLAGS {
                    rows.push(flag(label, pick));
                }
                rows
            }
            ServiceKind::SocialWork => {
                let mut rows = vec![Row::values(title, vec![Cell::from(count)])];
                for (label, pick) in SOCIAL_WORK_FLAGS {
                    rows.push(flag(label, pick));
                }
                rows
            }
            ServiceKind::InformationService => {
                // The total is the sum of the (non-exclusive) topic flags, so
                // one service with several topics counts several times.
                let flag_rows: Vec<Row> = INFORMATION_SERVICE_FLAGS
                    .iter()
                    .map(|&(label, pick)| flag(label, pick))
                    .collect();
                let total: i64 = flag_rows
                    .iter()
                    .filter_map(|r| match r.cells.first() {
                        Some(Cell::Number(n)) => Some(*n),
                        _ => None,
                    })
                    .sum();
                let mut rows = vec![Row::values(title, vec![Cell::number(total)])];
                rows.extend(flag_rows);
                rows
            }
            ServiceKind::UtilityWork => {
                // Count every selected referral target across all records.
                let refs: usize = services
                    .iter()
                    .map(|s| match &s.detail {
                        ServiceDetail::UtilityWork { refs } => refs.len(),
                        _ => 0,
                    })
                    .sum();
                vec![Row::values(title, vec![Cell::from(refs)])]
            }
            _ => vec![Row::values(title, vec![Cell::from(count)])],
        }
    }
}

type FlagPick = (&'static str, fn(&ServiceDetail) -> bool);

static HARM_REDUCTION_FLAGS: [FlagPick; 8] = [
    ("1) standard", |d| {
        matches!(d, ServiceDetail::HarmReduction { standard: true, .. })
    }),
    ("2) kyselina", |d| {
        matches!(d, ServiceDetail::HarmReduction { acid: true, .. })
    }),
    ("3) alternativy", |d| {
        matches!(d, ServiceDetail::HarmReduction { alternatives: true, .. })
    }),
    ("4) prezervativy", |d| {
        matches!(d, ServiceDetail::HarmReduction { condoms: true, .. })
    }),
    ("5) Stéri-cup/filt", |d| {
        matches!(d, ServiceDetail::HarmReduction { stericup: true, .. })
    }),
    ("6) jiný materiál", |d| {
        matches!(d, ServiceDetail::HarmReduction { other: true, .. })
    }),
    ("7) těhotenský test", |d| {
        matches!(d, ServiceDetail::HarmReduction { pregnancy_test: true, .. })
    }),
    ("8) zdravotní", |d| {
        matches!(d, ServiceDetail::HarmReduction { medical_supplies: true, .. })
    }),
];

static DISEASE_TEST_FLAGS: [FlagPick; 3] = [
    ("Předtestové poradenství", |d| {
        matches!(d, ServiceDetail::DiseaseTest { pre_test_advice: true, .. })
    }),
    ("Provedení testu", |d| {
        matches!(d, ServiceDetail::DiseaseTest { test_execution: true, .. })
    }),
    ("Potestové poradenství", |d| {
        matches!(d, ServiceDetail::DiseaseTest { post_test_advice: true, .. })
    }),
];

static SOCIAL_WORK_FLAGS: [FlagPick; 4] = [
    ("a) sociálně-právní", |d| {
        matches!(d, ServiceDetail::SocialWork { socio_legal: true, .. })
    }),
    ("b) předléčebné indiviuální poradenství", |d| {
        matches!(d, ServiceDetail::SocialWork { counselling: true, .. })
    }),
    ("c) zprostředkování dalších služeb", |d| {
        matches!(d, ServiceDetail::SocialWork { service_mediation: true, .. })
    }),
    ("d) jiná", |d| {
        matches!(d, ServiceDetail::SocialWork { other: true, .. })
    }),
];

static INFORMATION_SERVICE_FLAGS: [FlagPick; 7] = [
    ("1) bezpečné užívání", |d| {
        matches!(d, ServiceDetail::InformationService { safe_usage: true, .. })
    }),
    ("2) bezpečný sex", |d| {
        matches!(d, ServiceDetail::InformationService { safe_sex: true, .. })
    }),
    ("3) zdravotní", |d| {
        matches!(d, ServiceDetail::InformationService { medical: true, .. })
    }),
    ("4) sociálně-právní", |d| {
        matches!(d, ServiceDetail::InformationService { socio_legal: true, .. })
    }),
    ("5) možnosti léčby", |d| {
        matches!(
            d,
            ServiceDetail::InformationService { cure_possibilities: true, .. }
        )
    }),
    ("6) literatura", |d| {
        matches!(d, ServiceDetail::InformationService { literature: true, .. })
    }),
    ("7) ostatní", |d| {
        matches!(d, ServiceDetail::InformationService { other: true, .. })
    }),
];

impl Report for ServiceStatsReport {
    fn title(&self) -> String {
        "Statistika výkonů".into()
    }

    fn description(&self) -> String {
        "Souhrnné počty výkonů podle druhu za zvolené období.".into()
    }

    fn filename(&self) -> String {
        normalize_filename(&format!(
            "statistika_vykonu_{}_{}.xls",
            self.scope.date_from, self.scope.date_to
        ))
    }

    fn rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError> {
        let services = matched_services(conn, &self.scope)?;

        let mut rows = Vec::new();
        for kind in KIND_ORDER {
            let of_kind: Vec<&MatchedService> =
                services.iter().filter(|s| s.kind() == kind).collect();
            rows.extend(Self::kind_rows(kind, &of_kind));
        }
        Ok(rows)
    }
}
