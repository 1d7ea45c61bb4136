//! RVKPP report — print output for the Government Council for Drug Policy
//! Coordination. Two sheets: client counts by primary-drug group and
//! performed-service counts. Row order mirrors the official form and must
//! not change.

use std::collections::HashSet;

use chrono::Datelike;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::anonymous_ids;
use crate::db::DatabaseError;
use crate::models::enums::{Disease, Drug, DrugApplication, ServiceKind, Sex};
use crate::models::{Person, ReportScope, ServiceDetail};

use super::queries::{
    anonymous_service_count, average_age, client_count, drug_users, matched_encounters,
    matched_services, non_drug_user_clients, service_count, syringes_collected, MatchedService,
};
use super::rows::{Cell, Report, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouncilKind {
    Clients,
    Services,
}

pub struct CouncilReport {
    scope: ReportScope,
    kind: CouncilKind,
    /// Year ages are computed against; "now" in production runs.
    reference_year: i32,
}

impl CouncilReport {
    pub fn new(scope: ReportScope, kind: CouncilKind) -> Self {
        let reference_year = chrono::Local::now().year();
        Self::with_reference_year(scope, kind, reference_year)
    }

    pub fn with_reference_year(scope: ReportScope, kind: CouncilKind, reference_year: i32) -> Self {
        Self {
            scope,
            kind,
            reference_year,
        }
    }

    fn clients_rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError> {
        let users = drug_users(conn, &self.scope)?;
        let non_drug_users = non_drug_user_clients(conn, &self.scope)?;
        let services = matched_services(conn, &self.scope)?;
        let anonymous = anonymous_ids(conn)?;

        let with_drug = |drugs: &[Drug]| -> Vec<&Person> {
            users
                .iter()
                .filter(|c| c.primary_drug.is_some_and(|d| drugs.contains(&d)))
                .collect()
        };
        let drug = |drugs: &[Drug]| Cell::from(with_drug(drugs).len());
        let males = |group: &[&Person]| {
            Cell::from(group.iter().filter(|c| c.sex == Sex::Male).count())
        };

        let non_alcohol: Vec<&Person> = users
            .iter()
            .filter(|c| !matches!(c.primary_drug, Some(Drug::Alcohol | Drug::Tobacco)))
            .collect();
        let alcohol = with_drug(&[Drug::Alcohol]);
        let tobacco = with_drug(&[Drug::Tobacco]);
        let non_substance = with_drug(&[
            Drug::PathologicalGambling,
            Drug::OtherNonSubstanceAddiction,
        ]);
        let injecting = non_alcohol
            .iter()
            .filter(|c| {
                matches!(
                    c.primary_drug_usage,
                    Some(DrugApplication::VeinInjection | DrugApplication::MuscleInjection)
                )
            })
            .count();
        let first_contacts = client_count(&services, &[ServiceKind::IncomeExamination], &anonymous);
        let year = self.reference_year;

        Ok(vec![
            Row::header("TP - terénní programy"),
            Row::section(
                "skupina 1",
                "Klienti - uživatelé drog, kromě alkoholu (sk. 2) a tabáku (sk. 3)",
            ),
            Row::data("1.1", "základní droga heroin", vec![drug(&[Drug::Heroin])]),
            Row::data(
                "1.2",
                "základní droga buprenorfin - zneužívaný (non lege artis, injekčně, \
                 bez indikace lékařem, z černého trhu atd.)",
                vec![drug(&[
                    Drug::SubutexLegal,
                    Drug::SubutexIllegal,
                    Drug::Suboxone,
                ])],
            ),
            Row::data(
                "1.3",
                "základní droga metadon - zneužívaný (non lege artis, injekčně, \
                 bez indikace lékařem, z černého trhu atd.)",
                vec![drug(&[Drug::Methadone])],
            ),
            Row::data(
                "1.4",
                "základní droga jiné opiáty (opium, morfium, fentanyl, tramadol etc.)",
                vec![drug(&[Drug::Vendal, Drug::RawOpium, Drug::Braun])],
            ),
            Row::data(
                "1.5",
                "základní droga pervitin",
                vec![drug(&[Drug::Methamphetamine])],
            ),
            Row::data(
                "1.6",
                "základní droga kokain/crack",
                vec![drug(&[Drug::Cocaine])],
            ),
            Row::data(
                "1.7",
                "základní droga kanabinoidy",
                vec![drug(&[Drug::Thc])],
            ),
            Row::data("1.8", "základní droga extáze", vec![drug(&[Drug::Ecstasy])]),
            Row::data(
                "1.9",
                "základní droga halucinogeny",
                vec![drug(&[Drug::Lsd, Drug::Psilocybe])],
            ),
            Row::data(
                "1.10",
                "základní droga těkavé látky",
                vec![drug(&[Drug::Inhalants])],
            ),
            Row::data(
                "1.11",
                "jiná základní droga, kromě alkoholu a tabáku",
                vec![drug(&[Drug::DesignerDrugs, Drug::Medicaments])],
            ),
            Row::data(
                "1.12",
                "celkem klientů - uživatelů drog ",
                vec![Cell::from(non_alcohol.len())],
            ),
            Row::data("1.12.1", "z toho mužů", vec![males(&non_alcohol)]),
            Row::data(
                "1.12.2",
                "z toho injekčních uživatelů drog",
                vec![Cell::from(injecting)],
            ),
            Row::data(
                "1.13",
                "průměrný věk klientů - uživatelů drog",
                vec![Cell::number(average_age(
                    non_alcohol.iter().copied(),
                    year,
                ))],
            ),
            Row::section("skupina 2", "Klienti se základní drogou alkohol"),
            Row::data(
                "2.1",
                "celkem klientů se základní drogou alkohol",
                vec![Cell::from(alcohol.len())],
            ),
            Row::data("2.1.1", "z toho mužů", vec![males(&alcohol)]),
            Row::data(
                "2.2",
                "průměrný věk klientů se základní drogou alkohol",
                vec![Cell::number(average_age(alcohol.iter().copied(), year))],
            ),
            Row::section("skupina 3", "Klienti se základní drogou tabák"),
            Row::data(
                "3.1",
                "celkem klientů se základní drogou tabák",
                vec![Cell::from(tobacco.len())],
            ),
            Row::data("3.1.1", "z toho mužů", vec![males(&tobacco)]),
            Row::data(
                "3.2",
                "průměrný věk klientů se základní drogou tabák",
                vec![Cell::number(average_age(tobacco.iter().copied(), year))],
            ),
            Row::section(
                "skupina 4",
                "Klienti s diagnózou z oblasti nelátkových závislostí",
            ),
            Row::data(
                "4.1",
                "počet klientů s diagnózou patologické hráčství",
                vec![drug(&[Drug::PathologicalGambling])],
            ),
            Row::data(
                "4.2",
                "počet klientů s jinou nelátkovou závislostí",
                vec![drug(&[Drug::OtherNonSubstanceAddiction])],
            ),
            Row::data(
                "4.3",
                "celkem klientů s diagnózou z oblasti nelátkových závislostí",
                vec![Cell::from(non_substance.len())],
            ),
            Row::data("4.3.1", "z toho mužů", vec![males(&non_substance)]),
            Row::data(
                "4.4",
                "průměrný věk klientů s diagnózou z oblasti nelátkových závislostí",
                vec![Cell::number(average_age(
                    non_substance.iter().copied(),
                    year,
                ))],
            ),
            Row::section("skupina 5", "Identifikovaní klienti programu celkem"),
            Row::data(
                "5.1",
                "Celkem  všech klientů, uživatelů",
                vec![Cell::from(users.len())],
            ),
            Row::data(
                "5.1.1",
                "z toho prvních kontaktů",
                vec![Cell::number(first_contacts)],
            ),
            Row::data(
                "5.2",
                "Celkem ostatních klientů (neuživatelé, rodinní příslušníci, \
                 blízcí osob se závislostním problémem)",
                vec![Cell::from(non_drug_users.len())],
            ),
            Row::data(
                "5.3",
                "Celkem všech klientů (uživatelů i neuživatelů)",
                vec![Cell::from(non_drug_users.len() + users.len())],
            ),
            Row::section("skupina 6", "Neidentifikovaní klienti"),
            Row::data(
                "6.1",
                "odhad počtu neidentifikovaných klientů se základní drogou opiáty",
                vec![Cell::Empty],
            ),
            Row::data(
                "6.2",
                "odhad počtu neidentifikovaných klientů s základní drogou pervitin",
                vec![Cell::Empty],
            ),
            Row::data(
                "6.3",
                "odhad počtu neidentifikovaných klientů - injekčních uživatelů drog",
                vec![Cell::Empty],
            ),
            Row::section("skupina 7", "Klienti ve zprostředkovaném kontaktu"),
            Row::data(
                "7.1",
                "Odhad počtu klientů ve zprostředkovaném kontaktu",
                vec![Cell::Empty],
            ),
        ])
    }

    fn services_rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError> {
        let services = matched_services(conn, &self.scope)?;
        let anonymous = anonymous_ids(conn)?;
        let encounters = matched_encounters(conn, &self.scope)?;

        let client_encounters: Vec<_> = encounters
            .iter()
            .filter(|e| !anonymous.contains(&e.person_id))
            .collect();
        let direct: Vec<_> = client_encounters
            .iter()
            .filter(|e| !e.is_by_phone)
            .collect();
        let phone: Vec<_> = client_encounters.iter().filter(|e| e.is_by_phone).collect();
        let direct_clients = direct
            .iter()
            .map(|e| e.person_id)
            .collect::<HashSet<Uuid>>()
            .len();
        let phone_clients = phone
            .iter()
            .map(|e| e.person_id)
            .collect::<HashSet<Uuid>>()
            .len();

        let svc = |kinds: &[ServiceKind]| Cell::number(service_count(&services, kinds));
        let cl = |kinds: &[ServiceKind]| Cell::number(client_count(&services, kinds, &anonymous));
        let anon = |kind: ServiceKind| anonymous_service_count(&services, kind, &anonymous);

        let (mut needles_in, mut needles_out) = (0i64, 0i64);
        for s in &services {
            if let ServiceDetail::HarmReduction {
                in_count,
                out_count,
                ..
            } = &s.detail
            {
                needles_in += i64::from(*in_count);
                needles_out += i64::from(*out_count);
            }
        }

        // Distinct by-phone encounters carrying counselling-type services;
        // the date/town filtering already happened on the service list.
        let phone_advice_kinds = [
            ServiceKind::SocialWork,
            ServiceKind::IndividualCounselling,
            ServiceKind::InformationService,
        ];
        let phone_advice = services
            .iter()
            .filter(|s| s.is_by_phone && phone_advice_kinds.contains(&s.kind()))
            .map(|s| s.encounter_id)
            .collect::<HashSet<Uuid>>()
            .len();

        let disease_tests = |disease: Disease| -> Vec<&MatchedService> {
            services
                .iter()
                .filter(|s| {
                    matches!(&s.detail, ServiceDetail::DiseaseTest { disease: Some(d), .. }
                        if *d == disease)
                })
                .collect()
        };
        let tested_clients = |disease: Disease| -> usize {
            let persons: HashSet<Uuid> = disease_tests(disease)
                .iter()
                .map(|s| s.person_id)
                .collect();
            persons.difference(&anonymous).count()
        };
        let disease_row = |label: &str, disease: Disease| {
            Row::values(
                label,
                vec![
                    Cell::from(tested_clients(disease)),
                    Cell::from(disease_tests(disease).len()),
                ],
            )
        };

        let urine_tests = |want_pregnancy: bool| -> Vec<&MatchedService> {
            services
                .iter()
                .filter(|s| {
                    matches!(&s.detail, ServiceDetail::UrineTest { pregnancy_test, drug_test }
                        if if want_pregnancy { *pregnancy_test } else { *drug_test })
                })
                .collect()
        };
        let urine_row = |label: &str, want_pregnancy: bool| {
            let tests = urine_tests(want_pregnancy);
            let persons: HashSet<Uuid> = tests.iter().map(|s| s.person_id).collect();
            Row::values(
                label,
                vec![
                    Cell::from(persons.difference(&anonymous).count()),
                    Cell::from(tests.len()),
                ],
            )
        };

        let blank = |label: &str| Row::values(label, vec![Cell::Empty, Cell::Empty]);

        Ok(vec![
            Row::values(
                "Celkový počet přímých kontaktů s klienty",
                vec![Cell::from(direct_clients), Cell::from(direct.len())],
            ),
            Row::values(
                "Celkový počet nepřímých kontaktů s identifikovanými klienty",
                vec![Cell::from(phone_clients), Cell::from(phone.len())],
            ),
            Row::values(
                "Úkony potřebné pro zajištění přímé práce s klientem",
                vec![Cell::not_tracked(), svc(&[ServiceKind::Address])],
            ),
            Row::values(
                "Kontaktní práce",
                vec![
                    Cell::number(
                        client_count(&services, &[ServiceKind::ContactWork], &anonymous)
                            + anon(ServiceKind::ContactWork),
                    ),
                    svc(&[ServiceKind::ContactWork]),
                ],
            ),
            Row::values(
                "Vstupní zhodnocení stavu klienta",
                vec![
                    cl(&[ServiceKind::IncomeFormFillup]),
                    svc(&[ServiceKind::IncomeFormFillup]),
                ],
            ),
            Row::values(
                "Individuální poradenství",
                vec![
                    cl(&[ServiceKind::IndividualCounselling]),
                    svc(&[ServiceKind::IndividualCounselling]),
                ],
            ),
            blank("Individuální psychoterapie"),
            Row::values(
                "Skupinové poradenství",
                vec![
                    cl(&[ServiceKind::GroupCounselling]),
                    svc(&[ServiceKind::GroupCounselling]),
                ],
            ),
            blank("Skupinová psychoterapie"),
            Row::values(
                "Krizová intervence",
                vec![
                    cl(&[ServiceKind::CrisisIntervention]),
                    svc(&[ServiceKind::CrisisIntervention]),
                ],
            ),
            blank("Rodinná terapie"),
            blank("Skupiny pro rodiče a osoby blízké klientovi"),
            Row::values(
                "Pracovní terapie",
                vec![
                    cl(&[ServiceKind::WorkTherapy, ServiceKind::WorkTherapyMeeting]),
                    svc(&[ServiceKind::WorkTherapy, ServiceKind::WorkTherapyMeeting]),
                ],
            ),
            Row::values(
                "Sociální práce (odkazy, asistence, soc.-právní pomoc, case management)",
                vec![
                    cl(&[
                        ServiceKind::SocialWork,
                        ServiceKind::AsistService,
                        ServiceKind::UtilityWork,
                    ]),
                    svc(&[
                        ServiceKind::SocialWork,
                        ServiceKind::AsistService,
                        ServiceKind::UtilityWork,
                    ]),
                ],
            ),
            Row::values(
                "Práce s rodinou",
                vec![
                    cl(&[ServiceKind::WorkWithFamily]),
                    svc(&[ServiceKind::WorkWithFamily]),
                ],
            ),
            blank("Socioterapie"),
            blank("Chráněná práce  / podporované zaměstnání"),
            blank("Psychiatrické vyšetření"),
            blank("Somatické vyšetření"),
            blank("Farmakoterapie"),
            blank("- z toho podání substituční látky"),
            blank("- z toho preskripce substituční látky"),
            Row::values(
                "Základní zdravotní ošetření (vč. první pomoci)",
                vec![
                    cl(&[ServiceKind::BasicMedicalTreatment]),
                    svc(&[ServiceKind::BasicMedicalTreatment]),
                ],
            ),
            Row::values(
                "Telefonické, písemné a internetové poradenství",
                vec![Cell::not_tracked(), Cell::from(phone_advice)],
            ),
            Row::values(
                "Korespondenční práce",
                vec![cl(&[ServiceKind::PostUsage]), svc(&[ServiceKind::PostUsage])],
            ),
            Row::values(
                "Informační servis",
                vec![
                    cl(&[ServiceKind::InformationService]),
                    Cell::number(
                        service_count(&services, &[ServiceKind::InformationService])
                            - anon(ServiceKind::InformationService),
                    ),
                ],
            ),
            blank("Edukativní program/beseda"),
            Row::values(
                "Distribuce harm reduction materiálu",
                vec![
                    cl(&[ServiceKind::HarmReduction]),
                    svc(&[ServiceKind::HarmReduction]),
                ],
            ),
            Row::values(
                "Počet vydaných injekčních jehel a stříkaček (ks)",
                vec![Cell::not_tracked(), Cell::number(needles_out)],
            ),
            Row::values(
                "Počet přijatých injekčních jehel a stříkaček (ks)",
                vec![Cell::not_tracked(), Cell::number(needles_in)],
            ),
            Row::values(
                "Počet nalezených injekčních jehel a stříkaček (ks)",
                vec![
                    Cell::not_tracked(),
                    Cell::number(syringes_collected(conn, &self.scope)?),
                ],
            ),
            Row::values(
                "Hygienický servis",
                vec![
                    cl(&[ServiceKind::HygienicService]),
                    svc(&[ServiceKind::HygienicService]),
                ],
            ),
            Row::values(
                "Potravinový servis",
                vec![
                    cl(&[ServiceKind::FoodService]),
                    svc(&[ServiceKind::FoodService]),
                ],
            ),
            Row::values(
                "Testování na inf. nemoci",
                vec![
                    cl(&[ServiceKind::DiseaseTest]),
                    svc(&[ServiceKind::DiseaseTest]),
                ],
            ),
            disease_row("– z toho na HIV", Disease::Hiv),
            disease_row("– z toho na HCV", Disease::Vhc),
            disease_row("– z toho na HBV", Disease::Vhb),
            disease_row("– z toho na syfilis", Disease::Syphilis),
            urine_row("Orientační test z moči na přítomnost drog", false),
            urine_row("Orientační test z moči - těhotenský test", true),
            blank("Vyšetření adiktologem při zahájení adiktologické péče (38021)"),
            blank("Vyšetření adiktologem kontrolní (39022)"),
            blank("Minimální kontakt adiktologa s pacientem (38023)"),
            blank("Adiktologická terapie individuální (38024)"),
            blank("Adiktologická terapie rodinná (38025)"),
            blank("Adiktologická terapie skupinová, typ I. pro skupinu max. 9 osob (38026)"),
            Row::values(
                "Celkový čas všech poskytnutných výkonů",
                vec![Cell::from(direct_clients + phone_clients), Cell::Empty],
            ),
        ])
    }
}

impl Report for CouncilReport {
    fn title(&self) -> String {
        "RVKPP".into()
    }

    fn description(&self) -> String {
        "Tiskový výstup pro Radu vlády pro koordinaci protidrogové politiky.".into()
    }

    fn filename(&self) -> String {
        match self.kind {
            CouncilKind::Clients => "RVKPP_klienti.xls".into(),
            CouncilKind::Services => "RVKPP_vykony.xls".into(),
        }
    }

    fn rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError> {
        match self.kind {
            CouncilKind::Clients => self.clients_rows(conn),
            CouncilKind::Services => self.services_rows(conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::reporting::testutil::{
        date, harm_reduction, scope, seed_anonymous, seed_client, seed_encounter, seed_service,
        seed_town,
    };

    fn cell_at(rows: &[Row], code: &str) -> Cell {
        rows.iter()
            .find(|r| r.code.as_deref() == Some(code))
            .unwrap_or_else(|| panic!("no row with code {code}"))
            .cells[0]
            .clone()
    }

    fn cells_labeled(rows: &[Row], label: &str) -> Vec<Cell> {
        rows.iter()
            .find(|r| r.label == label)
            .unwrap_or_else(|| panic!("no row labeled {label}"))
            .cells
            .clone()
    }

    #[test]
    fn clients_sheet_counts_by_drug_group() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");

        for (code, drug) in [
            ("H1", Drug::Heroin),
            ("H2", Drug::Heroin),
            ("H3", Drug::Heroin),
        ] {
            let id = seed_client(&conn, code, Some(drug), Some(1985), town);
            seed_encounter(&conn, id, town, date(2013, 2, 10), false);
        }
        for code in ["A1", "A2"] {
            let id = seed_client(&conn, code, Some(Drug::Alcohol), Some(1970), town);
            seed_encounter(&conn, id, town, date(2013, 2, 12), false);
        }
        // Anonymous contact with the same drug, excluded from client counts.
        let anon = seed_anonymous(&conn, Some(Drug::Heroin), town);
        seed_encounter(&conn, anon, town, date(2013, 2, 14), false);

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Clients,
            2013,
        );
        let rows = report.rows(&conn).unwrap();

        assert_eq!(cell_at(&rows, "1.1"), Cell::number(3));
        assert_eq!(cell_at(&rows, "1.12"), Cell::number(3));
        assert_eq!(cell_at(&rows, "1.12.1"), Cell::number(3));
        assert_eq!(cell_at(&rows, "1.13"), Cell::number(28));
        assert_eq!(cell_at(&rows, "2.1"), Cell::number(2));
        assert_eq!(cell_at(&rows, "2.2"), Cell::number(43));
        assert_eq!(cell_at(&rows, "5.1"), Cell::number(5));
        assert_eq!(cell_at(&rows, "5.3"), Cell::number(5));
    }

    #[test]
    fn empty_drug_group_averages_to_zero() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");
        let id = seed_client(&conn, "H1", Some(Drug::Heroin), Some(1985), town);
        seed_encounter(&conn, id, town, date(2013, 2, 10), false);

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Clients,
            2013,
        );
        let rows = report.rows(&conn).unwrap();

        // No non-substance clients at all.
        assert_eq!(cell_at(&rows, "4.3"), Cell::number(0));
        assert_eq!(cell_at(&rows, "4.4"), Cell::number(0));
    }

    #[test]
    fn encounters_outside_the_scope_are_ignored() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");
        let id = seed_client(&conn, "H1", Some(Drug::Heroin), Some(1985), town);
        seed_encounter(&conn, id, town, date(2013, 5, 1), false);

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Clients,
            2013,
        );
        let rows = report.rows(&conn).unwrap();
        assert_eq!(cell_at(&rows, "1.1"), Cell::number(0));
        assert_eq!(cell_at(&rows, "5.1"), Cell::number(0));
    }

    #[test]
    fn services_sheet_counts_contact_work_with_anonymous() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");

        let client = seed_client(&conn, "K1", Some(Drug::Heroin), Some(1985), town);
        let e1 = seed_encounter(&conn, client, town, date(2013, 2, 10), false);
        seed_service(&conn, e1, ServiceDetail::ContactWork);

        let anon = seed_anonymous(&conn, None, town);
        let e2 = seed_encounter(&conn, anon, town, date(2013, 2, 11), false);
        seed_service(&conn, e2, ServiceDetail::ContactWork);

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Services,
            2013,
        );
        let rows = report.rows(&conn).unwrap();

        // Contact work counts anonymous services into the client column.
        assert_eq!(
            cells_labeled(&rows, "Kontaktní práce"),
            vec![Cell::number(2), Cell::number(2)]
        );
        // Direct-contact totals exclude the anonymous encounter.
        assert_eq!(
            cells_labeled(&rows, "Celkový počet přímých kontaktů s klienty"),
            vec![Cell::number(1), Cell::number(1)]
        );
    }

    #[test]
    fn services_sheet_sums_needles_from_exchange_details() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");
        let client = seed_client(&conn, "K1", Some(Drug::Heroin), Some(1985), town);
        let e1 = seed_encounter(&conn, client, town, date(2013, 2, 10), false);
        seed_service(&conn, e1, harm_reduction(10, 12));
        let e2 = seed_encounter(&conn, client, town, date(2013, 2, 20), false);
        seed_service(&conn, e2, harm_reduction(5, 0));

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Services,
            2013,
        );
        let rows = report.rows(&conn).unwrap();

        assert_eq!(
            cells_labeled(&rows, "Počet vydaných injekčních jehel a stříkaček (ks)"),
            vec![Cell::not_tracked(), Cell::number(12)]
        );
        assert_eq!(
            cells_labeled(&rows, "Počet přijatých injekčních jehel a stříkaček (ks)"),
            vec![Cell::not_tracked(), Cell::number(15)]
        );
        assert_eq!(
            cells_labeled(&rows, "Distribuce harm reduction materiálu"),
            vec![Cell::number(1), Cell::number(2)]
        );
    }

    #[test]
    fn phone_advice_counts_distinct_encounters() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");
        let client = seed_client(&conn, "K1", Some(Drug::Heroin), Some(1985), town);

        // One phone encounter with two qualifying services counts once.
        let e1 = seed_encounter(&conn, client, town, date(2013, 2, 10), true);
        seed_service(&conn, e1, ServiceDetail::IndividualCounselling);
        seed_service(
            &conn,
            e1,
            ServiceDetail::InformationService {
                safe_usage: true,
                safe_sex: false,
                medical: false,
                socio_legal: false,
                cure_possibilities: false,
                literature: false,
                other: false,
            },
        );
        // Direct encounter does not qualify.
        let e2 = seed_encounter(&conn, client, town, date(2013, 2, 11), false);
        seed_service(&conn, e2, ServiceDetail::IndividualCounselling);

        let report = CouncilReport::with_reference_year(
            scope(date(2013, 1, 1), date(2013, 3, 31)),
            CouncilKind::Services,
            2013,
        );
        let rows = report.rows(&conn).unwrap();
        assert_eq!(
            cells_labeled(&rows, "Telefonické, písemné a internetové poradenství"),
            vec![Cell::not_tracked(), Cell::number(1)]
        );
    }

    #[test]
    fn town_filter_excludes_other_towns_from_both_sheets() {
        let conn = open_memory_database().unwrap();
        let beroun = seed_town(&conn, "Beroun");
        let kladno = seed_town(&conn, "Kladno");

        for (code, town) in [("B1", beroun), ("K1", kladno)] {
            let id = seed_client(&conn, code, Some(Drug::Heroin), Some(1985), town);
            let e = seed_encounter(&conn, id, town, date(2013, 2, 10), false);
            seed_service(&conn, e, ServiceDetail::ContactWork);
        }

        let scoped = ReportScope::new(date(2013, 1, 1), date(2013, 3, 31), vec![beroun]);

        let clients =
            CouncilReport::with_reference_year(scoped.clone(), CouncilKind::Clients, 2013);
        let rows = clients.rows(&conn).unwrap();
        assert_eq!(cell_at(&rows, "1.1"), Cell::number(1));
        assert_eq!(cell_at(&rows, "5.1"), Cell::number(1));

        let services = CouncilReport::with_reference_year(scoped, CouncilKind::Services, 2013);
        let rows = services.rows(&conn).unwrap();
        assert_eq!(
            cells_labeled(&rows, "Kontaktní práce"),
            vec![Cell::number(1), Cell::number(1)]
        );
    }

    #[test]
    fn report_is_deterministic() {
        let conn = open_memory_database().unwrap();
        let town = seed_town(&conn, "Beroun");
        for (code, drug) in [("H1", Drug::Heroin), ("A1", Drug::Alcohol)] {
            let id = seed_client(&conn, code, Some(drug), Some(1985), town);
            let e = seed_encounter(&conn, id, town, date(2013, 2, 10), false);
            seed_service(&conn, e, ServiceDetail::ContactWork);
        }

        let s = scope(date(2013, 1, 1), date(2013, 3, 31));
        for kind in [CouncilKind::Clients, CouncilKind::Services] {
            let report = CouncilReport::with_reference_year(s.clone(), kind, 2013);
            assert_eq!(report.rows(&conn).unwrap(), report.rows(&conn).unwrap());
        }
    }

    #[test]
    fn export_filenames_are_fixed() {
        let s = scope(date(2013, 1, 1), date(2013, 3, 31));
        let clients = CouncilReport::with_reference_year(s.clone(), CouncilKind::Clients, 2013);
        let services = CouncilReport::with_reference_year(s, CouncilKind::Services, 2013);
        assert_eq!(clients.filename(), "RVKPP_klienti.xls");
        assert_eq!(services.filename(), "RVKPP_vykony.xls");
    }
}
