//! Scope-filtered read-only accessors over the case records, plus the
//! aggregation primitives the report rule tables are built from.
//!
//! Services and encounters are fetched by date range in SQL and
//! town-filtered in memory; the datasets are municipal-sized.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{self, parse_detail};
use crate::db::DatabaseError;
use crate::models::enums::ServiceKind;
use crate::models::{Encounter, Person, ReportScope, ServiceDetail};

/// One service joined with the encounter it was performed during.
#[derive(Debug, Clone)]
pub struct MatchedService {
    pub service_id: Uuid,
    pub encounter_id: Uuid,
    pub person_id: Uuid,
    pub town_id: Uuid,
    pub performed_on: NaiveDate,
    pub is_by_phone: bool,
    pub detail: ServiceDetail,
}

impl MatchedService {
    pub fn kind(&self) -> ServiceKind {
        self.detail.kind()
    }
}

/// All services performed within the scope, joined with their encounters.
pub fn matched_services(
    conn: &Connection,
    scope: &ReportScope,
) -> Result<Vec<MatchedService>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.encounter_id, s.detail, e.person_id, e.town_id,
                e.performed_on, e.is_by_phone
         FROM services s
         JOIN encounters e ON s.encounter_id = e.id
         WHERE e.performed_on >= ?1 AND e.performed_on <= ?2",
    )?;

    let rows = stmt.query_map(
        params![scope.date_from.to_string(), scope.date_to.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
            ))
        },
    )?;

    let mut services = Vec::new();
    for row in rows {
        let (id, encounter_id, detail, person_id, town_id, performed_on, is_by_phone) = row?;
        services.push(MatchedService {
            service_id: parse_uuid(&id)?,
            encounter_id: parse_uuid(&encounter_id)?,
            person_id: parse_uuid(&person_id)?,
            town_id: parse_uuid(&town_id)?,
            performed_on: NaiveDate::parse_from_str(&performed_on, "%Y-%m-%d")
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            is_by_phone,
            detail: parse_detail(&detail)?,
        });
    }

    services.retain(|s| scope.contains_town(s.town_id));
    Ok(services)
}

/// All encounters within the scope.
pub fn matched_encounters(
    conn: &Connection,
    scope: &ReportScope,
) -> Result<Vec<Encounter>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, person_id, town_id, performed_on, is_by_phone, performed_by
         FROM encounters WHERE performed_on >= ?1 AND performed_on <= ?2",
    )?;

    let rows = stmt.query_map(
        params![scope.date_from.to_string(), scope.date_to.to_string()],
        repository::encounter_row_from_rusqlite,
    )?;

    let mut encounters = Vec::new();
    for row in rows {
        encounters.push(repository::encounter_from_row(row?)?);
    }

    encounters.retain(|e| scope.contains_town(e.town_id));
    Ok(encounters)
}

/// Total syringes found in collections within the scope.
pub fn syringes_collected(conn: &Connection, scope: &ReportScope) -> Result<i64, DatabaseError> {
    let counts = repository::get_syringe_counts_between(conn, &scope.date_from, &scope.date_to)?;
    Ok(counts
        .iter()
        .filter(|(town_id, _)| scope.contains_town(*town_id))
        .map(|(_, count)| *count as i64)
        .sum())
}

/// All non-anonymous drug users encountered within the scope (clients with
/// a primary drug on file).
pub fn drug_users(conn: &Connection, scope: &ReportScope) -> Result<Vec<Person>, DatabaseError> {
    let mut clients = encountered_clients(conn, scope)?;
    clients.retain(Person::is_drug_user);
    Ok(clients)
}

/// Sex partners and close persons encountered within the scope.
pub fn non_drug_user_clients(
    conn: &Connection,
    scope: &ReportScope,
) -> Result<Vec<Person>, DatabaseError> {
    let mut clients = encountered_clients(conn, scope)?;
    clients.retain(|c| c.close_person || c.sex_partner);
    Ok(clients)
}

fn encountered_clients(
    conn: &Connection,
    scope: &ReportScope,
) -> Result<Vec<Person>, DatabaseError> {
    let encounters = matched_encounters(conn, scope)?;
    let ids: HashSet<Uuid> = encounters.iter().map(|e| e.person_id).collect();
    repository::get_clients_by_ids(conn, &ids)
}

/// First encounter date per person within one calendar year and town set.
pub fn first_encounters_in_year(
    conn: &Connection,
    year: i32,
    towns: &[Uuid],
) -> Result<HashMap<Uuid, NaiveDate>, DatabaseError> {
    let mut encounters = repository::get_encounters_in_year(conn, year)?;
    encounters.retain(|e| towns.is_empty() || towns.contains(&e.town_id));

    let mut first: HashMap<Uuid, NaiveDate> = HashMap::new();
    for e in encounters {
        first
            .entry(e.person_id)
            .and_modify(|d| *d = (*d).min(e.performed_on))
            .or_insert(e.performed_on);
    }
    Ok(first)
}

// Aggregation primitives shared by the report rule tables.

/// Number of performed services of the given kinds.
pub fn service_count(services: &[MatchedService], kinds: &[ServiceKind]) -> i64 {
    services.iter().filter(|s| kinds.contains(&s.kind())).count() as i64
}

/// Number of distinct clients who received a service of the given kinds.
/// Person ids are deduplicated across kinds first, then the anonymous set is
/// subtracted.
pub fn client_count(
    services: &[MatchedService],
    kinds: &[ServiceKind],
    anonymous: &HashSet<Uuid>,
) -> i64 {
    let persons: HashSet<Uuid> = services
        .iter()
        .filter(|s| kinds.contains(&s.kind()))
        .map(|s| s.person_id)
        .collect();
    persons.difference(anonymous).count() as i64
}

/// Number of services of the given kind performed for anonymous contacts.
pub fn anonymous_service_count(
    services: &[MatchedService],
    kind: ServiceKind,
    anonymous: &HashSet<Uuid>,
) -> i64 {
    services
        .iter()
        .filter(|s| s.kind() == kind && anonymous.contains(&s.person_id))
        .count() as i64
}

/// Average age of a client group relative to `this_year`, rounded to the
/// nearest year. Clients without a birthdate are skipped; an empty group
/// yields 0 (explicitly not an error).
pub fn average_age<'a>(clients: impl IntoIterator<Item = &'a Person>, this_year: i32) -> i64 {
    let ages: Vec<i64> = clients
        .into_iter()
        .filter_map(|c| c.birthdate)
        .map(|birthdate| i64::from(this_year) - i64::from(chrono::Datelike::year(&birthdate)))
        .collect();
    if ages.is_empty() {
        return 0;
    }
    let sum: i64 = ages.iter().sum();
    (sum as f64 / ages.len() as f64).round() as i64
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_syringe_collection, SyringeCollection};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{PersonKind, Sex};
    use crate::models::ServiceDetail;
    use crate::reporting::testutil::{date, seed_client, seed_encounter, seed_service, seed_town};

    fn person(birth_year: Option<i32>) -> Person {
        Person {
            id: Uuid::new_v4(),
            code: "K".into(),
            kind: PersonKind::Client,
            sex: Sex::Male,
            birthdate: birth_year.map(|y| NaiveDate::from_ymd_opt(y, 6, 15).unwrap()),
            primary_drug: None,
            primary_drug_usage: None,
            close_person: false,
            sex_partner: false,
            town_id: None,
        }
    }

    #[test]
    fn average_age_of_empty_group_is_zero() {
        let clients: Vec<Person> = Vec::new();
        assert_eq!(average_age(&clients, 2013), 0);
    }

    #[test]
    fn average_age_skips_unknown_birthdates() {
        let clients = [person(Some(1980)), person(Some(1990)), person(None)];
        // (33 + 23) / 2 = 28
        assert_eq!(average_age(clients.iter(), 2013), 28);
    }

    #[test]
    fn average_age_rounds_to_nearest() {
        let clients = [person(Some(1980)), person(Some(1985)), person(Some(1989))];
        // (33 + 28 + 24) / 3 = 28.33 -> 28
        assert_eq!(average_age(clients.iter(), 2013), 28);
    }

    // Seeds one client, encounter, contact-work service and syringe
    // collection in each of two towns.
    fn seed_two_towns(conn: &Connection) -> (Uuid, Uuid) {
        let beroun = seed_town(conn, "Beroun");
        let kladno = seed_town(conn, "Kladno");

        for (code, town, syringes) in [("B1", beroun, 3), ("K1", kladno, 7)] {
            let client = seed_client(conn, code, None, Some(1985), town);
            let e = seed_encounter(conn, client, town, date(2013, 2, 10), false);
            seed_service(conn, e, ServiceDetail::ContactWork);
            insert_syringe_collection(
                conn,
                &SyringeCollection {
                    id: Uuid::new_v4(),
                    town_id: town,
                    date: date(2013, 2, 11),
                    count: syringes,
                },
            )
            .unwrap();
        }
        (beroun, kladno)
    }

    #[test]
    fn town_filter_restricts_every_accessor() {
        let conn = open_memory_database().unwrap();
        let (beroun, _) = seed_two_towns(&conn);

        let all = ReportScope::new(date(2013, 1, 1), date(2013, 3, 31), vec![]);
        let scoped = ReportScope::new(date(2013, 1, 1), date(2013, 3, 31), vec![beroun]);

        assert_eq!(matched_services(&conn, &all).unwrap().len(), 2);
        assert_eq!(matched_encounters(&conn, &all).unwrap().len(), 2);
        assert_eq!(syringes_collected(&conn, &all).unwrap(), 10);
        assert_eq!(first_encounters_in_year(&conn, 2013, &all.towns).unwrap().len(), 2);

        let services = matched_services(&conn, &scoped).unwrap();
        assert_eq!(services.len(), 1);
        assert!(services.iter().all(|s| s.town_id == beroun));

        let encounters = matched_encounters(&conn, &scoped).unwrap();
        assert_eq!(encounters.len(), 1);
        assert_eq!(encounters[0].town_id, beroun);

        assert_eq!(syringes_collected(&conn, &scoped).unwrap(), 3);

        let first = first_encounters_in_year(&conn, 2013, &scoped.towns).unwrap();
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn town_filter_restricts_encountered_clients() {
        let conn = open_memory_database().unwrap();
        let (beroun, _) = seed_two_towns(&conn);

        let scoped = ReportScope::new(date(2013, 1, 1), date(2013, 3, 31), vec![beroun]);
        let clients = encountered_clients(&conn, &scoped).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].code, "B1");
    }
}
