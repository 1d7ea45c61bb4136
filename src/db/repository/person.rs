use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{Drug, DrugApplication, PersonKind, Sex};
use crate::models::Person;

pub fn insert_person(conn: &Connection, person: &Person) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO persons (id, code, kind, sex, birthdate, primary_drug,
         primary_drug_usage, close_person, sex_partner, town_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            person.id.to_string(),
            person.code,
            person.kind.as_str(),
            person.sex.as_str(),
            person.birthdate.map(|d| d.to_string()),
            person.primary_drug.map(|d| d.as_str()),
            person.primary_drug_usage.map(|u| u.as_str()),
            person.close_person,
            person.sex_partner,
            person.town_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_person(conn: &Connection, id: &Uuid) -> Result<Option<Person>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, code, kind, sex, birthdate, primary_drug, primary_drug_usage,
         close_person, sex_partner, town_id
         FROM persons WHERE id = ?1",
    )?;

    let mut rows = stmt.query_map(params![id.to_string()], person_row_from_rusqlite)?;
    match rows.next() {
        Some(row) => Ok(Some(person_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Ids of all anonymous contacts. Used as the exclusion set for every
/// per-client metric.
pub fn anonymous_ids(conn: &Connection) -> Result<HashSet<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM persons WHERE kind = 'anonymous'")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut ids = HashSet::new();
    for row in rows {
        let id = row?;
        ids.insert(
            Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        );
    }
    Ok(ids)
}

/// Load all clients (never anonymous contacts) whose id is in the given set.
pub fn get_clients_by_ids(
    conn: &Connection,
    ids: &HashSet<Uuid>,
) -> Result<Vec<Person>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, code, kind, sex, birthdate, primary_drug, primary_drug_usage,
         close_person, sex_partner, town_id
         FROM persons WHERE kind = 'client'",
    )?;

    let rows = stmt.query_map([], person_row_from_rusqlite)?;

    let mut clients = Vec::new();
    for row in rows {
        let person = person_from_row(row?)?;
        if ids.contains(&person.id) {
            clients.push(person);
        }
    }
    Ok(clients)
}

// Internal row type for Person mapping
pub(crate) struct PersonRow {
    id: String,
    code: String,
    kind: String,
    sex: String,
    birthdate: Option<String>,
    primary_drug: Option<String>,
    primary_drug_usage: Option<String>,
    close_person: bool,
    sex_partner: bool,
    town_id: Option<String>,
}

pub(crate) fn person_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<PersonRow, rusqlite::Error> {
    Ok(PersonRow {
        id: row.get(0)?,
        code: row.get(1)?,
        kind: row.get(2)?,
        sex: row.get(3)?,
        birthdate: row.get(4)?,
        primary_drug: row.get(5)?,
        primary_drug_usage: row.get(6)?,
        close_person: row.get(7)?,
        sex_partner: row.get(8)?,
        town_id: row.get(9)?,
    })
}

pub(crate) fn person_from_row(row: PersonRow) -> Result<Person, DatabaseError> {
    Ok(Person {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        code: row.code,
        kind: PersonKind::from_str(&row.kind)?,
        sex: Sex::from_str(&row.sex)?,
        birthdate: row
            .birthdate
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        primary_drug: row
            .primary_drug
            .as_deref()
            .map(Drug::from_str)
            .transpose()?,
        primary_drug_usage: row
            .primary_drug_usage
            .as_deref()
            .map(DrugApplication::from_str)
            .transpose()?,
        close_person: row.close_person,
        sex_partner: row.sex_partner,
        town_id: row.town_id.and_then(|s| Uuid::parse_str(&s).ok()),
    })
}
