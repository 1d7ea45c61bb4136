use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Encounter;

pub fn insert_encounter(conn: &Connection, encounter: &Encounter) -> Result<(), DatabaseError> {
    let performed_by = serde_json::to_string(&encounter.performed_by)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    conn.execute(
        "INSERT INTO encounters (id, person_id, town_id, performed_on, is_by_phone, performed_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            encounter.id.to_string(),
            encounter.person_id.to_string(),
            encounter.town_id.to_string(),
            encounter.performed_on.to_string(),
            encounter.is_by_phone,
            performed_by,
        ],
    )?;
    Ok(())
}

/// All encounters of a calendar year, oldest first. The hygiene report
/// derives per-client first encounters from this.
pub fn get_encounters_in_year(
    conn: &Connection,
    year: i32,
) -> Result<Vec<Encounter>, DatabaseError> {
    let from = format!("{year}-01-01");
    let to = format!("{year}-12-31");
    let mut stmt = conn.prepare(
        "SELECT id, person_id, town_id, performed_on, is_by_phone, performed_by
         FROM encounters WHERE performed_on >= ?1 AND performed_on <= ?2
         ORDER BY performed_on",
    )?;

    let rows = stmt.query_map(params![from, to], encounter_row_from_rusqlite)?;

    let mut encounters = Vec::new();
    for row in rows {
        encounters.push(encounter_from_row(row?)?);
    }
    Ok(encounters)
}

// Internal row type for Encounter mapping
pub(crate) struct EncounterRow {
    id: String,
    person_id: String,
    town_id: String,
    performed_on: String,
    is_by_phone: bool,
    performed_by: String,
}

pub(crate) fn encounter_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<EncounterRow, rusqlite::Error> {
    Ok(EncounterRow {
        id: row.get(0)?,
        person_id: row.get(1)?,
        town_id: row.get(2)?,
        performed_on: row.get(3)?,
        is_by_phone: row.get(4)?,
        performed_by: row.get(5)?,
    })
}

pub(crate) fn encounter_from_row(row: EncounterRow) -> Result<Encounter, DatabaseError> {
    Ok(Encounter {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        person_id: Uuid::parse_str(&row.person_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        town_id: Uuid::parse_str(&row.town_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        performed_on: NaiveDate::parse_from_str(&row.performed_on, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        is_by_phone: row.is_by_phone,
        performed_by: serde_json::from_str(&row.performed_by)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    })
}
