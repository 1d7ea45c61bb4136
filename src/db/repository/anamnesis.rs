use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{Periodicity, RiskyBehavior};
use crate::models::{Anamnesis, RiskyManners};

pub fn insert_anamnesis(conn: &Connection, anamnesis: &Anamnesis) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO anamneses (id, client_id, filled_on) VALUES (?1, ?2, ?3)",
        params![
            anamnesis.id.to_string(),
            anamnesis.client_id.to_string(),
            anamnesis.filled_on.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

pub fn insert_risky_manners(conn: &Connection, manners: &RiskyManners) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO risky_manners (id, anamnesis_id, behavior, periodicity_in_present,
         periodicity_in_past)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            manners.id.to_string(),
            manners.anamnesis_id.to_string(),
            manners.behavior.as_str(),
            manners.periodicity_in_present.map(|p| p.as_str()),
            manners.periodicity_in_past.map(|p| p.as_str()),
        ],
    )?;
    Ok(())
}

pub fn get_anamnesis_for_client(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Option<Anamnesis>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, client_id, filled_on FROM anamneses WHERE client_id = ?1")?;

    let mut rows = stmt.query_map(params![client_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    match rows.next() {
        Some(row) => {
            let (id, client_id, filled_on) = row?;
            Ok(Some(Anamnesis {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                client_id: Uuid::parse_str(&client_id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                filled_on: filled_on.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            }))
        }
        None => Ok(None),
    }
}

/// The risky-manners record of one behavior, if the questionnaire covers it.
/// A missing record degrades to an "unknown" classification upstream, never
/// to an error.
pub fn get_risky_manners(
    conn: &Connection,
    anamnesis_id: &Uuid,
    behavior: RiskyBehavior,
) -> Result<Option<RiskyManners>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, anamnesis_id, behavior, periodicity_in_present, periodicity_in_past
         FROM risky_manners WHERE anamnesis_id = ?1 AND behavior = ?2",
    )?;

    let mut rows = stmt.query_map(
        params![anamnesis_id.to_string(), behavior.as_str()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        },
    )?;

    match rows.next() {
        Some(row) => {
            let (id, anamnesis_id, behavior, present, past) = row?;
            Ok(Some(RiskyManners {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                anamnesis_id: Uuid::parse_str(&anamnesis_id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                behavior: RiskyBehavior::from_str(&behavior)?,
                periodicity_in_present: present
                    .as_deref()
                    .map(Periodicity::from_str)
                    .transpose()?,
                periodicity_in_past: past.as_deref().map(Periodicity::from_str).transpose()?,
            }))
        }
        None => Ok(None),
    }
}
