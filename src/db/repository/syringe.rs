use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Syringes found and collected in a town on a date; independent of any
/// encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyringeCollection {
    pub id: Uuid,
    pub town_id: Uuid,
    pub date: NaiveDate,
    pub count: u32,
}

pub fn insert_syringe_collection(
    conn: &Connection,
    collection: &SyringeCollection,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO syringe_collections (id, town_id, date, count) VALUES (?1, ?2, ?3, ?4)",
        params![
            collection.id.to_string(),
            collection.town_id.to_string(),
            collection.date.to_string(),
            collection.count,
        ],
    )?;
    Ok(())
}

/// (town_id, count) pairs within the date range; town filtering is the
/// caller's concern.
pub fn get_syringe_counts_between(
    conn: &Connection,
    from: &NaiveDate,
    to: &NaiveDate,
) -> Result<Vec<(Uuid, u32)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT town_id, count FROM syringe_collections WHERE date >= ?1 AND date <= ?2",
    )?;

    let rows = stmt.query_map(params![from.to_string(), to.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (town_id, count) = row?;
        counts.push((
            Uuid::parse_str(&town_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            count,
        ));
    }
    Ok(counts)
}
