use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Town;

pub fn insert_town(conn: &Connection, town: &Town) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO towns (id, title) VALUES (?1, ?2)",
        params![town.id.to_string(), town.title],
    )?;
    Ok(())
}

pub fn get_all_towns(conn: &Connection) -> Result<Vec<Town>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, title FROM towns ORDER BY title")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut towns = Vec::new();
    for row in rows {
        let (id, title) = row?;
        towns.push(Town {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            title,
        });
    }
    Ok(towns)
}
