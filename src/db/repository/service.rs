use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Service, ServiceDetail};

/// Validates the detail, then stores it as tagged JSON with the kind tag
/// duplicated into its own column. Nothing is persisted when validation
/// fails.
pub fn insert_service(conn: &Connection, service: &Service) -> Result<(), DatabaseError> {
    service.detail.validate()?;

    let detail = serde_json::to_string(&service.detail)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    conn.execute(
        "INSERT INTO services (id, encounter_id, kind, detail) VALUES (?1, ?2, ?3, ?4)",
        params![
            service.id.to_string(),
            service.encounter_id.to_string(),
            service.kind().as_str(),
            detail,
        ],
    )?;
    Ok(())
}

pub fn get_services_for_encounter(
    conn: &Connection,
    encounter_id: &Uuid,
) -> Result<Vec<Service>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, encounter_id, detail FROM services WHERE encounter_id = ?1",
    )?;

    let rows = stmt.query_map(params![encounter_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut services = Vec::new();
    for row in rows {
        let (id, encounter_id, detail) = row?;
        services.push(Service {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            encounter_id: Uuid::parse_str(&encounter_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            detail: parse_detail(&detail)?,
        });
    }
    Ok(services)
}

pub(crate) fn parse_detail(json: &str) -> Result<ServiceDetail, DatabaseError> {
    serde_json::from_str(json).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
