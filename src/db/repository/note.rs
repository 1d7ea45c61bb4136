use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ClientNote;

/// Validates and stores a note. Validation messages are the user-facing
/// Czech strings shown by the case-management frontend; nothing is persisted
/// on failure.
pub fn insert_note(conn: &Connection, note: &ClientNote) -> Result<(), DatabaseError> {
    if note.text.trim().is_empty() {
        return Err(DatabaseError::Validation(
            "Zadejte prosím neprázdný text.".into(),
        ));
    }

    let client_exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM persons WHERE id = ?1 AND kind = 'client')",
        params![note.client_id.to_string()],
        |row| row.get(0),
    )?;
    if !client_exists {
        return Err(DatabaseError::Validation(
            "Zadaný klient neexistuje. (Nebyl mezitím smazán?)".into(),
        ));
    }

    conn.execute(
        "INSERT INTO client_notes (id, client_id, author, written_at, text)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            note.id.to_string(),
            note.client_id.to_string(),
            note.author,
            note.written_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            note.text,
        ],
    )?;
    Ok(())
}

pub fn delete_note(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM client_notes WHERE id = ?1",
        params![id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "client_note".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_notes_for_client(
    conn: &Connection,
    client_id: &Uuid,
) -> Result<Vec<ClientNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, author, written_at, text
         FROM client_notes WHERE client_id = ?1 ORDER BY written_at DESC",
    )?;

    let rows = stmt.query_map(params![client_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let (id, client_id, author, written_at, text) = row?;
        notes.push(ClientNote {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            client_id: Uuid::parse_str(&client_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            author,
            written_at: NaiveDateTime::parse_from_str(&written_at, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            text,
        });
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_person, insert_town, open_memory_database};
    use crate::models::enums::{PersonKind, Sex};
    use crate::models::{Person, Town};

    fn seed_client(conn: &Connection) -> Uuid {
        let town = Town {
            id: Uuid::new_v4(),
            title: "Kladno".into(),
        };
        insert_town(conn, &town).unwrap();
        let person = Person {
            id: Uuid::new_v4(),
            code: "K010".into(),
            kind: PersonKind::Client,
            sex: Sex::Female,
            birthdate: None,
            primary_drug: None,
            primary_drug_usage: None,
            close_person: false,
            sex_partner: false,
            town_id: Some(town.id),
        };
        insert_person(conn, &person).unwrap();
        person.id
    }

    fn note(client_id: Uuid, text: &str) -> ClientNote {
        ClientNote {
            id: Uuid::new_v4(),
            client_id,
            author: "ondra".into(),
            written_at: "2013-02-01T10:30:00".parse().unwrap(),
            text: text.into(),
        }
    }

    #[test]
    fn note_round_trip() {
        let conn = open_memory_database().unwrap();
        let client_id = seed_client(&conn);

        insert_note(&conn, &note(client_id, "probrána možnost léčby")).unwrap();
        let notes = get_notes_for_client(&conn, &client_id).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "probrána možnost léčby");
    }

    #[test]
    fn empty_text_rejected_and_not_persisted() {
        let conn = open_memory_database().unwrap();
        let client_id = seed_client(&conn);

        let err = insert_note(&conn, &note(client_id, "   ")).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(get_notes_for_client(&conn, &client_id).unwrap().is_empty());
    }

    #[test]
    fn missing_client_rejected() {
        let conn = open_memory_database().unwrap();
        seed_client(&conn);

        let err = insert_note(&conn, &note(Uuid::new_v4(), "text")).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn deleting_missing_note_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_note(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_note() {
        let conn = open_memory_database().unwrap();
        let client_id = seed_client(&conn);
        let n = note(client_id, "kontakt po delší době");
        insert_note(&conn, &n).unwrap();

        delete_note(&conn, &n.id).unwrap();
        assert!(get_notes_for_client(&conn, &client_id).unwrap().is_empty());
    }
}
