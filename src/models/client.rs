use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Drug, DrugApplication, PersonKind, Sex};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Town {
    pub id: Uuid,
    pub title: String,
}

/// A person in contact with the programme. Clients carry identity and drug
/// history; anonymous contacts carry only a code and rough demographics and
/// never count toward per-client metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub code: String,
    pub kind: PersonKind,
    pub sex: Sex,
    pub birthdate: Option<NaiveDate>,
    pub primary_drug: Option<Drug>,
    pub primary_drug_usage: Option<DrugApplication>,
    pub close_person: bool,
    pub sex_partner: bool,
    pub town_id: Option<Uuid>,
}

impl Person {
    pub fn is_anonymous(&self) -> bool {
        self.kind == PersonKind::Anonymous
    }

    /// Registered as a drug user (has a primary drug on file).
    pub fn is_drug_user(&self) -> bool {
        self.primary_drug.is_some()
    }
}

/// Free-text note attached to a client by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNote {
    pub id: Uuid,
    pub client_id: Uuid,
    pub author: String,
    pub written_at: NaiveDateTime,
    pub text: String,
}
