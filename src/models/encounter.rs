use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded contact between staff and a person on a given date at a
/// given town. Groups zero or more performed services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub id: Uuid,
    pub person_id: Uuid,
    pub town_id: Uuid,
    pub performed_on: NaiveDate,
    pub is_by_phone: bool,
    /// Names of the staff members present. Consumed read-only; no report
    /// metric aggregates over it.
    pub performed_by: Vec<String>,
}
