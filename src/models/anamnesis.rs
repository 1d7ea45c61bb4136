use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Periodicity, RiskyBehavior};

/// Intake questionnaire of a client. At most one per client; the hygiene
/// report only covers clients who have one filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anamnesis {
    pub id: Uuid,
    pub client_id: Uuid,
    pub filled_on: Option<NaiveDate>,
}

/// Periodicity of one risky behavior, tracked for past and present
/// separately. At most one record per (anamnesis, behavior).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskyManners {
    pub id: Uuid,
    pub anamnesis_id: Uuid,
    pub behavior: RiskyBehavior,
    pub periodicity_in_present: Option<Periodicity>,
    pub periodicity_in_past: Option<Periodicity>,
}
