use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query context of one report run: the date range (inclusive on both day
/// boundaries) and an optional town restriction. Threaded explicitly through
/// every aggregation function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportScope {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Empty means no town restriction, not "no results".
    pub towns: Vec<Uuid>,
}

impl ReportScope {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate, towns: Vec<Uuid>) -> Self {
        Self {
            date_from,
            date_to,
            towns,
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_from <= date && date <= self.date_to
    }

    pub fn contains_town(&self, town_id: Uuid) -> bool {
        self.towns.is_empty() || self.towns.contains(&town_id)
    }

    /// Calendar year the range starts in (the hygiene report anchors its
    /// first-encounter lookup to it).
    pub fn year(&self) -> i32 {
        self.date_from.year()
    }
}
