use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

/// One cell of a report row. Regulatory forms mix numbers with placeholder
/// strings ("xxx" for metrics not tracked per client) and blank cells for
/// lines the programme does not report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(i64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn number(value: i64) -> Self {
        Self::Number(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Placeholder used where the form expects a value the programme does
    /// not track per client.
    pub fn not_tracked() -> Self {
        Self::Text("xxx".into())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Number(value as i64)
    }
}

/// One row of a report. Section headers carry no cells; data rows carry an
/// optional form code, a label and the value cells. Row order is fixed per
/// report type — it mirrors the external regulatory form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub code: Option<String>,
    pub label: String,
    pub cells: Vec<Cell>,
}

impl Row {
    /// Top-level header (e.g. the programme-type banner of the RVKPP form).
    pub fn header(label: impl Into<String>) -> Self {
        Self {
            code: None,
            label: label.into(),
            cells: Vec::new(),
        }
    }

    /// Section header with a form code ("skupina 1") and description.
    pub fn section(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            label: label.into(),
            cells: Vec::new(),
        }
    }

    pub fn data(
        code: impl Into<String>,
        label: impl Into<String>,
        cells: Vec<Cell>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            label: label.into(),
            cells,
        }
    }

    /// Data row without a form code (the services sheet has none).
    pub fn values(label: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            code: None,
            label: label.into(),
            cells,
        }
    }

    pub fn is_header(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Finished report, handed to the external export/templating layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub title: String,
    pub description: String,
    pub filename: String,
    pub rows: Vec<Row>,
}

/// A generated report: a fixed row sequence plus naming for the exported
/// document.
pub trait Report {
    fn title(&self) -> String;
    fn description(&self) -> String;
    fn filename(&self) -> String;
    fn rows(&self, conn: &Connection) -> Result<Vec<Row>, DatabaseError>;

    fn run(&self, conn: &Connection) -> Result<ReportOutput, DatabaseError> {
        let rows = self.rows(conn)?;
        tracing::info!(report = %self.title(), rows = rows.len(), "report generated");
        Ok(ReportOutput {
            title: self.title(),
            description: self.description(),
            filename: self.filename(),
            rows,
        })
    }
}

/// Normalizes a date-bearing filename: locale-formatted dates contain spaces
/// and dashes, the export layer wants neither.
pub fn normalize_filename(name: &str) -> String {
    name.replace(['-', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_serialize_flat() {
        let row = Row::data(
            "1.1",
            "základní droga heroin",
            vec![Cell::number(3), Cell::not_tracked(), Cell::Empty],
        );
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["cells"][0], 3);
        assert_eq!(json["cells"][1], "xxx");
        assert!(json["cells"][2].is_null());
    }

    #[test]
    fn headers_have_no_cells() {
        assert!(Row::header("TP - terénní programy").is_header());
        assert!(Row::section("skupina 1", "Klienti").is_header());
        assert!(!Row::values("Kontaktní práce", vec![Cell::number(0)]).is_header());
    }

    #[test]
    fn filename_normalization() {
        assert_eq!(
            normalize_filename("vystup_pro_hygienu_2013-01-01_2013-03-31.doc"),
            "vystup_pro_hygienu_2013_01_01_2013_03_31.doc"
        );
        assert_eq!(normalize_filename("a b-c"), "a_b_c");
    }
}
