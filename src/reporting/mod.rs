//! Report generation. Reports pull scope-filtered data through
//! [`queries`], aggregate in memory and emit a fixed sequence of rows for
//! the export layer.

pub mod council;
pub mod hygiene;
pub mod queries;
pub mod rows;
pub mod stats;

pub use council::{CouncilKind, CouncilReport};
pub use hygiene::{HygieneKind, HygieneReport};
pub use rows::{Cell, Report, ReportOutput, Row};
pub use stats::ServiceStatsReport;
