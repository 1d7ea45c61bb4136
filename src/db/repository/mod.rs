//! Repository layer — entity-scoped database operations.
//!
//! Writes exist for the case-management frontend and for seeding test data;
//! the reporting code in `crate::reporting` only ever reads.

mod anamnesis;
mod encounter;
mod note;
mod person;
mod service;
mod syringe;
mod town;

pub use anamnesis::*;
pub use encounter::*;
pub use note::*;
pub use person::*;
pub use service::*;
pub use syringe::*;
pub use town::*;
