pub mod anamnesis;
pub mod client;
pub mod encounter;
pub mod enums;
pub mod scope;
pub mod service;

pub use anamnesis::*;
pub use client::*;
pub use encounter::*;
pub use scope::*;
pub use service::*;
