//! # Domain Layer
//!
//! Core models and errors for chat completions and monitoring reports.
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;
