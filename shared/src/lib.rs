//! Shared types and models for the Smart Irrigation relay
//!
//! This crate contains the request-scoped values passed between the weather
//! client, the classifier and the valve controller. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
