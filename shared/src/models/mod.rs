//! Domain models for the Smart Irrigation relay

mod irrigation;
mod weather;

pub use irrigation::*;
pub use weather::*;
