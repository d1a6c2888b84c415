//! Business logic services for the Smart Irrigation relay

pub mod classifier;
pub mod prediction;

pub use classifier::{Classifier, ClassifierError, TreeEnsemble};
pub use prediction::{ActuationStatus, PredictionOutcome, PredictionService};
