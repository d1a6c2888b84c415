//! Watering classifier
//!
//! The prediction pipeline sees a classifier only through [`Classifier`]: a
//! feature vector goes in, a binary label comes out. Two backends exist:
//!
//! - [`TreeEnsemble`]: a decision tree or random forest exported to JSON and
//!   evaluated in process. Loaded once at startup and never mutated.
//! - [`RemoteClassifier`](crate::external::RemoteClassifier): an HTTP
//!   inference service.
//!
//! Artifact format:
//!
//! ```json
//! {
//!   "feature_names": ["precip", "temp_avg", "temp_max", "temp_min"],
//!   "trees": [
//!     { "nodes": [
//!       { "feature": 1, "threshold": 30.0, "left": 1, "right": 2 },
//!       { "class": 0 },
//!       { "class": 1 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends the sample `left` when `x[feature] <= threshold`. Node 0 is
//! the root and children always have a larger index than their parent.
//!
//! Leaves hold a single class, so an exporter must collapse each leaf's class
//! distribution to its argmax. The forest then takes a hard majority vote
//! over trees, ties going to 0. This can disagree with scikit-learn's
//! `RandomForestClassifier.predict`, which averages leaf probabilities.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use shared::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use thiserror::Error;

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode model artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote inference failed: {0}")]
    Remote(String),
}

/// Binary watering classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Predict a label for one sample; 1 means water, 0 means don't
    async fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError>;

    /// Short backend name for logs and the health endpoint
    fn name(&self) -> &'static str;
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, tree_index: usize) -> Result<(), ClassifierError> {
        let invalid = |msg: String| ClassifierError::InvalidModel(format!("tree {}: {}", tree_index, msg));

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(invalid(format!(
                            "node {} splits on unknown feature {}",
                            index, feature
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {} has a non-finite threshold", index)));
                    }
                    for child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "node {} points to invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { class } => {
                    if class > 1 {
                        return Err(invalid(format!("leaf {} has class {}", index, class)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf
    fn evaluate(&self, values: &[f64; FEATURE_COUNT]) -> Result<u8, ClassifierError> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = values.get(*feature).copied().ok_or_else(|| {
                        ClassifierError::InvalidModel(format!("unknown feature {}", feature))
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ClassifierError::InvalidModel(format!(
                        "node {} does not exist",
                        index
                    )))
                }
            }
        }
    }
}

/// Decision tree or forest evaluated in process
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeEnsemble {
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    /// Load and validate an artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact
    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let model: Self = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        // A reordered feature list would still evaluate, just wrongly
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ClassifierError::InvalidModel(format!(
                "feature_names must be {:?}, got {:?}",
                FEATURE_NAMES, self.feature_names
            )));
        }
        if self.trees.is_empty() {
            return Err(ClassifierError::InvalidModel("no trees".to_string()));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index)?;
        }
        Ok(())
    }

    /// Majority vote over all trees; a tie means don't water
    pub fn vote(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        if !features.is_finite() {
            return Err(ClassifierError::InvalidInput(format!(
                "non-finite feature in {:?}",
                features
            )));
        }

        let values = features.as_array();
        let mut votes = 0usize;
        for tree in &self.trees {
            votes += usize::from(tree.evaluate(&values)?);
        }

        Ok(u8::from(votes * 2 > self.trees.len()))
    }
}

#[async_trait]
impl Classifier for TreeEnsemble {
    async fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        self.vote(features)
    }

    fn name(&self) -> &'static str {
        "tree_ensemble"
    }
}
