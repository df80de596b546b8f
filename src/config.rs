//! Classifier configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, KnnError};

/// Default number of neighbors.
pub const DEFAULT_K: usize = 5;

/// Largest `k` offered by interactive sessions.
pub const MAX_SESSION_K: usize = 10;

/// How test images are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One test image after another on the calling thread.
    #[default]
    Sequential,
    /// Test images spread over the rayon thread pool.
    Parallel,
}

/// Settings for a [`KnnClassifier`](crate::knn::KnnClassifier).
///
/// # Example
///
/// ```
/// use cifar_knn::config::{ExecutionMode, KnnConfig};
///
/// let config = KnnConfig::from_json_str(r#"{ "k": 3, "execution": "parallel" }"#)
///     .expect("valid json");
/// assert_eq!(config.k, 3);
/// assert_eq!(config.execution, ExecutionMode::Parallel);
///
/// let defaults = KnnConfig::from_json_str("{}").expect("all fields default");
/// assert_eq!(defaults, KnnConfig::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnConfig {
    /// Number of neighbors that vote.
    pub k: usize,
    /// Scheduling of test images.
    pub execution: ExecutionMode,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            execution: ExecutionMode::Sequential,
        }
    }
}

impl KnnConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `k`.
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    /// Checks settings that do not depend on the data.
    ///
    /// The upper bound on `k` depends on the training set and is checked when
    /// a run starts.
    ///
    /// # Errors
    ///
    /// [`ClassifierError::InvalidArgument`] if `k` is zero.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.k == 0 {
            return Err(ClassifierError::InvalidArgument {
                param: "k".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// [`KnnError::Json`] for malformed JSON, [`KnnError::Classifier`] for
    /// invalid values.
    pub fn from_json_str(json: &str) -> Result<Self, KnnError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// As [`KnnConfig::from_json_str`], plus [`KnnError::ConfigIo`] if the file
    /// cannot be read.
    pub fn from_json_file(path: &Path) -> Result<Self, KnnError> {
        let json = std::fs::read_to_string(path).map_err(|source| KnnError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes to pretty JSON.
    ///
    /// # Errors
    ///
    /// [`KnnError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, KnnError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
