//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use cifar_knn::prelude::*;
//! ```

pub use crate::config::{ExecutionMode, KnnConfig};
pub use crate::dataset::load_dataset;
pub use crate::error::{ClassifierError, DecodeError, KnnError};
pub use crate::knn::{
    classify, predict_one, spawn, ClassificationResult, KnnClassifier, NoProgress, Prediction,
    ProgressObserver, RunState,
};
pub use crate::metrics::ConfusionMatrix;
pub use crate::record::{ImageRecord, Label};
pub use crate::session::Session;
