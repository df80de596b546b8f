//! Evaluation metrics over classified test images.
//!
//! Overall accuracy lives on [`ClassificationResult`](crate::knn::ClassificationResult);
//! this module breaks it down per class.

pub mod classification;

pub use classification::ConfusionMatrix;
