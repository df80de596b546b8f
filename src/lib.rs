//! cifar-knn: brute-force k-nearest-neighbor classification of 32x32 images.
//!
//! Training images come from packed `.bin` containers (one label byte, then
//! the red, green and blue planes of 1024 bytes each per record). Test images
//! come from the same containers or from `.png` files whose name starts with
//! the label digit. Every test image is compared against every training image
//! with Euclidean distance over packed RGB values; the `k` nearest vote.
//!
//! # Quick Start
//!
//! ```
//! use cifar_knn::prelude::*;
//!
//! let train: Vec<_> = (0..10u8)
//!     .map(|label| ImageRecord::filled(u32::from(label) * 500, label))
//!     .collect();
//! let test = vec![ImageRecord::filled(1_020, 2)];
//!
//! let result = KnnClassifier::new(1).run(&train, &test, &NoProgress).unwrap();
//! let prediction = result.single().unwrap();
//! assert_eq!(prediction.label, 2);
//! assert_eq!(prediction.confidence, 1.0);
//! ```
//!
//! # Modules
//!
//! - [`record`]: the 32x32 image record and packed RGB helpers
//! - [`dataset`]: decoding `.bin` containers and `.png` files
//! - [`knn`]: ranking, voting, progress reporting and the classifier
//! - [`metrics`]: per-class confusion matrix
//! - [`config`]: classifier configuration (JSON)
//! - [`session`]: input validation and run lifecycle for front ends
//! - [`error`]: error types

pub mod config;
pub mod dataset;
pub mod error;
pub mod knn;
pub mod metrics;
pub mod prelude;
pub mod record;
pub mod session;

pub use error::{KnnError, Result};
pub use knn::{ClassificationResult, KnnClassifier};
pub use record::ImageRecord;
