//! K-nearest-neighbor classification of 32x32 images.
//!
//! - [`ranking`]: (distance, label) entries and the majority vote
//! - [`progress`]: run states, progress observers, the stop flag
//! - [`classifier`]: the brute-force classifier and its results
//! - [`worker`]: running a classification on a dedicated thread
//!
//! # Example
//!
//! ```
//! use cifar_knn::knn::{KnnClassifier, NoProgress};
//! use cifar_knn::record::ImageRecord;
//!
//! let train: Vec<_> = (0..10u8)
//!     .map(|label| ImageRecord::filled(u32::from(label) * 1000, label))
//!     .collect();
//! let test = vec![ImageRecord::filled(4100, 4), ImageRecord::filled(8900, 9)];
//!
//! let result = KnnClassifier::new(1).run(&train, &test, &NoProgress).expect("valid");
//! let labels: Vec<_> = result.predictions.iter().map(|p| p.label).collect();
//! assert_eq!(labels, vec![4, 9]);
//! assert_eq!(result.accuracy_percent(), Some(100));
//! ```

pub mod classifier;
pub mod progress;
pub mod ranking;
pub mod worker;

pub use classifier::{classify, predict_one, ClassificationResult, KnnClassifier, Prediction};
pub use progress::{
    ChannelObserver, FnObserver, NoProgress, ProgressEvent, ProgressObserver, RunState, StopFlag,
};
pub use ranking::{select_nearest, vote, LabelCounts, RankingEntry, Vote};
pub use worker::{spawn, ClassificationHandle};
