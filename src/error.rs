//! Error types for dataset decoding, classification and sessions.
//!
//! Each concern has its own enum; [`KnnError`] folds them together for
//! callers that drive the whole pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning input files into image records.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File or directory could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Packed file length is not a whole number of records.
    #[error(
        "{}: length {len} is not a multiple of the {record_len}-byte record size",
        path.display()
    )]
    TruncatedRecord {
        /// Offending path
        path: PathBuf,
        /// Byte length found
        len: usize,
        /// Expected record length
        record_len: usize,
    },

    /// Packed record carries a label outside `0..=9`.
    #[error(
        "{}: record at byte {offset} has label {label}, expected 0..=9",
        path.display()
    )]
    InvalidLabel {
        /// Offending path
        path: PathBuf,
        /// Byte offset of the record
        offset: usize,
        /// Label byte found
        label: u8,
    },

    /// Raster image could not be decoded.
    #[error("cannot decode image {}: {source}", path.display())]
    Image {
        /// Offending path
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// Raster image is not 32x32.
    #[error("{}: image is {width}x{height}, expected 32x32", path.display())]
    Dimensions {
        /// Offending path
        path: PathBuf,
        /// Width found
        width: u32,
        /// Height found
        height: u32,
    },

    /// File name does not start with a decimal digit label.
    #[error("{}: file name must start with a digit label", path.display())]
    UnlabeledFile {
        /// Offending path
        path: PathBuf,
    },

    /// Single input with an extension that is neither packed nor raster.
    #[error(
        "unsupported input {}: expected a directory, a .png file or .bin files",
        path.display()
    )]
    UnsupportedInput {
        /// Offending path
        path: PathBuf,
    },

    /// No input paths supplied.
    #[error("no input files given")]
    NoInput,
}

/// Failure raised by the classifier before or during a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// Parameter outside its valid range.
    #[error("invalid argument: {param} = {value}, expected {constraint}")]
    InvalidArgument {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Training or test set has no records.
    #[error("empty dataset: {dataset}")]
    EmptyDataset {
        /// Which dataset was empty
        dataset: String,
    },

    /// A run is already in progress on this classifier.
    #[error("classifier is already running")]
    AlreadyRunning,

    /// The worker thread could not be started.
    #[error("cannot start classification worker: {0}")]
    WorkerSpawn(String),

    /// The worker thread panicked before producing a result.
    #[error("classification worker panicked")]
    WorkerPanicked,
}

impl ClassifierError {
    /// Out-of-range `k` for a training set of `n_train` records.
    #[must_use]
    pub fn invalid_k(k: usize, n_train: usize) -> Self {
        Self::InvalidArgument {
            param: "k".to_string(),
            value: k.to_string(),
            constraint: format!("1..={n_train}"),
        }
    }

    /// Empty input set.
    #[must_use]
    pub fn empty(dataset: &str) -> Self {
        Self::EmptyDataset {
            dataset: dataset.to_string(),
        }
    }
}

/// Failure in the session controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A training input is not a packed `.bin` file.
    #[error("invalid training input {}: expected .bin files", .0.display())]
    InvalidTrainingInput(PathBuf),

    /// The test input is not a `.png` file or a directory of them.
    #[error(
        "invalid test input {}: expected a .png file or a directory of .png files",
        .0.display()
    )]
    InvalidTestInput(PathBuf),

    /// `start` called before both inputs were set.
    #[error("missing {0} input")]
    MissingInput(&'static str),

    /// No run has been started.
    #[error("no classification has been started")]
    NotStarted,
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum KnnError {
    /// Dataset decoding failed
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Classification failed
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// Session misuse
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Configuration file could not be read
    #[error("cannot read configuration {}: {source}", path.display())]
    ConfigIo {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration JSON could not be parsed or written
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, KnnError>;
