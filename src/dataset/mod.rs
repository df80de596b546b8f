//! Dataset decoding.
//!
//! Turns input paths into a sequence of [`ImageRecord`]s. Two encodings are
//! supported:
//! - packed binary containers (`.bin`), see [`packed`]
//! - one image per file (`.png`), see [`raster`]
//!
//! The decoding strategy is chosen from the shape of the input, see
//! [`load_dataset`].
//!
//! # Example
//!
//! ```no_run
//! use cifar_knn::dataset::load_dataset;
//!
//! let train = load_dataset(&["data_batch_1.bin", "data_batch_2.bin"]).expect("packed batches");
//! let test = load_dataset(&["test_images/"]).expect("directory of png files");
//! println!("{} train / {} test", train.len(), test.len());
//! ```

pub mod packed;
pub mod raster;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::DecodeError;
use crate::record::ImageRecord;

pub use packed::{decode_packed, read_packed_file, RECORD_LEN};
pub use raster::{decode_raster, label_from_file_name, read_raster_file};

/// Extension of packed binary containers.
pub const PACKED_EXTENSION: &str = "bin";

/// Extension of one-image-per-file inputs.
pub const RASTER_EXTENSION: &str = "png";

/// Encoding used to decode a set of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Fixed 3073-byte records.
    Packed,
    /// One raster image per file.
    Raster,
}

/// Logical shape of the caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single directory.
    Directory,
    /// A single regular file.
    SingleFile,
    /// More than one path.
    MultipleFiles,
}

impl InputKind {
    /// Classifies a non-empty list of paths.
    #[must_use]
    pub fn of<P: AsRef<Path>>(paths: &[P]) -> Option<Self> {
        match paths {
            [] => None,
            [single] if single.as_ref().is_dir() => Some(Self::Directory),
            [_] => Some(Self::SingleFile),
            _ => Some(Self::MultipleFiles),
        }
    }
}

/// Case-insensitive extension check.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Picks the decoding strategy for `paths`.
///
/// - one directory: every file inside is a raster image
/// - one `.png` file: raster
/// - one `.bin` file: packed
/// - several paths: all packed
///
/// # Errors
///
/// [`DecodeError::NoInput`] for an empty list and
/// [`DecodeError::UnsupportedInput`] for a single file with another extension.
pub fn detect_format<P: AsRef<Path>>(paths: &[P]) -> Result<DatasetFormat, DecodeError> {
    let kind = InputKind::of(paths).ok_or(DecodeError::NoInput)?;
    match kind {
        InputKind::Directory => Ok(DatasetFormat::Raster),
        InputKind::MultipleFiles => Ok(DatasetFormat::Packed),
        InputKind::SingleFile => {
            let path = paths[0].as_ref();
            if has_extension(path, RASTER_EXTENSION) {
                Ok(DatasetFormat::Raster)
            } else if has_extension(path, PACKED_EXTENSION) {
                Ok(DatasetFormat::Packed)
            } else {
                Err(DecodeError::UnsupportedInput {
                    path: path.to_path_buf(),
                })
            }
        }
    }
}

/// Lists the regular files of a directory, sorted by file name.
///
/// # Errors
///
/// [`DecodeError::Io`] if the directory cannot be listed.
pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    let io_err = |source| DecodeError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Loads every record from `paths`, choosing the encoding with
/// [`detect_format`].
///
/// Records keep input order: files in the order given (directory entries
/// sorted by name), records within a packed file in byte order.
///
/// # Errors
///
/// Any [`DecodeError`]; decoding stops at the first bad input.
pub fn load_dataset<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ImageRecord>, DecodeError> {
    let format = detect_format(paths)?;
    let files: Vec<PathBuf> = match InputKind::of(paths) {
        Some(InputKind::Directory) => list_directory(paths[0].as_ref())?,
        _ => paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
    };

    let records = match format {
        DatasetFormat::Raster => files
            .iter()
            .map(|file| read_raster_file(file))
            .collect::<Result<Vec<_>, _>>()?,
        DatasetFormat::Packed => {
            let mut records = Vec::new();
            for file in &files {
                records.extend(read_packed_file(file)?);
            }
            records
        }
    };

    info!(
        format = ?format,
        files = files.len(),
        records = records.len(),
        "loaded dataset"
    );
    Ok(records)
}

#[cfg(test)]
mod tests;
