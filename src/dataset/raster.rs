//! One-image-per-file raster inputs.
//!
//! Each file holds a single 32x32 image; its ground-truth label is the
//! first character of the file name.

use std::path::Path;

use tracing::debug;

use crate::error::DecodeError;
use crate::record::{pack_rgb, ImageRecord, Label, IMG_SIZE};

/// Parses the label from the first character of a file name.
///
/// # Errors
///
/// [`DecodeError::UnlabeledFile`] if the name does not start with `0`-`9`.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use cifar_knn::dataset::raster::label_from_file_name;
///
/// assert_eq!(label_from_file_name(Path::new("imgs/3_cat.png")).expect("digit"), 3);
/// assert!(label_from_file_name(Path::new("cat.png")).is_err());
/// ```
pub fn label_from_file_name(path: &Path) -> Result<Label, DecodeError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.chars().next())
        .and_then(|c| c.to_digit(10))
        .map(|digit| digit as Label)
        .ok_or_else(|| DecodeError::UnlabeledFile {
            path: path.to_path_buf(),
        })
}

/// Decodes an in-memory raster image into a labeled record.
///
/// # Errors
///
/// [`DecodeError::UnlabeledFile`] for a name without a digit prefix,
/// [`DecodeError::Image`] for undecodable bytes, and
/// [`DecodeError::Dimensions`] for anything other than 32x32.
pub fn decode_raster(path: &Path, bytes: &[u8]) -> Result<ImageRecord, DecodeError> {
    let label = label_from_file_name(path)?;
    let image = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width as usize != IMG_SIZE || height as usize != IMG_SIZE {
        return Err(DecodeError::Dimensions {
            path: path.to_path_buf(),
            width,
            height,
        });
    }

    // `pixels()` walks rows top to bottom, matching the record layout.
    let pixels: Vec<u32> = rgb.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();
    Ok(ImageRecord::from_grid(pixels, label))
}

/// Reads and decodes one raster file.
///
/// # Errors
///
/// [`DecodeError::Io`] if the file cannot be read, otherwise as
/// [`decode_raster`].
pub fn read_raster_file(path: &Path) -> Result<ImageRecord, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = decode_raster(path, &bytes)?;
    debug!(path = %path.display(), label = record.label(), "decoded raster file");
    Ok(record)
}
