//! Packed binary container: fixed 3073-byte records.
//!
//! Record layout: one label byte, then the red, green and blue planes of
//! 1024 bytes each, every plane row-major over the 32x32 grid.

use std::path::Path;

use tracing::debug;

use crate::error::DecodeError;
use crate::record::{pack_rgb, ImageRecord, Label, NUM_CLASSES, PIXEL_COUNT};

/// Bytes in one color plane.
pub const PLANE_LEN: usize = PIXEL_COUNT;

/// Bytes in one packed record (label + three planes).
pub const RECORD_LEN: usize = 1 + 3 * PLANE_LEN;

/// Decodes an in-memory packed container.
///
/// `path` only labels errors.
///
/// # Errors
///
/// [`DecodeError::TruncatedRecord`] if `bytes.len()` is not a multiple of
/// [`RECORD_LEN`], [`DecodeError::InvalidLabel`] if a label byte exceeds 9.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use cifar_knn::dataset::packed::{decode_packed, RECORD_LEN};
///
/// let mut bytes = vec![0u8; 2 * RECORD_LEN];
/// bytes[RECORD_LEN] = 7;
/// let records = decode_packed(Path::new("batch.bin"), &bytes).expect("two whole records");
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[1].label(), 7);
/// ```
pub fn decode_packed(path: &Path, bytes: &[u8]) -> Result<Vec<ImageRecord>, DecodeError> {
    if bytes.len() % RECORD_LEN != 0 {
        return Err(DecodeError::TruncatedRecord {
            path: path.to_path_buf(),
            len: bytes.len(),
            record_len: RECORD_LEN,
        });
    }

    bytes
        .chunks_exact(RECORD_LEN)
        .enumerate()
        .map(|(i, chunk)| decode_record(path, i * RECORD_LEN, chunk))
        .collect()
}

fn decode_record(path: &Path, offset: usize, chunk: &[u8]) -> Result<ImageRecord, DecodeError> {
    let label: Label = chunk[0];
    if usize::from(label) >= NUM_CLASSES {
        return Err(DecodeError::InvalidLabel {
            path: path.to_path_buf(),
            offset,
            label,
        });
    }

    let (red, rest) = chunk[1..].split_at(PLANE_LEN);
    let (green, blue) = rest.split_at(PLANE_LEN);
    let pixels: Vec<u32> = red
        .iter()
        .zip(green)
        .zip(blue)
        .map(|((&r, &g), &b)| pack_rgb(r, g, b))
        .collect();

    Ok(ImageRecord::from_grid(pixels, label))
}

/// Reads and decodes one packed file.
///
/// # Errors
///
/// [`DecodeError::Io`] if the file cannot be read, otherwise as
/// [`decode_packed`].
pub fn read_packed_file(path: &Path) -> Result<Vec<ImageRecord>, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = decode_packed(path, &bytes)?;
    debug!(path = %path.display(), records = records.len(), "decoded packed file");
    Ok(records)
}
