//! Labeled image records.
//!
//! An [`ImageRecord`] is the unit exchanged between the dataset decoder and
//! the classifier: a fixed 32x32 grid of packed RGB values plus a class label.

/// Class label in `0..=9`.
pub type Label = u8;

/// Width and height of every image, in pixels.
pub const IMG_SIZE: usize = 32;

/// Number of pixels in one image.
pub const PIXEL_COUNT: usize = IMG_SIZE * IMG_SIZE;

/// Number of distinct class labels.
pub const NUM_CLASSES: usize = 10;

/// Packs three 8-bit channels into a single `R<<16 | G<<8 | B` value.
///
/// # Example
///
/// ```
/// use cifar_knn::record::pack_rgb;
///
/// assert_eq!(pack_rgb(0xFF, 0x80, 0x01), 0x00FF_8001);
/// ```
#[inline]
#[must_use]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
}

/// Splits a packed value back into its `(r, g, b)` channels.
#[inline]
#[must_use]
pub fn unpack_rgb(rgb: u32) -> (u8, u8, u8) {
    ((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// An immutable 32x32 packed-RGB image with its label.
///
/// Pixels are stored row-major: the pixel at `(x, y)` lives at index
/// `y * IMG_SIZE + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pixels: Box<[u32]>,
    label: Label,
}

impl ImageRecord {
    /// Builds a record from exactly [`PIXEL_COUNT`] packed pixels.
    ///
    /// Returns `None` when the pixel count does not match the 32x32 grid or
    /// the label is outside `0..=9`.
    ///
    /// # Example
    ///
    /// ```
    /// use cifar_knn::record::{ImageRecord, PIXEL_COUNT};
    ///
    /// let record = ImageRecord::new(vec![0; PIXEL_COUNT], 3).expect("32x32 grid");
    /// assert_eq!(record.label(), 3);
    /// assert!(ImageRecord::new(vec![0; 10], 3).is_none());
    /// assert!(ImageRecord::new(vec![0; PIXEL_COUNT], 10).is_none());
    /// ```
    #[must_use]
    pub fn new(pixels: Vec<u32>, label: Label) -> Option<Self> {
        if pixels.len() != PIXEL_COUNT || usize::from(label) >= NUM_CLASSES {
            return None;
        }
        Some(Self {
            pixels: pixels.into_boxed_slice(),
            label,
        })
    }

    /// Builds a record from a grid the caller already sized.
    pub(crate) fn from_grid(pixels: Vec<u32>, label: Label) -> Self {
        debug_assert_eq!(pixels.len(), PIXEL_COUNT);
        debug_assert!(usize::from(label) < NUM_CLASSES);
        Self {
            pixels: pixels.into_boxed_slice(),
            label,
        }
    }

    /// A record whose every pixel has the same packed value.
    ///
    /// # Panics
    ///
    /// Panics if `label` is outside `0..=9`.
    #[must_use]
    pub fn filled(rgb: u32, label: Label) -> Self {
        assert!(usize::from(label) < NUM_CLASSES, "label {label} out of range");
        Self {
            pixels: vec![rgb; PIXEL_COUNT].into_boxed_slice(),
            label,
        }
    }

    /// Packed pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Packed value at grid position `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is outside `0..IMG_SIZE`.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        assert!(x < IMG_SIZE && y < IMG_SIZE, "pixel ({x}, {y}) out of bounds");
        self.pixels[y * IMG_SIZE + x]
    }

    /// Ground-truth label.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }

    /// Euclidean distance over the packed pixel values.
    ///
    /// Channels are not separated: each term is the squared difference of two
    /// whole `R<<16 | G<<8 | B` integers. The sum is exact in `i64` (at most
    /// 1024 * (2^24)^2 = 2^58) before the square root.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let sum: i64 = self
            .pixels
            .iter()
            .zip(other.pixels.iter())
            .map(|(&a, &b)| {
                let diff = i64::from(a) - i64::from(b);
                diff * diff
            })
            .sum();
        (sum as f64).sqrt()
    }
}
