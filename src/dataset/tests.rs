//! Tests for dataset decoding.

use super::packed::PLANE_LEN;
use super::*;
use crate::record::{pack_rgb, IMG_SIZE, PIXEL_COUNT};
use image::{Rgb, RgbImage};

fn packed_record(label: u8, fill: impl Fn(usize) -> (u8, u8, u8)) -> Vec<u8> {
    let mut bytes = vec![0u8; RECORD_LEN];
    bytes[0] = label;
    for i in 0..PIXEL_COUNT {
        let (r, g, b) = fill(i);
        bytes[1 + i] = r;
        bytes[1 + PLANE_LEN + i] = g;
        bytes[1 + 2 * PLANE_LEN + i] = b;
    }
    bytes
}

fn write_png(path: &Path, width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 3]) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb(pixel(x, y)));
    img.save(path).expect("write test png");
}

#[test]
fn test_decode_packed_plane_layout() {
    let bytes = packed_record(4, |i| (i as u8, (i / 4) as u8, 200));
    let records = decode_packed(Path::new("a.bin"), &bytes).expect("one record");
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.label(), 4);
    for i in [0usize, 1, 31, 32, 500, 1023] {
        let expected = pack_rgb(i as u8, (i / 4) as u8, 200);
        assert_eq!(record.pixel(i % IMG_SIZE, i / IMG_SIZE), expected, "pixel {i}");
    }
}

#[test]
fn test_decode_packed_multiple_records() {
    let mut bytes = packed_record(1, |_| (1, 2, 3));
    bytes.extend(packed_record(9, |_| (4, 5, 6)));
    bytes.extend(packed_record(0, |_| (7, 8, 9)));

    let records = decode_packed(Path::new("a.bin"), &bytes).expect("three records");
    let labels: Vec<_> = records.iter().map(ImageRecord::label).collect();
    assert_eq!(labels, vec![1, 9, 0]);
    assert_eq!(records[1].pixel(0, 0), pack_rgb(4, 5, 6));
}

#[test]
fn test_decode_packed_empty_is_empty() {
    let records = decode_packed(Path::new("a.bin"), &[]).expect("zero records");
    assert!(records.is_empty());
}

#[test]
fn test_decode_packed_rejects_partial_record() {
    let mut bytes = packed_record(1, |_| (0, 0, 0));
    bytes.push(0);
    let err = decode_packed(Path::new("a.bin"), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::TruncatedRecord { len, record_len: RECORD_LEN, .. } if len == RECORD_LEN + 1
    ));
}

#[test]
fn test_decode_packed_rejects_out_of_range_label() {
    let mut bytes = packed_record(2, |_| (0, 0, 0));
    bytes.extend(packed_record(10, |_| (0, 0, 0)));
    let err = decode_packed(Path::new("a.bin"), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidLabel { offset, label: 10, .. } if offset == RECORD_LEN
    ));
}

#[test]
fn test_label_from_file_name() {
    assert_eq!(label_from_file_name(Path::new("0.png")).expect("digit"), 0);
    assert_eq!(label_from_file_name(Path::new("dir/7_ship.png")).expect("digit"), 7);
    assert!(matches!(
        label_from_file_name(Path::new("x7.png")),
        Err(DecodeError::UnlabeledFile { .. })
    ));
}

#[test]
fn test_read_raster_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("5_frog.png");
    write_png(&path, 32, 32, |x, y| [x as u8, y as u8, 77]);

    let record = read_raster_file(&path).expect("valid png");
    assert_eq!(record.label(), 5);
    assert_eq!(record.pixel(0, 0), pack_rgb(0, 0, 77));
    assert_eq!(record.pixel(3, 9), pack_rgb(3, 9, 77));
    assert_eq!(record.pixel(31, 30), pack_rgb(31, 30, 77));
}

#[test]
fn test_raster_wrong_dimensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("1.png");
    write_png(&path, 16, 32, |_, _| [0, 0, 0]);

    let err = read_raster_file(&path).unwrap_err();
    assert!(matches!(err, DecodeError::Dimensions { width: 16, height: 32, .. }));
}

#[test]
fn test_raster_garbage_bytes() {
    let err = decode_raster(Path::new("3.png"), b"not an image").unwrap_err();
    assert!(matches!(err, DecodeError::Image { .. }));
}

#[test]
fn test_detect_format() {
    assert!(matches!(detect_format::<&str>(&[]), Err(DecodeError::NoInput)));
    assert_eq!(detect_format(&["a.PNG"]).expect("png"), DatasetFormat::Raster);
    assert_eq!(detect_format(&["a.bin"]).expect("bin"), DatasetFormat::Packed);
    assert_eq!(
        detect_format(&["a.png", "b.png"]).expect("many"),
        DatasetFormat::Packed
    );
    assert!(matches!(
        detect_format(&["a.txt"]),
        Err(DecodeError::UnsupportedInput { .. })
    ));

    let dir = tempfile::tempdir().expect("tempdir");
    assert_eq!(detect_format(&[dir.path()]).expect("dir"), DatasetFormat::Raster);
}

#[test]
fn test_load_directory_sorted_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(&dir.path().join("8_b.png"), 32, 32, |_, _| [8, 8, 8]);
    write_png(&dir.path().join("2_a.png"), 32, 32, |_, _| [2, 2, 2]);
    write_png(&dir.path().join("5_c.png"), 32, 32, |_, _| [5, 5, 5]);

    let records = load_dataset(&[dir.path()]).expect("directory of png");
    let labels: Vec<_> = records.iter().map(ImageRecord::label).collect();
    assert_eq!(labels, vec![2, 5, 8]);
    assert_eq!(records[0].pixel(10, 10), pack_rgb(2, 2, 2));
}

#[test]
fn test_load_multiple_packed_files_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("data_batch_1.bin");
    let second = dir.path().join("data_batch_2.bin");

    let mut bytes = packed_record(3, |_| (0, 0, 0));
    bytes.extend(packed_record(4, |_| (0, 0, 0)));
    std::fs::write(&first, bytes).expect("write");
    std::fs::write(&second, packed_record(6, |_| (0, 0, 0))).expect("write");

    let records = load_dataset(&[&first, &second]).expect("packed files");
    let labels: Vec<_> = records.iter().map(ImageRecord::label).collect();
    assert_eq!(labels, vec![3, 4, 6]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.bin");
    let err = load_dataset(&[missing]).unwrap_err();
    assert!(matches!(err, DecodeError::Io { .. }));
}

#[test]
fn test_load_directory_with_unlabeled_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(&dir.path().join("1.png"), 32, 32, |_, _| [0, 0, 0]);
    write_png(&dir.path().join("cat.png"), 32, 32, |_, _| [0, 0, 0]);

    let err = load_dataset(&[dir.path()]).unwrap_err();
    assert!(matches!(err, DecodeError::UnlabeledFile { .. }));
}
