//! Property-based tests using proptest.
//!
//! These tests verify invariants of decoding, ranking and classification.

use std::path::Path;
use std::sync::Mutex;

use cifar_knn::dataset::{decode_packed, RECORD_LEN};
use cifar_knn::knn::{select_nearest, vote, RankingEntry};
use cifar_knn::prelude::*;
use cifar_knn::record::{pack_rgb, unpack_rgb, PIXEL_COUNT};
use proptest::prelude::*;

// Strategy for one packed record with a valid label
fn packed_record_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0u8..10, proptest::collection::vec(any::<u8>(), RECORD_LEN - 1)).prop_map(|(label, body)| {
        let mut record = Vec::with_capacity(RECORD_LEN);
        record.push(label);
        record.extend(body);
        record
    })
}

// Strategy for images built from a few flat colors
fn image_strategy() -> impl Strategy<Value = ImageRecord> {
    (any::<[u8; 3]>(), 0u8..10, 0usize..PIXEL_COUNT, any::<u32>()).prop_map(
        |([r, g, b], label, spot, spot_value)| {
            let mut pixels = vec![pack_rgb(r, g, b); PIXEL_COUNT];
            pixels[spot] = spot_value & 0x00FF_FFFF;
            ImageRecord::new(pixels, label).expect("valid grid")
        },
    )
}

fn dataset_strategy(max: usize) -> impl Strategy<Value = Vec<ImageRecord>> {
    proptest::collection::vec(image_strategy(), 1..max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn packed_blob_yields_one_record_per_chunk(
        records in proptest::collection::vec(packed_record_strategy(), 0..6)
    ) {
        let blob: Vec<u8> = records.concat();
        let decoded = decode_packed(Path::new("blob.bin"), &blob).expect("whole records");
        prop_assert_eq!(decoded.len(), records.len());
        for (record, bytes) in decoded.iter().zip(&records) {
            prop_assert_eq!(record.label(), bytes[0]);
            let (r, g, b) = unpack_rgb(record.pixel(0, 0));
            prop_assert_eq!((r, g, b), (bytes[1], bytes[1 + PIXEL_COUNT], bytes[1 + 2 * PIXEL_COUNT]));
        }
    }

    #[test]
    fn packed_blob_with_partial_record_is_rejected(
        record in packed_record_strategy(),
        extra in 1usize..RECORD_LEN
    ) {
        let blob = &record[..extra];
        prop_assert!(decode_packed(Path::new("blob.bin"), blob).is_err());
    }

    #[test]
    fn identical_image_wins_with_k1(
        train in dataset_strategy(12),
        pick in any::<prop::sample::Index>()
    ) {
        let target = train[pick.index(train.len())].clone();
        let prediction = predict_one(1, &train, &target).expect("valid input");
        // Duplicates at distance zero may precede the target; any of them has
        // the same pixels, and the first one in training order wins.
        let first_match = train
            .iter()
            .find(|r| r.pixels() == target.pixels())
            .expect("target is in the training set");
        prop_assert_eq!(prediction.label, first_match.label());
        prop_assert_eq!(prediction.confidence, 1.0);
    }

    #[test]
    fn progress_is_monotonic_and_reaches_100(
        train in dataset_strategy(10),
        test in dataset_strategy(6),
        k in 1usize..4
    ) {
        prop_assume!(k <= train.len());
        let seen = Mutex::new(Vec::new());
        let result = classify(k, &train, &test, |p| seen.lock().expect("lock").push(p), || false)
            .expect("valid input");
        let seen = seen.into_inner().expect("lock");
        prop_assert_eq!(result.state, RunState::Completed);
        prop_assert_eq!(seen.last().copied(), Some(100));
        prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn accuracy_is_a_rounded_percentage(
        train in dataset_strategy(10),
        test in dataset_strategy(8),
        k in 1usize..4
    ) {
        prop_assume!(k <= train.len());
        let result = KnnClassifier::new(k).run(&train, &test, &NoProgress).expect("valid input");
        let accuracy = result.accuracy().expect("all images processed");
        prop_assert!((0.0..=100.0).contains(&accuracy));
        let expected = (100.0 * result.correct() as f64 / test.len() as f64).round() as u32;
        prop_assert_eq!(result.accuracy_percent(), Some(expected));
        for p in &result.predictions {
            prop_assert!(p.confidence > 0.0 && p.confidence <= 1.0);
        }
    }

    #[test]
    fn vote_winner_has_the_most_votes(
        entries in proptest::collection::vec((0.0f64..1000.0, 0u8..10), 1..20),
        k in 1usize..20
    ) {
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(distance, label)| RankingEntry::new(distance, label))
            .collect();
        let k = k.min(entries.len());
        let nearest = select_nearest(entries, k);
        prop_assert_eq!(nearest.len(), k);
        prop_assert!(nearest.windows(2).all(|w| w[0].distance <= w[1].distance));

        let winner = vote(&nearest).expect("non-empty");
        for label in 0..10u8 {
            let count = nearest.iter().filter(|e| e.label == label).count();
            prop_assert!(count <= winner.votes);
        }
        prop_assert!((winner.confidence - winner.votes as f64 / k as f64).abs() < 1e-12);
    }
}
