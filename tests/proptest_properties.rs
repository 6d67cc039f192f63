use fossil_delta::engine::{self, CreateOptions};
use fossil_delta::format::{Instruction, digits, parse};
use fossil_delta::{DeltaError, apply, create, output_size};
use proptest::prelude::*;

fn create_at(source: &[u8], target: &[u8], level: u32) -> Vec<u8> {
    engine::create_with_options(source, target, &CreateOptions::for_level(level))
}

/// Target sharing most of its content with `source`.
fn edited(source: &[u8], edits: &[(usize, u8)]) -> Vec<u8> {
    let mut target = source.to_vec();
    for &(pos, byte) in edits {
        if !target.is_empty() {
            let pos = pos % target.len();
            target[pos] = byte;
        }
    }
    target
}

proptest! {
    #[test]
    fn prop_create_apply_roundtrip(
        source in proptest::collection::vec(any::<u8>(), 0..4096),
        target in proptest::collection::vec(any::<u8>(), 0..4096),
        level in 0u32..=9u32
    ) {
        let delta = create_at(&source, &target, level);
        let decoded = apply(&source, &delta).unwrap();
        prop_assert_eq!(decoded, target);
    }

    #[test]
    fn prop_roundtrip_similar_inputs(
        source in proptest::collection::vec(any::<u8>(), 0..8192),
        edits in proptest::collection::vec((any::<usize>(), any::<u8>()), 0..16),
        level in 0u32..=9u32
    ) {
        let target = edited(&source, &edits);
        let delta = create_at(&source, &target, level);
        prop_assert_eq!(apply(&source, &delta).unwrap(), target);
    }

    #[test]
    fn prop_size_agreement(
        source in proptest::collection::vec(any::<u8>(), 0..1024),
        target in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let delta = create(&source, &target);
        prop_assert_eq!(output_size(&delta), target.len() as i64);
        prop_assert_eq!(engine::try_output_size(&delta).unwrap(), target.len());
    }

    #[test]
    fn prop_stream_is_well_formed(
        source in proptest::collection::vec(any::<u8>(), 0..2048),
        edits in proptest::collection::vec((any::<usize>(), any::<u8>()), 0..8),
    ) {
        let target = edited(&source, &edits);
        let delta = create(&source, &target);
        let stream = parse(&delta).unwrap();
        prop_assert_eq!(stream.output_size, target.len());
        prop_assert_eq!(stream.produced_len(), target.len());
        for pair in stream.instructions.windows(2) {
            // Literals are always flushed as one run.
            let both_inserts = matches!(pair, [Instruction::Insert(_), Instruction::Insert(_)]);
            prop_assert!(!both_inserts);
        }
        for inst in &stream.instructions {
            prop_assert!(inst.output_len() > 0);
            if let Instruction::Copy { offset, len } = *inst {
                prop_assert!(offset + len <= source.len());
            }
        }
    }

    #[test]
    fn prop_identity_is_all_copies(
        source in proptest::collection::vec(any::<u8>(), 16..8192),
        level in 0u32..=9u32
    ) {
        let delta = create_at(&source, &source, level);
        let stream = parse(&delta).unwrap();
        prop_assert_eq!(
            stream.instructions,
            vec![Instruction::Copy { offset: 0, len: source.len() }]
        );
    }

    #[test]
    fn prop_checksum_corruption_is_detected(
        source in proptest::collection::vec(any::<u8>(), 0..512),
        target in proptest::collection::vec(any::<u8>(), 1..512),
        bump in 1u32..=1000u32,
    ) {
        let delta = create(&source, &target);
        let stream = parse(&delta).unwrap();

        let mut tampered = stream.clone();
        tampered.checksum = stream.checksum + u64::from(bump);
        let tampered = fossil_delta::format::encode_stream(&tampered);

        prop_assert!(
            matches!(apply(&source, &tampered), Err(DeltaError::ChecksumMismatch { .. })),
            "corrupt checksum accepted"
        );
    }

    #[test]
    fn prop_checksum_digit_overwrite_is_detected(
        source in proptest::collection::vec(any::<u8>(), 0..512),
        target in proptest::collection::vec(any::<u8>(), 0..512),
        digit_pick in any::<usize>(),
        symbol_pick in 1usize..64,
    ) {
        let delta = create(&source, &target);
        // Checksum digits sit just before the final `;`.
        let end = delta.len() - 1;
        let run = digits::digit_count(parse(&delta).unwrap().checksum);
        let pos = end - run + digit_pick % run;
        let current = usize::from(digits::digit_value(delta[pos]).unwrap());
        let mut corrupt = delta.clone();
        corrupt[pos] = digits::ALPHABET[(current + symbol_pick) % 64];

        let result = apply(&source, &corrupt);
        prop_assert!(
            matches!(result, Err(DeltaError::ChecksumMismatch { .. })),
            "{:?}",
            result
        );
    }

    #[test]
    fn prop_tampered_copy_bounds_are_rejected(
        source in proptest::collection::vec(any::<u8>(), 16..1024),
        extra in 1usize..64,
    ) {
        let delta = create(&source, &source);
        let mut stream = parse(&delta).unwrap();
        stream.output_size += extra;
        stream.instructions = vec![Instruction::Copy { offset: 0, len: source.len() + extra }];
        let tampered = fossil_delta::format::encode_stream(&stream);

        let rejected = matches!(
            apply(&source, &tampered),
            Err(DeltaError::OutOfRangeCopy { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn prop_apply_never_panics(
        source in proptest::collection::vec(any::<u8>(), 0..64),
        delta in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let _ = apply(&source, &delta);
        let _ = output_size(&delta);
    }
}

#[test]
#[ignore = "performance properties are workload and machine dependent"]
fn perf_property_create_not_pathological() {
    use std::time::Instant;
    let make = |n: usize| -> Vec<u8> { (0..n).map(|i| (i % 251) as u8).collect() };
    let source = make(4 * 1024 * 1024);
    let mut target = source.clone();
    for i in (0..target.len()).step_by(4096) {
        target[i] = target[i].wrapping_add(3);
    }

    let t0 = Instant::now();
    let delta = create(&source, &target);
    let dt = t0.elapsed();
    assert_eq!(apply(&source, &delta).unwrap(), target);
    assert!(dt.as_secs_f64() < 20.0, "create took {:?}", dt);
}
