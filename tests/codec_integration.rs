use fossil_delta::engine::{self, ApplyOptions, CreateOptions};
use fossil_delta::format::{
    DeltaError, DeltaStream, DeltaWriter, Instruction, InstructionIterator, digits, encode_stream,
    parse,
};
use fossil_delta::hash::rolling;
use fossil_delta::{apply, create};

// ---------------------------------------------------------------------------
// Writer / parser agreement
// ---------------------------------------------------------------------------

#[test]
fn hand_built_delta_applies() {
    let source = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let target = b"abcdefghij--0123456789--uvwxyz";

    let mut writer = DeltaWriter::new(target.len());
    writer.copy(10, 10);
    writer.insert(b"--");
    writer.copy(0, 10);
    writer.insert(b"--");
    writer.copy(30, 6);
    assert_eq!(writer.produced(), target.len());
    let delta = writer.finish(rolling::checksum(target));

    assert_eq!(apply(source, &delta).unwrap(), target);
}

#[test]
fn parse_then_reencode_is_byte_identical() {
    let source = b"The quick brown fox jumps over the lazy dog";
    let target = b"The quick brown fox jumped over the lazy dogs";
    let delta = create(source, target);
    let stream = parse(&delta).unwrap();
    assert_eq!(encode_stream(&stream), delta);
}

#[test]
fn iterator_and_parse_agree() {
    let delta = b"g\nG@0\n3:catO@J\n1qBX4R;";
    let stream = parse(delta).unwrap();

    let mut iter = InstructionIterator::new(delta).unwrap();
    let collected: Vec<Instruction<'_>> = iter.by_ref().map(Result::unwrap).collect();
    assert_eq!(collected, stream.instructions);
    assert_eq!(iter.checksum(), Some(stream.checksum));
    assert_eq!(iter.output_size(), stream.output_size);
}

#[test]
fn stream_stats_summarise_instructions() {
    let stream = DeltaStream {
        output_size: 43,
        instructions: vec![
            Instruction::Copy { offset: 0, len: 16 },
            Instruction::Insert(b"cat"),
            Instruction::Copy { offset: 19, len: 24 },
        ],
        checksum: 0,
    };
    let stats = stream.stats();
    assert_eq!(stats.copies, 2);
    assert_eq!(stats.copied_bytes, 40);
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.inserted_bytes, 3);
    assert_eq!(stats.output_size, 43);
}

#[test]
fn digits_are_printable_and_terminator_free() {
    for n in [0u64, 1, 63, 64, 4095, 4096, u32::MAX as u64, u64::MAX] {
        let s = digits::to_string(n);
        assert!(s.bytes().all(|b| b.is_ascii_graphic()));
        assert!(!s.contains([':', '@', ';', '\n', ',']));
        assert_eq!(digits::read_u64(s.as_bytes()).unwrap(), (n, s.len()));
    }
}

// ---------------------------------------------------------------------------
// Binary payloads
// ---------------------------------------------------------------------------

#[test]
fn literal_payloads_carry_grammar_bytes() {
    let target: Vec<u8> = b"\n;@:,\0\xff".repeat(40);
    let delta = create(b"", &target);
    assert_eq!(apply(b"", &delta).unwrap(), target);
}

#[test]
fn all_byte_values_roundtrip() {
    let source: Vec<u8> = (0..=255u8).collect();
    let target: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
    let delta = create(&source, &target);
    assert_eq!(apply(&source, &delta).unwrap(), target);
}

// ---------------------------------------------------------------------------
// Source/delta mismatch
// ---------------------------------------------------------------------------

#[test]
fn wrong_source_is_detected() {
    let source: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 253) as u8).collect();
    let mut target = source.clone();
    target[2000] ^= 0x55;
    let delta = create(&source, &target);

    let mut other = source.clone();
    other[10] ^= 1;
    assert!(matches!(
        apply(&other, &delta),
        Err(DeltaError::ChecksumMismatch { .. })
    ));
    assert!(matches!(
        apply(&source[..1024], &delta),
        Err(DeltaError::OutOfRangeCopy { .. })
    ));
}

#[test]
fn checksum_verification_can_be_disabled() {
    let delta = b"4\n4@0\n1KPNDq;";
    assert!(apply(b"Test", delta).is_err());
    let opts = ApplyOptions {
        verify_checksum: false,
    };
    assert_eq!(engine::apply_with_options(b"Test", delta, &opts).unwrap(), b"Test");
}

// ---------------------------------------------------------------------------
// Batch helpers
// ---------------------------------------------------------------------------

#[test]
fn batch_roundtrip() {
    let sources: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 100 + i as usize * 50]).collect();
    let targets: Vec<Vec<u8>> = sources
        .iter()
        .map(|s| {
            let mut t = s.clone();
            t.extend_from_slice(b"appended");
            t
        })
        .collect();

    let pairs: Vec<(&[u8], &[u8])> = sources
        .iter()
        .zip(&targets)
        .map(|(s, t)| (s.as_slice(), t.as_slice()))
        .collect();
    let deltas = engine::create_batch(&pairs, &CreateOptions::default());

    let apply_pairs: Vec<(&[u8], &[u8])> = sources
        .iter()
        .zip(&deltas)
        .map(|(s, d)| (s.as_slice(), d.as_slice()))
        .collect();
    let outputs = engine::apply_batch(&apply_pairs, &ApplyOptions::default());

    for (output, target) in outputs.into_iter().zip(&targets) {
        assert_eq!(&output.unwrap(), target);
    }
}
