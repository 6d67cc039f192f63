#![no_main]
use libfuzzer_sys::fuzz_target;
use fossil_delta::format::{InstructionIterator, encode_stream, parse};

fuzz_target!(|data: &[u8]| {
    // Whatever parses must re-encode to a delta that parses the same way.
    let Ok(stream) = parse(data) else {
        if let Ok(iter) = InstructionIterator::new(data) {
            for _ in iter {}
        }
        return;
    };
    if stream.produced_len() != stream.output_size {
        return;
    }
    let reencoded = encode_stream(&stream);
    let reparsed = parse(&reencoded).unwrap();
    assert_eq!(reparsed.output_size, stream.output_size);
    assert_eq!(reparsed.checksum, stream.checksum);
    let nonempty: Vec<_> = stream
        .instructions
        .iter()
        .filter(|i| i.output_len() > 0)
        .copied()
        .collect();
    assert_eq!(reparsed.instructions, nonempty);
});
