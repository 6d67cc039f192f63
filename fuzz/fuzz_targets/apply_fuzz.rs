#![no_main]
use libfuzzer_sys::fuzz_target;
use fossil_delta::{apply, output_size};

fuzz_target!(|data: &[u8]| {
    // Arbitrary deltas must only ever produce errors, never panics.
    let _ = apply(&[], data);
    let _ = output_size(data);

    // Also fuzz with a non-empty source.
    if data.len() >= 2 {
        let split = data.len() / 2;
        let (source, delta) = data.split_at(split);
        if let Ok(out) = apply(source, delta) {
            assert_eq!(output_size(delta), out.len() as i64);
        }
    }
});
