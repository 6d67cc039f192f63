#![no_main]
use libfuzzer_sys::fuzz_target;
use fossil_delta::engine::{self, CreateOptions};
use fossil_delta::{apply, output_size};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let level = (data[0] % 10) as u32;
    let split = 2 + (data[1] as usize % (data.len() - 2));
    let source = &data[2..split];
    let target = &data[split..];

    let delta = engine::create_with_options(source, target, &CreateOptions::for_level(level));
    assert_eq!(output_size(&delta), target.len() as i64);

    let decoded = apply(source, &delta).expect("created delta must apply");
    assert_eq!(decoded, target);
});
