// Delta engine: ties hash/matching to the Fossil delta format.
//
// Provides the public create/apply/size operations, orchestrating:
//   - Block matching (hash module) to find COPY/INSERT instructions
//   - Delta serialization (format module) to produce the delta text
//   - Delta parsing and replay to reconstruct the target from the source

use crate::format::decoder::{self, DeltaError};
use crate::format::encoder::DeltaWriter;
use crate::format::instruction::{DeltaStats, Instruction};
use crate::hash::config::MatcherConfig;
use crate::hash::matching::MatchEngine;
use crate::hash::rolling;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for delta creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Matcher profile (index granularity, candidate limit).
    pub matcher: MatcherConfig,
}

impl CreateOptions {
    /// Options for a numeric level (0-9). See [`crate::hash::config::config_for_level`].
    pub fn for_level(level: u32) -> Self {
        Self {
            matcher: crate::hash::config::config_for_level(level),
        }
    }
}

/// Configuration for delta application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Compare the output checksum against the delta's terminator.
    pub verify_checksum: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a delta that turns `source` into `target`.
///
/// Never fails: any two buffers (including empty ones) have a delta.
pub fn create(source: &[u8], target: &[u8]) -> Vec<u8> {
    create_with_options(source, target, &CreateOptions::default())
}

/// Create with custom options.
pub fn create_with_options(source: &[u8], target: &[u8], opts: &CreateOptions) -> Vec<u8> {
    let engine = MatchEngine::new(opts.matcher, source);
    let instructions = engine.find_matches(target);

    let mut stats = DeltaStats {
        output_size: target.len(),
        ..DeltaStats::default()
    };
    let mut writer = DeltaWriter::with_capacity(target.len(), estimate_len(&instructions));
    for inst in &instructions {
        stats.record(inst);
        writer.push(inst);
    }
    let delta = writer.finish(rolling::checksum(target));

    log::debug!(
        "create: source {} bytes, target {} bytes -> delta {} bytes ({} copies / {} bytes, {} inserts / {} bytes)",
        source.len(),
        target.len(),
        delta.len(),
        stats.copies,
        stats.copied_bytes,
        stats.inserts,
        stats.inserted_bytes
    );
    delta
}

/// Upper bound on the encoded size of `instructions` plus header and trailer.
fn estimate_len(instructions: &[Instruction<'_>]) -> usize {
    use crate::format::digits::MAX_DIGITS;
    let framing = MAX_DIGITS * 2 + 2;
    instructions.iter().fold(framing, |acc, inst| {
        acc + match inst {
            Instruction::Copy { .. } => MAX_DIGITS * 2 + 2,
            Instruction::Insert(data) => MAX_DIGITS + 1 + data.len(),
        }
    })
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Apply `delta` to `source`, reconstructing the target.
///
/// Fails with a [`DeltaError`] if the delta is malformed, references bytes
/// outside `source`, or does not reproduce its own checksum.
pub fn apply(source: &[u8], delta: &[u8]) -> Result<Vec<u8>, DeltaError> {
    apply_with_options(source, delta, &ApplyOptions::default())
}

/// Apply with custom options.
pub fn apply_with_options(
    source: &[u8],
    delta: &[u8],
    opts: &ApplyOptions,
) -> Result<Vec<u8>, DeltaError> {
    let output = decoder::decode_memory(source, delta, opts.verify_checksum)?;
    log::debug!(
        "apply: source {} bytes, delta {} bytes -> output {} bytes",
        source.len(),
        delta.len(),
        output.len()
    );
    Ok(output)
}

// ---------------------------------------------------------------------------
// Size query
// ---------------------------------------------------------------------------

/// Declared output size of `delta`, reading only the header.
pub fn try_output_size(delta: &[u8]) -> Result<usize, DeltaError> {
    decoder::read_header(delta).map(|(size, _)| size)
}

/// Declared output size of `delta`, or `-1` if the header cannot be parsed.
pub fn output_size(delta: &[u8]) -> i64 {
    match try_output_size(delta) {
        Ok(size) => i64::try_from(size).unwrap_or(-1),
        Err(_) => -1,
    }
}

// ---------------------------------------------------------------------------
// Batch helpers
// ---------------------------------------------------------------------------

/// Create one delta per `(source, target)` pair.
///
/// With the `parallel` feature the pairs are encoded on the rayon pool.
pub fn create_batch(pairs: &[(&[u8], &[u8])], opts: &CreateOptions) -> Vec<Vec<u8>> {
    #[cfg(feature = "parallel")]
    {
        pairs
            .par_iter()
            .map(|(source, target)| create_with_options(source, target, opts))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        pairs
            .iter()
            .map(|(source, target)| create_with_options(source, target, opts))
            .collect()
    }
}

/// Apply one delta per `(source, delta)` pair; each pair fails independently.
///
/// With the `parallel` feature the pairs are decoded on the rayon pool.
pub fn apply_batch(
    pairs: &[(&[u8], &[u8])],
    opts: &ApplyOptions,
) -> Vec<Result<Vec<u8>, DeltaError>> {
    #[cfg(feature = "parallel")]
    {
        pairs
            .par_iter()
            .map(|(source, delta)| apply_with_options(source, delta, opts))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        pairs
            .iter()
            .map(|(source, delta)| apply_with_options(source, delta, opts))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
