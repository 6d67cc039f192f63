// Block matching algorithm for delta construction.
//
// Greedy single pass over the target:
//   1. Roll a 16-byte window checksum along the target
//   2. Look up source candidates in the block index
//   3. Verify each candidate on the full window, then extend forward and
//      backward into the pending literal
//   4. Keep the longest worthwhile match (ties: lowest source offset),
//      flush the pending literal and emit a COPY; otherwise slide one byte

use super::config::{BLOCK_SIZE, MatcherConfig};
use super::rolling::{self, RollingChecksum};
use super::table::BlockIndex;
use crate::format::digits;
use crate::format::instruction::Instruction;

// ---------------------------------------------------------------------------
// Match result
// ---------------------------------------------------------------------------

/// A verified run of bytes shared by source and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Position in the target where the match starts.
    pub target_pos: usize,
    /// Position in the source where the match starts.
    pub source_pos: usize,
    /// Length of the match.
    pub length: usize,
}

/// Encoded size of a COPY emitted after `literal_len` pending bytes: the
/// literal's length prefix and `:`, plus `len@offset\n`.
///
/// A match shorter than this is cheaper to carry as literal bytes.
#[inline]
pub fn copy_cost(literal_len: usize, len: usize, offset: usize) -> usize {
    digits::digit_count(literal_len as u64)
        + digits::digit_count(len as u64)
        + digits::digit_count(offset as u64)
        + 3
}

// ---------------------------------------------------------------------------
// Match engine
// ---------------------------------------------------------------------------

/// The delta match engine for one source buffer.
///
/// Indexes the source on construction; [`MatchEngine::find_matches`] can
/// then be run against any number of targets.
pub struct MatchEngine<'s> {
    config: MatcherConfig,
    source: &'s [u8],
    index: BlockIndex,
}

impl<'s> MatchEngine<'s> {
    /// Index `source` with the given matcher profile.
    pub fn new(config: MatcherConfig, source: &'s [u8]) -> Self {
        let index = BlockIndex::build(source, config.granularity);
        log::debug!(
            "indexed {} source blocks ({} buckets, profile {})",
            index.len(),
            index.buckets(),
            config.name
        );
        Self {
            config,
            source,
            index,
        }
    }

    /// The source block index.
    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    /// Cover `target` with COPY/INSERT instructions.
    ///
    /// The instructions produce exactly `target` when applied to the source.
    pub fn find_matches<'t>(&self, target: &'t [u8]) -> Vec<Instruction<'t>> {
        let mut out = Vec::new();

        if self.index.is_empty() || target.len() < BLOCK_SIZE {
            if !target.is_empty() {
                out.push(Instruction::Insert(target));
            }
            return out;
        }

        // Start of the pending literal.
        let mut base = 0usize;
        // Start of the current window.
        let mut pos = 0usize;
        let mut hash = RollingChecksum::new(target);

        loop {
            if let Some(m) = self.best_match(target, base, pos, hash.value()) {
                log::trace!(
                    "match: target {} <- source {} ({} bytes)",
                    m.target_pos,
                    m.source_pos,
                    m.length
                );
                if m.target_pos > base {
                    out.push(Instruction::Insert(&target[base..m.target_pos]));
                }
                out.push(Instruction::Copy {
                    offset: m.source_pos,
                    len: m.length,
                });
                base = m.target_pos + m.length;
                pos = base;
                if pos + BLOCK_SIZE > target.len() {
                    break;
                }
                hash = RollingChecksum::new(&target[pos..]);
                continue;
            }

            if pos + BLOCK_SIZE >= target.len() {
                break;
            }
            hash.roll(target[pos], target[pos + BLOCK_SIZE]);
            pos += 1;
        }

        if base < target.len() {
            out.push(Instruction::Insert(&target[base..]));
        }
        out
    }

    /// Best worthwhile match for the window at `pos`, whose pending literal
    /// starts at `base`.
    fn best_match(&self, target: &[u8], base: usize, pos: usize, cksum: u32) -> Option<Match> {
        let window = &target[pos..];
        let pending = &target[base..pos];
        let mut best: Option<Match> = None;

        for src_pos in self.index.lookup(cksum).take(self.config.max_candidates) {
            let forward = rolling::forward_match(&self.source[src_pos..], window, window.len());
            if forward < BLOCK_SIZE {
                // Checksum collision.
                continue;
            }
            let backward =
                rolling::backward_match(&self.source[..src_pos], pending, pending.len());

            let candidate = Match {
                target_pos: pos - backward,
                source_pos: src_pos - backward,
                length: forward + backward,
            };
            let literal_len = candidate.target_pos - base;
            if candidate.length < copy_cost(literal_len, candidate.length, candidate.source_pos) {
                continue;
            }

            let better = match best {
                None => true,
                Some(b) => {
                    candidate.length > b.length
                        || (candidate.length == b.length && candidate.source_pos < b.source_pos)
                }
            };
            if better {
                best = Some(candidate);
                if candidate.length == pending.len() + window.len() {
                    // Covers everything left; later candidates have larger offsets.
                    break;
                }
            }
        }

        best
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
