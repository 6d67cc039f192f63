// Block index: source block checksum -> source offsets.
//
// Bucket heads plus a per-entry `next` chain.  Entries are numbered in
// source order and an entry's offset is `entry * step`, so only the chain
// links and the full checksum are stored per entry.  Entries are inserted
// in reverse so that each chain walks offsets in ascending order.

use super::config::{BLOCK_SIZE, IndexGranularity};
use super::rolling::{self, RollingChecksum};

/// LCG multiplier used to spread checksums over buckets.
pub const HASH_MULT_32: u32 = 1_597_334_677;

/// Chain terminator / empty bucket.
const NONE: usize = usize::MAX;

/// Smallest bucket table (log2).
const MIN_BUCKET_BITS: u32 = 4;

/// Bucket sizing for a given entry count.
#[derive(Clone, Debug)]
struct BucketCfg {
    /// Number of buckets (power of 2).
    size: usize,
    /// `32 - log2(size)`.
    shift: u32,
}

impl BucketCfg {
    fn new(entries: usize) -> Self {
        let bits = entries
            .next_power_of_two()
            .trailing_zeros()
            .clamp(MIN_BUCKET_BITS, 31);
        Self {
            size: 1 << bits,
            shift: 32 - bits,
        }
    }

    #[inline(always)]
    fn bucket(&self, cksum: u32) -> usize {
        (cksum.wrapping_mul(HASH_MULT_32) >> self.shift) as usize
    }
}

/// Hash index over the 16-byte blocks of one source buffer.
///
/// Built once per encode call and read-only afterwards.
pub struct BlockIndex {
    heads: Vec<usize>,
    next: Vec<usize>,
    checksums: Vec<u32>,
    cfg: BucketCfg,
    step: usize,
}

impl BlockIndex {
    /// Index `source` with the given granularity.
    pub fn build(source: &[u8], granularity: IndexGranularity) -> Self {
        let step = granularity.step();
        let entries = if source.len() < BLOCK_SIZE {
            0
        } else {
            (source.len() - BLOCK_SIZE) / step + 1
        };

        let checksums: Vec<u32> = match granularity {
            IndexGranularity::Aligned => source
                .chunks_exact(BLOCK_SIZE)
                .map(rolling::block_checksum)
                .collect(),
            IndexGranularity::EveryOffset if entries > 0 => {
                let mut h = RollingChecksum::new(source);
                let mut sums = Vec::with_capacity(entries);
                sums.push(h.value());
                for pos in 1..entries {
                    sums.push(h.roll(source[pos - 1], source[pos - 1 + BLOCK_SIZE]));
                }
                sums
            }
            IndexGranularity::EveryOffset => Vec::new(),
        };
        debug_assert_eq!(checksums.len(), entries);

        let cfg = BucketCfg::new(entries);
        let mut heads = vec![NONE; cfg.size];
        let mut next = vec![NONE; entries];

        // Reverse insertion: the head of each chain is its lowest offset.
        for entry in (0..entries).rev() {
            let bucket = cfg.bucket(checksums[entry]);
            next[entry] = heads[bucket];
            heads[bucket] = entry;
        }

        Self {
            heads,
            next,
            checksums,
            cfg,
            step,
        }
    }

    /// Source offsets whose block has checksum `cksum`, in ascending order.
    ///
    /// Equal checksums do not imply equal bytes; callers must verify.
    #[inline]
    pub fn lookup(&self, cksum: u32) -> Candidates<'_> {
        let entry = if self.checksums.is_empty() {
            NONE
        } else {
            self.heads[self.cfg.bucket(cksum)]
        };
        Candidates {
            index: self,
            entry,
            cksum,
        }
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.checksums.len()
    }

    /// True if the source was shorter than one block.
    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty()
    }

    /// Bucket count.
    pub fn buckets(&self) -> usize {
        self.cfg.size
    }

    /// Distance between indexed offsets.
    pub fn step(&self) -> usize {
        self.step
    }
}

/// Iterator over the candidate offsets for one checksum.
pub struct Candidates<'a> {
    index: &'a BlockIndex,
    entry: usize,
    cksum: u32,
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.entry != NONE {
            let entry = self.entry;
            self.entry = self.index.next[entry];
            if self.index.checksums[entry] == self.cksum {
                return Some(entry * self.index.step);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
