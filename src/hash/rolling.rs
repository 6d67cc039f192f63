// Block checksum and rolling update.
//
// A 16-byte window is split into four interleaved lanes: lane k holds the
// bytes at window positions k, k+4, k+8, k+12.  Each lane is summed into
// its own accumulator and the four sums are packed as
//
//   s3 + (s2 << 8) + (s1 << 16) + (s0 << 24)      (wrapping u32)
//
// The same function over a whole buffer (all 4-byte groups, then 1-3 tail
// bytes folded into the high bytes) is the output checksum carried by the
// `;` terminator of a delta.
//
// Lanes are relative to the window start, so advancing by one byte rotates
// them: [s1, s2, s3, s0 - out + in].  On the packed value that is
//
//   next = (prev << 8) + s0 - out + in
//
// which needs only the outgoing lane sum besides the two bytes.

use super::config::BLOCK_SIZE;

/// Number of interleaved lanes.
pub const LANES: usize = 4;

/// Pack four lane sums into one checksum word.
#[inline(always)]
pub fn pack(lanes: &[u32; LANES]) -> u32 {
    lanes[3]
        .wrapping_add(lanes[2] << 8)
        .wrapping_add(lanes[1] << 16)
        .wrapping_add(lanes[0] << 24)
}

/// Lane sums over the first `BLOCK_SIZE` bytes of `window`.
#[inline]
fn lane_sums(window: &[u8]) -> [u32; LANES] {
    debug_assert!(window.len() >= BLOCK_SIZE);
    let mut lanes = [0u32; LANES];
    for group in window[..BLOCK_SIZE].chunks_exact(LANES) {
        for (lane, &b) in lanes.iter_mut().zip(group) {
            *lane += u32::from(b);
        }
    }
    lanes
}

/// Checksum of one 16-byte block (the first `BLOCK_SIZE` bytes of `window`).
#[inline]
pub fn block_checksum(window: &[u8]) -> u32 {
    pack(&lane_sums(window))
}

/// Checksum of an entire buffer.
pub fn checksum(data: &[u8]) -> u32 {
    let mut lanes = [0u32; LANES];
    let mut groups = data.chunks_exact(LANES);
    for group in &mut groups {
        for (lane, &b) in lanes.iter_mut().zip(group) {
            *lane = lane.wrapping_add(u32::from(b));
        }
    }
    let mut sum = pack(&lanes);
    for (i, &b) in groups.remainder().iter().enumerate() {
        sum = sum.wrapping_add(u32::from(b) << (24 - 8 * i));
    }
    sum
}

/// Slide a packed window checksum forward by one byte.
///
/// `lane0` is the sum of the outgoing window's first lane.
#[inline(always)]
pub fn update(prev: u32, lane0: u32, outgoing: u8, incoming: u8) -> u32 {
    (prev << 8)
        .wrapping_add(lane0)
        .wrapping_sub(u32::from(outgoing))
        .wrapping_add(u32::from(incoming))
}

// ---------------------------------------------------------------------------
// Rolling state
// ---------------------------------------------------------------------------

/// Checksum of a 16-byte window that can advance one byte at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingChecksum {
    lanes: [u32; LANES],
    value: u32,
}

impl RollingChecksum {
    /// Start at the window `data[..BLOCK_SIZE]`.
    pub fn new(data: &[u8]) -> Self {
        let lanes = lane_sums(data);
        Self {
            lanes,
            value: pack(&lanes),
        }
    }

    /// Checksum of the current window.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Drop `outgoing` (the window's first byte) and append `incoming`.
    #[inline(always)]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> u32 {
        let [l0, l1, l2, l3] = self.lanes;
        self.value = update(self.value, l0, outgoing, incoming);
        self.lanes = [
            l1,
            l2,
            l3,
            l0.wrapping_sub(u32::from(outgoing))
                .wrapping_add(u32::from(incoming)),
        ];
        debug_assert_eq!(self.value, pack(&self.lanes));
        self.value
    }
}

// ---------------------------------------------------------------------------
// Match extension
// ---------------------------------------------------------------------------

/// Length of the common prefix of `s1` and `s2`, capped at `n`.
pub fn forward_match(s1: &[u8], s2: &[u8], n: usize) -> usize {
    let n = n.min(s1.len()).min(s2.len());
    let (a, b) = (&s1[..n], &s2[..n]);
    let mut i = 0;

    // Compare 8 bytes at a time.
    for (ca, cb) in a.chunks_exact(8).zip(b.chunks_exact(8)) {
        let xa = u64::from_le_bytes(ca.try_into().unwrap_or([0; 8]));
        let xb = u64::from_le_bytes(cb.try_into().unwrap_or([0; 8]));
        let xor = xa ^ xb;
        if xor != 0 {
            return i + (xor.trailing_zeros() / 8) as usize;
        }
        i += 8;
    }

    // Tail: byte by byte.
    while i < n && a[i] == b[i] {
        i += 1;
    }
    i
}

/// Length of the common suffix of `s1` and `s2`, capped at `n`.
pub fn backward_match(s1: &[u8], s2: &[u8], n: usize) -> usize {
    let n = n.min(s1.len()).min(s2.len());
    let (a, b) = (&s1[s1.len() - n..], &s2[s2.len() - n..]);
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
