// Delta instruction model.
//
// A delta is a declared output size, an ordered list of COPY/INSERT
// instructions, and a trailing checksum of the whole output.  The
// checksum is kept out of `Instruction` so that it can only ever appear
// once, at the end, as a field of `DeltaStream`.

use std::fmt;

/// One step of output reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Append `len` bytes of the source starting at `offset`.
    Copy { offset: usize, len: usize },
    /// Append the literal bytes verbatim.
    Insert(&'a [u8]),
}

impl Instruction<'_> {
    /// Number of output bytes this instruction produces.
    #[inline]
    pub fn output_len(&self) -> usize {
        match self {
            Instruction::Copy { len, .. } => *len,
            Instruction::Insert(data) => data.len(),
        }
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Copy { offset, len } => write!(f, "COPY   {len:>10} @ {offset}"),
            Instruction::Insert(data) => write!(f, "INSERT {:>10}", data.len()),
        }
    }
}

/// A fully parsed delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaStream<'a> {
    /// Declared size of the reconstructed output.
    pub output_size: usize,
    /// Instructions in output order.
    pub instructions: Vec<Instruction<'a>>,
    /// Declared checksum of the reconstructed output.
    ///
    /// Held at full digit-run width: a value above `u32::MAX` parses but can
    /// never match a computed checksum.
    pub checksum: u64,
}

impl DeltaStream<'_> {
    /// Sum of the bytes produced by all instructions.
    ///
    /// Equals `output_size` for every well-formed delta.
    pub fn produced_len(&self) -> usize {
        self.instructions
            .iter()
            .fold(0usize, |acc, i| acc.saturating_add(i.output_len()))
    }

    /// Summary counters for this stream.
    pub fn stats(&self) -> DeltaStats {
        let mut stats = DeltaStats {
            output_size: self.output_size,
            ..Default::default()
        };
        for inst in &self.instructions {
            stats.record(inst);
        }
        stats
    }
}

/// Instruction counters for a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaStats {
    pub output_size: usize,
    pub copies: usize,
    pub inserts: usize,
    pub copied_bytes: usize,
    pub inserted_bytes: usize,
}

impl DeltaStats {
    /// Account for one instruction.
    pub fn record(&mut self, inst: &Instruction<'_>) {
        match inst {
            Instruction::Copy { len, .. } => {
                self.copies += 1;
                self.copied_bytes += len;
            }
            Instruction::Insert(data) => {
                self.inserts += 1;
                self.inserted_bytes += data.len();
            }
        }
    }
}
