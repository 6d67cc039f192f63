// Fossil delta encoder: instruction serialization.
//
// Takes a sequence of COPY/INSERT instructions and produces the textual
// delta:
//
//   size "\n" (len "@" offset "\n" | len ":" bytes)* checksum ";"
//
// Match-finding lives in `hash::matching`; this module is concerned only
// with the wire format.

use super::digits;
use super::instruction::{DeltaStream, Instruction};

// ---------------------------------------------------------------------------
// Delta writer
// ---------------------------------------------------------------------------

/// Accumulates encoded instructions for one delta.
///
/// The checksum terminator is written by [`DeltaWriter::finish`], which
/// consumes the writer, so nothing can follow it.
pub struct DeltaWriter {
    out: Vec<u8>,
    /// Declared output size (written in the header).
    output_size: usize,
    /// Output bytes described so far.
    produced: usize,
}

impl DeltaWriter {
    /// Start a delta for an output of `output_size` bytes.
    pub fn new(output_size: usize) -> Self {
        Self::with_capacity(output_size, 0)
    }

    /// Start a delta with a capacity hint for the encoded bytes.
    pub fn with_capacity(output_size: usize, capacity: usize) -> Self {
        let mut out = Vec::with_capacity(capacity.max(digits::MAX_DIGITS * 2 + 2));
        digits::push_usize(&mut out, output_size);
        out.push(b'\n');
        Self {
            out,
            output_size,
            produced: 0,
        }
    }

    /// Append a COPY of `len` source bytes starting at `offset`.
    pub fn copy(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        digits::push_usize(&mut self.out, len);
        self.out.push(b'@');
        digits::push_usize(&mut self.out, offset);
        self.out.push(b'\n');
        self.produced += len;
    }

    /// Append an INSERT of literal bytes.
    pub fn insert(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        digits::push_usize(&mut self.out, data.len());
        self.out.push(b':');
        self.out.extend_from_slice(data);
        self.produced += data.len();
    }

    /// Append any instruction.
    pub fn push(&mut self, inst: &Instruction<'_>) {
        match *inst {
            Instruction::Copy { offset, len } => self.copy(offset, len),
            Instruction::Insert(data) => self.insert(data),
        }
    }

    /// Output bytes described by the instructions written so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Encoded bytes written so far (header included).
    pub fn encoded_len(&self) -> usize {
        self.out.len()
    }

    /// Write the checksum terminator and return the encoded delta.
    pub fn finish(self, checksum: u32) -> Vec<u8> {
        debug_assert_eq!(
            self.produced, self.output_size,
            "instructions do not cover the declared output size"
        );
        self.terminate(u64::from(checksum))
    }

    fn terminate(mut self, checksum: u64) -> Vec<u8> {
        digits::push_u64(&mut self.out, checksum);
        self.out.push(b';');
        self.out
    }
}

/// Serialize a whole stream.
pub fn encode_stream(stream: &DeltaStream<'_>) -> Vec<u8> {
    let mut writer = DeltaWriter::new(stream.output_size);
    for inst in &stream.instructions {
        writer.push(inst);
    }
    writer.terminate(stream.checksum)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
