// Fossil delta decoder: instruction parsing and output reconstruction.
//
// Parsing mirrors the encoder: read the size header up to `\n`, then a
// loop of `digits` + dispatch byte:
//   '@'  second digit run (source offset) and a mandatory `\n`  -> COPY
//   ':'  exactly `len` raw bytes                                -> INSERT
//   ';'  the digit run is the output checksum; parsing ends
//
// Performance notes:
//   - INSERT payloads and COPY sources are borrowed slices; nothing is
//     copied until the output buffer is assembled
//   - The output Vec is reserved once, for exactly the declared size

use crate::hash::rolling;

use super::digits::{self, DigitError};
use super::instruction::{DeltaStream, Instruction};

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

/// Why a delta could not be parsed or applied.
///
/// Every variant except [`DeltaError::AllocationFailure`] means the delta is
/// malformed or was not built for the given source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    #[error("malformed delta: size header is not a digit run followed by a newline")]
    MalformedHeader,
    #[error("malformed delta: {reason} at byte {offset}")]
    MalformedInstruction { offset: usize, reason: &'static str },
    #[error(
        "malformed delta: copy of {len} bytes at source offset {offset} exceeds source length {source_len}"
    )]
    OutOfRangeCopy {
        offset: usize,
        len: usize,
        source_len: usize,
    },
    #[error("malformed delta: output size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("malformed delta: checksum mismatch: expected {expected:#010X}, got {actual:#010X}")]
    ChecksumMismatch { expected: u64, actual: u32 },
    #[error("cannot allocate {size} bytes for delta output")]
    AllocationFailure { size: usize },
}

impl DeltaError {
    /// True for every parse/validation failure (the "malformed delta"
    /// category); false only for allocation failure.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::AllocationFailure { .. })
    }

    fn digits(offset: usize, e: DigitError) -> Self {
        let reason = match e {
            DigitError::Empty => "expected a digit",
            DigitError::Overflow => "integer overflow",
        };
        Self::MalformedInstruction { offset, reason }
    }

    fn unterminated(offset: usize) -> Self {
        Self::MalformedInstruction {
            offset,
            reason: "unterminated delta",
        }
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parse the leading size token.
///
/// Returns `(output_size, header_len)`, where `header_len` includes the
/// terminating newline.
pub fn read_header(delta: &[u8]) -> Result<(usize, usize), DeltaError> {
    let (size, n) = digits::read_usize(delta).map_err(|_| DeltaError::MalformedHeader)?;
    match delta.get(n) {
        Some(b'\n') => Ok((size, n + 1)),
        _ => Err(DeltaError::MalformedHeader),
    }
}

// ---------------------------------------------------------------------------
// Instruction iterator
// ---------------------------------------------------------------------------

/// Lazily parses the instructions of a delta.
///
/// Yields `Ok(instruction)` until the `;` terminator is consumed, then
/// `None`; the terminator's checksum is then available from
/// [`InstructionIterator::checksum`].  After the first error the iterator
/// is fused.
pub struct InstructionIterator<'a> {
    delta: &'a [u8],
    pos: usize,
    output_size: usize,
    checksum: Option<u64>,
    failed: bool,
}

impl<'a> InstructionIterator<'a> {
    /// Parse the header and position the iterator on the first instruction.
    pub fn new(delta: &'a [u8]) -> Result<Self, DeltaError> {
        let (output_size, pos) = read_header(delta)?;
        Ok(Self {
            delta,
            pos,
            output_size,
            checksum: None,
            failed: false,
        })
    }

    /// Declared output size from the header.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Declared output checksum, once the terminator has been parsed.
    pub fn checksum(&self) -> Option<u64> {
        self.checksum
    }

    /// Byte offset of the next unparsed byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes following the terminator (empty until it has been parsed).
    pub fn trailing(&self) -> &'a [u8] {
        if self.checksum.is_some() {
            &self.delta[self.pos..]
        } else {
            &[]
        }
    }

    fn read_digits(&mut self) -> Result<u64, DeltaError> {
        let (val, n) =
            digits::read_u64(&self.delta[self.pos..]).map_err(|e| DeltaError::digits(self.pos, e))?;
        self.pos += n;
        Ok(val)
    }

    fn read_usize(&mut self) -> Result<usize, DeltaError> {
        let start = self.pos;
        let val = self.read_digits()?;
        usize::try_from(val).map_err(|_| DeltaError::digits(start, DigitError::Overflow))
    }

    fn next_byte(&mut self) -> Result<u8, DeltaError> {
        let byte = *self
            .delta
            .get(self.pos)
            .ok_or_else(|| DeltaError::unterminated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn next_instruction(&mut self) -> Result<Option<Instruction<'a>>, DeltaError> {
        if self.pos >= self.delta.len() {
            return Err(DeltaError::unterminated(self.pos));
        }
        let start = self.pos;
        let value = self.read_digits()?;
        let cmd_pos = self.pos;

        match self.next_byte()? {
            b'@' => {
                let len = usize::try_from(value)
                    .map_err(|_| DeltaError::digits(start, DigitError::Overflow))?;
                let offset = self.read_usize()?;
                let term_pos = self.pos;
                if self.next_byte()? != b'\n' {
                    return Err(DeltaError::MalformedInstruction {
                        offset: term_pos,
                        reason: "copy command not terminated by a newline",
                    });
                }
                if offset.checked_add(len).is_none() {
                    return Err(DeltaError::MalformedInstruction {
                        offset: start,
                        reason: "copy range overflows",
                    });
                }
                Ok(Some(Instruction::Copy { offset, len }))
            }
            b':' => {
                let len = usize::try_from(value)
                    .map_err(|_| DeltaError::digits(start, DigitError::Overflow))?;
                let available = self.delta.len() - self.pos;
                if len > available {
                    return Err(DeltaError::MalformedInstruction {
                        offset: self.pos,
                        reason: "insert payload truncated",
                    });
                }
                let data = &self.delta[self.pos..self.pos + len];
                self.pos += len;
                Ok(Some(Instruction::Insert(data)))
            }
            b';' => {
                // Compared at full width; a corrupted high digit must not
                // wrap back onto a valid checksum.
                self.checksum = Some(value);
                Ok(None)
            }
            _ => Err(DeltaError::MalformedInstruction {
                offset: cmd_pos,
                reason: "unknown command character",
            }),
        }
    }
}

impl<'a> Iterator for InstructionIterator<'a> {
    type Item = Result<Instruction<'a>, DeltaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.checksum.is_some() {
            return None;
        }
        match self.next_instruction() {
            Ok(Some(inst)) => Some(Ok(inst)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a complete delta without applying it.
pub fn parse(delta: &[u8]) -> Result<DeltaStream<'_>, DeltaError> {
    let mut iter = InstructionIterator::new(delta)?;
    let mut instructions = Vec::new();
    for inst in &mut iter {
        instructions.push(inst?);
    }
    let checksum = iter
        .checksum()
        .ok_or_else(|| DeltaError::unterminated(iter.position()))?;
    Ok(DeltaStream {
        output_size: iter.output_size(),
        instructions,
        checksum,
    })
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Apply `delta` to `source` and return the reconstructed output.
///
/// The declared size is reserved up front; COPY ranges are bounds-checked
/// against `source` before any byte is read, and the produced length is
/// checked against the declared size at every step.
pub fn decode_memory(
    source: &[u8],
    delta: &[u8],
    verify_checksum: bool,
) -> Result<Vec<u8>, DeltaError> {
    let mut iter = InstructionIterator::new(delta)?;
    let expected = iter.output_size();

    let mut output = Vec::new();
    output
        .try_reserve_exact(expected)
        .map_err(|_| DeltaError::AllocationFailure { size: expected })?;

    for inst in &mut iter {
        let inst = inst?;
        let produced = output.len().saturating_add(inst.output_len());
        if produced > expected {
            return Err(DeltaError::SizeMismatch {
                expected,
                actual: produced,
            });
        }
        match inst {
            Instruction::Copy { offset, len } => {
                let bytes = offset
                    .checked_add(len)
                    .and_then(|end| source.get(offset..end))
                    .ok_or(DeltaError::OutOfRangeCopy {
                        offset,
                        len,
                        source_len: source.len(),
                    })?;
                output.extend_from_slice(bytes);
            }
            Instruction::Insert(data) => output.extend_from_slice(data),
        }
    }

    let Some(expected_checksum) = iter.checksum() else {
        return Err(DeltaError::unterminated(iter.position()));
    };

    if output.len() != expected {
        return Err(DeltaError::SizeMismatch {
            expected,
            actual: output.len(),
        });
    }

    if verify_checksum {
        let actual = rolling::checksum(&output);
        if u64::from(actual) != expected_checksum {
            return Err(DeltaError::ChecksumMismatch {
                expected: expected_checksum,
                actual,
            });
        }
    }

    let trailing = iter.trailing();
    if !trailing.is_empty() {
        log::debug!("ignoring {} bytes after delta terminator", trailing.len());
    }

    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
