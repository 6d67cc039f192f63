// Fossil delta format.
//
// A delta is a printable header and a list of commands:
//
//   <size> "\n" ( <len> "@" <offset> "\n" | <len> ":" <bytes> )* <checksum> ";"
//
// with every integer written in the base-64 digit alphabet of `digits`.
//
// # Modules
//
// - `digits`      - Base-64 integer text (encode, decode, digit counts)
// - `instruction` - COPY/INSERT commands and parsed delta streams
// - `encoder`     - Command emission into a delta buffer
// - `decoder`     - Command parsing and output reconstruction

pub mod decoder;
pub mod digits;
pub mod encoder;
pub mod instruction;

// Re-export key types for convenience.
pub use decoder::{DeltaError, InstructionIterator, decode_memory, parse, read_header};
pub use digits::DigitError;
pub use encoder::{DeltaWriter, encode_stream};
pub use instruction::{DeltaStats, DeltaStream, Instruction};
