//! fossil-delta: the Fossil SCM binary delta format in Rust.
//!
//! A delta is a short text: the target size, a list of "copy N bytes from
//! source offset M" and "insert these N literal bytes" commands, and a
//! checksum of the reconstructed target.
//!
//! The crate provides:
//! - The delta codec and its public operations (`engine`)
//! - The wire format: digits, instructions, writer and parser (`format`)
//! - Checksums, source indexing and matching (`hash`)
//! - File- and stream-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! let source = b"Test";
//! let target = b"Test String";
//!
//! let delta = fossil_delta::create(source, target);
//! assert_eq!(delta, b"B\nB:Test String3U9pwb;");
//! assert_eq!(fossil_delta::output_size(&delta), 11);
//!
//! let decoded = fossil_delta::apply(source, &delta).unwrap();
//! assert_eq!(decoded, target);
//! ```

pub mod engine;
pub mod format;
pub mod hash;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;

pub use engine::{
    ApplyOptions, CreateOptions, apply, apply_with_options, create, create_with_options,
    output_size, try_output_size,
};
pub use format::decoder::DeltaError;
