// Checksums, source indexing and matching for delta construction.
//
// This module provides:
// - The lane-sum checksum, whole-buffer and rolling over a 16-byte window
// - A block index from window checksum to source offsets
// - Greedy block matching with forward/backward extension
// - Matcher profiles (default, thorough)

pub mod config;
pub mod matching;
pub mod rolling;
pub mod table;
