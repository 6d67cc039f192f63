// File-level I/O helpers for delta creation/application.
//
// Provides `create_file()` / `apply_file()` for paths and
// `create_stream()` / `apply_stream()` for any reader/writer pair.  Inputs
// are read fully into memory; the codec itself only ever sees byte
// buffers.  Optionally computes SHA-256 checksums (feature-gated behind
// `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::engine::{self, ApplyOptions, CreateOptions};
use crate::format::decoder::DeltaError;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `create_file()` / `create_stream()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStats {
    /// Source size in bytes.
    pub source_size: u64,
    /// Target size in bytes.
    pub target_size: u64,
    /// Delta output size in bytes.
    pub delta_size: u64,
    /// SHA-256 of the source (if `file-io` feature is enabled).
    pub source_sha256: Option<[u8; 32]>,
    /// SHA-256 of the target (if `file-io` feature is enabled).
    pub target_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `apply_file()` / `apply_stream()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyStats {
    /// Source size in bytes.
    pub source_size: u64,
    /// Delta size in bytes.
    pub delta_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The delta could not be applied.
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

fn read_all<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    BufReader::with_capacity(BUF_SIZE, reader).read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_all<W: Write>(writer: W, data: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(BUF_SIZE, writer);
    writer.write_all(data)?;
    writer.flush()
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

/// Create a delta from `source` to `target`, writing it to `delta`.
pub fn create_stream<S: Read, T: Read, W: Write>(
    source: S,
    target: T,
    delta: W,
    opts: &CreateOptions,
) -> Result<CreateStats, IoError> {
    let source = read_all(source)?;
    let target = read_all(target)?;

    let encoded = engine::create_with_options(&source, &target, opts);
    write_all(delta, &encoded)?;

    Ok(CreateStats {
        source_size: source.len() as u64,
        target_size: target.len() as u64,
        delta_size: encoded.len() as u64,
        source_sha256: sha256(&source),
        target_sha256: sha256(&target),
    })
}

/// Create a delta between a source file and target file, writing to `delta_path`.
///
/// Both inputs are read fully into memory. The output file is only created
/// once the delta has been computed.
pub fn create_file(
    source_path: &Path,
    target_path: &Path,
    delta_path: &Path,
    opts: &CreateOptions,
) -> Result<CreateStats, IoError> {
    let source = File::open(source_path)?;
    let target = File::open(target_path)?;
    let mut delta = Vec::new();
    let stats = create_stream(source, target, &mut delta, opts)?;
    write_all(File::create(delta_path)?, &delta)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Apply the delta read from `delta` to `source`, writing the result to `output`.
///
/// Nothing is written unless the delta applies cleanly.
pub fn apply_stream<S: Read, D: Read, W: Write>(
    source: S,
    delta: D,
    output: W,
    opts: &ApplyOptions,
) -> Result<ApplyStats, IoError> {
    let source = read_all(source)?;
    let delta = read_all(delta)?;

    let decoded = engine::apply_with_options(&source, &delta, opts)?;
    write_all(output, &decoded)?;

    Ok(ApplyStats {
        source_size: source.len() as u64,
        delta_size: delta.len() as u64,
        output_size: decoded.len() as u64,
        output_sha256: sha256(&decoded),
    })
}

/// Apply a delta file to a source file, writing to `output_path`.
///
/// The output file is not created when the delta fails to apply.
pub fn apply_file(
    source_path: &Path,
    delta_path: &Path,
    output_path: &Path,
    opts: &ApplyOptions,
) -> Result<ApplyStats, IoError> {
    let source = File::open(source_path)?;
    let delta = File::open(delta_path)?;
    let mut output = Vec::new();
    let stats = apply_stream(source, delta, &mut output, opts)?;
    write_all(File::create(output_path)?, &output)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_temp_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn create_apply_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let source_data = b"The quick brown fox jumps over the lazy dog. 1234567890";
        let target_data = b"The quick brown cat sits on the lazy mat. 1234567890!!!";

        let source_path = write_temp_file(&dir, "source.bin", source_data);
        let target_path = write_temp_file(&dir, "target.bin", target_data);
        let delta_path = dir.path().join("delta.fossil");
        let output_path = dir.path().join("output.bin");

        let create_stats = create_file(
            &source_path,
            &target_path,
            &delta_path,
            &CreateOptions::default(),
        )
        .unwrap();

        assert_eq!(create_stats.source_size, source_data.len() as u64);
        assert_eq!(create_stats.target_size, target_data.len() as u64);
        assert_eq!(
            create_stats.delta_size,
            std::fs::metadata(&delta_path).unwrap().len()
        );

        let apply_stats =
            apply_file(&source_path, &delta_path, &output_path, &ApplyOptions::default())
                .unwrap();
        assert_eq!(apply_stats.output_size, target_data.len() as u64);
        assert_eq!(std::fs::read(&output_path).unwrap(), target_data);
    }

    #[test]
    fn create_writes_fixture_bytes() {
        let dir = TempDir::new().unwrap();
        let source_path = write_temp_file(&dir, "source.txt", b"Test");
        let target_path = write_temp_file(&dir, "target.txt", b"Test String");
        let delta_path = dir.path().join("delta");

        create_file(
            &source_path,
            &target_path,
            &delta_path,
            &CreateOptions::default(),
        )
        .unwrap();
        assert_eq!(std::fs::read(&delta_path).unwrap(), b"B\nB:Test String3U9pwb;");
    }

    #[test]
    fn bad_delta_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let source_path = write_temp_file(&dir, "source.bin", b"source");
        let delta_path = write_temp_file(&dir, "delta", b"not a delta");
        let output_path = dir.path().join("output.bin");

        let err = apply_file(&source_path, &delta_path, &output_path, &ApplyOptions::default())
            .unwrap_err();
        assert!(matches!(err, IoError::Delta(DeltaError::MalformedHeader)));
        assert!(!output_path.exists());
    }

    #[test]
    fn missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let target_path = write_temp_file(&dir, "target.bin", b"target");
        let err = create_file(
            &dir.path().join("missing"),
            &target_path,
            &dir.path().join("delta"),
            &CreateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn stream_roundtrip_in_memory() {
        let source = b"shared prefix shared prefix shared prefix / old tail".to_vec();
        let target = b"shared prefix shared prefix shared prefix / new tail!".to_vec();

        let mut delta = Vec::new();
        let stats = create_stream(
            source.as_slice(),
            target.as_slice(),
            &mut delta,
            &CreateOptions::default(),
        )
        .unwrap();
        assert_eq!(stats.delta_size, delta.len() as u64);

        let mut output = Vec::new();
        apply_stream(
            source.as_slice(),
            delta.as_slice(),
            &mut output,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(output, target);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_checksums_computed() {
        let dir = TempDir::new().unwrap();
        let source_path = write_temp_file(&dir, "sha_source.bin", b"source for checksum test");
        let target_path = write_temp_file(&dir, "sha_target.bin", b"target for checksum test");
        let delta_path = dir.path().join("sha_delta");
        let output_path = dir.path().join("sha_output.bin");

        let create_stats = create_file(
            &source_path,
            &target_path,
            &delta_path,
            &CreateOptions::default(),
        )
        .unwrap();
        assert!(create_stats.source_sha256.is_some());
        assert_ne!(create_stats.source_sha256, create_stats.target_sha256);

        let apply_stats =
            apply_file(&source_path, &delta_path, &output_path, &ApplyOptions::default())
                .unwrap();
        assert_eq!(apply_stats.output_sha256, create_stats.target_sha256);
    }

    #[test]
    fn large_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let source_data: Vec<u8> = (0..=255u8).cycle().take(1 << 20).collect();
        let mut target_data = source_data.clone();
        for i in (0..target_data.len()).step_by(4096) {
            target_data[i] = target_data[i].wrapping_add(1);
        }

        let source_path = write_temp_file(&dir, "large_source.bin", &source_data);
        let target_path = write_temp_file(&dir, "large_target.bin", &target_data);
        let delta_path = dir.path().join("large_delta");
        let output_path = dir.path().join("large_output.bin");

        let create_stats = create_file(
            &source_path,
            &target_path,
            &delta_path,
            &CreateOptions::default(),
        )
        .unwrap();
        assert!(
            create_stats.delta_size < create_stats.target_size / 10,
            "delta should be much smaller than target"
        );

        let apply_stats =
            apply_file(&source_path, &delta_path, &output_path, &ApplyOptions::default())
                .unwrap();
        assert_eq!(apply_stats.output_size, target_data.len() as u64);
        assert_eq!(std::fs::read(&output_path).unwrap(), target_data);
    }
}
