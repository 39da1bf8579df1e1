use std::path::{Path, PathBuf};

use bincode::config;
use compio::fs;
use snafu::prelude::*;
use tracing::debug;

use crate::container::{Entry, Fingerprint};
use crate::ext::BestEffortPathExt;

const MAGIC: &[u8; 5] = b"FOLIO";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 8;

/// Single-file package format.
///
/// Layout: `FOLIO`, one version byte, the little-endian MetroHash64 of the
/// body, then the body: a zstd-compressed bincode encoding of the root
/// [`Entry`].
pub struct Archive;

impl Archive {
    pub fn encode(entry: &Entry, compression_level: i32) -> Result<Vec<u8>, ArchiveError> {
        let raw = bincode::encode_to_vec(entry, config::standard()).context(EncodeSnafu)?;
        let body = zstd::encode_all(raw.as_slice(), compression_level).context(CompressSnafu)?;
        let checksum = Fingerprint::of_bytes(&body);
        debug!(
            "Encoded archive: {} raw bytes, {} compressed, checksum {}",
            raw.len(),
            body.len(),
            checksum
        );

        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&checksum.value().to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Entry, ArchiveError> {
        ensure!(bytes.len() >= HEADER_LEN, TruncatedSnafu { len: bytes.len() });
        let (magic, rest) = bytes.split_at(MAGIC.len());
        ensure!(magic == MAGIC, BadMagicSnafu);
        let (version, rest) = rest.split_at(1);
        ensure!(
            version[0] == FORMAT_VERSION,
            UnsupportedVersionSnafu {
                version: version[0]
            }
        );
        let (checksum, body) = rest.split_at(8);
        let mut checksum_bytes = [0u8; 8];
        checksum_bytes.copy_from_slice(checksum);
        let expected = Fingerprint::from_value(u64::from_le_bytes(checksum_bytes));
        let actual = Fingerprint::of_bytes(body);
        ensure!(expected == actual, ChecksumMismatchSnafu { expected, actual });

        let raw = zstd::decode_all(body).context(DecompressSnafu)?;
        let (entry, read) =
            bincode::decode_from_slice::<Entry, _>(&raw, config::standard()).context(DecodeSnafu)?;
        ensure!(
            read == raw.len(),
            TrailingBytesSnafu {
                count: raw.len() - read
            }
        );
        if let Some(name) = entry.find_invalid_name() {
            return InvalidEntryNameSnafu { name }.fail();
        }
        Ok(entry)
    }

    pub async fn read(path: &Path) -> Result<Entry, ArchiveError> {
        debug!("Reading archive {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu { path })?;
        Self::decode(&bytes)
    }

    pub async fn write(
        path: &Path,
        entry: &Entry,
        compression_level: i32,
    ) -> Result<(), ArchiveError> {
        let bytes = Self::encode(entry, compression_level)?;
        debug!(
            "Writing {} byte archive to {}",
            bytes.len(),
            path.best_effort_path_display()
        );
        let res = fs::write(path, bytes).await;
        res.0.context(WriteSnafu { path })?;
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ArchiveError {
    #[snafu(display("Failed to encode the entry tree"))]
    EncodeError {
        source: bincode::error::EncodeError,
    },
    #[snafu(display("Failed to compress the archive body"))]
    CompressError { source: std::io::Error },
    #[snafu(display("Archive is truncated ({} bytes)", len))]
    Truncated { len: usize },
    #[snafu(display("Not a folio archive"))]
    BadMagic,
    #[snafu(display("Unsupported archive version {}", version))]
    UnsupportedVersion { version: u8 },
    #[snafu(display("Archive checksum mismatch: expected {}, found {}", expected, actual))]
    ChecksumMismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },
    #[snafu(display("Failed to decompress the archive body"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Failed to decode the entry tree"))]
    DecodeError {
        source: bincode::error::DecodeError,
    },
    #[snafu(display("Archive body has {} trailing bytes", count))]
    TrailingBytes { count: usize },
    #[snafu(display("Archive entry '{}' is not a valid path component", name))]
    InvalidEntryName { name: String },
    #[snafu(display("Failed to read archive {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write archive {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}
