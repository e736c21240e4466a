use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::archive::{check_payload, stored_payload};
use crate::error::StorageError;
use crate::header::{Compression, StorageHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteCompression {
    #[default]
    None,
    Zstd {
        level: i32,
    },
    /// Zstd (default level) once the archived payload reaches `threshold` bytes,
    /// uncompressed below it.
    Auto { threshold: u64 },
}

impl WriteCompression {
    /// The zstd level to use for a payload of `len` bytes, or `None` to store
    /// it as is.
    fn level_for(self, len: u64) -> Option<i32> {
        match self {
            WriteCompression::None => None,
            WriteCompression::Zstd { level } => Some(level),
            WriteCompression::Auto { threshold } => (len >= threshold).then_some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteArchiveOptions {
    pub compression: WriteCompression,
    /// Read the written file back before it replaces `path` and check it the
    /// way a reader would.
    pub validate_after_write: bool,
}

/// Serializes `value` and replaces `path` with the new catalog file.
///
/// The file is written next to `path` and renamed over it, so readers that
/// mapped the previous file keep seeing the old contents and a failed write
/// leaves `path` untouched.
pub fn write_archive<T>(
    path: &Path,
    format_version: u32,
    value: &T,
    options: WriteArchiveOptions,
) -> Result<(), StorageError>
where
    T: rkyv::Archive + rkyv::Serialize<rkyv::ser::serializers::AllocSerializer<256>>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let archived =
        rkyv::to_bytes::<_, 256>(value).map_err(|e| StorageError::Validation(e.to_string()))?;
    let uncompressed_len = archived.len() as u64;

    let (compression, stored) = match options.compression.level_for(uncompressed_len) {
        None => (Compression::None, Cow::Borrowed(archived.as_slice())),
        Some(level) => {
            let compressed = zstd::bulk::compress(&archived, level)
                .map_err(|e| StorageError::Compression(e.to_string()))?;
            (Compression::Zstd, Cow::Owned(compressed))
        }
    };
    let header = StorageHeader::for_target(
        format_version,
        compression,
        stored.len() as u64,
        uncompressed_len,
        crate::content_hash(&archived),
    );

    let mut prefix = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "catalog path has no file name"))?
        .to_os_string();
    prefix.push(".");
    // Dropping the temp file on an early return removes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(&header.encode())?;
    tmp.write_all(&stored)?;
    tmp.as_file().sync_all()?;

    if options.validate_after_write {
        read_back(tmp.path(), &header)?;
    }
    tmp.persist(path).map_err(|err| StorageError::Io(err.error))?;

    tracing::debug!(
        target = "apicat.storage",
        path = %path.display(),
        format_version,
        compression = ?compression,
        stored_len = header.payload_len,
        uncompressed_len,
        "wrote catalog"
    );
    Ok(())
}

fn read_back(path: &Path, expected: &StorageHeader) -> Result<(), StorageError> {
    let bytes = fs::read(path)?;
    let (header, range) = StorageHeader::read_frame(&bytes, expected.format_version)?;
    if &header != expected {
        return Err(StorageError::InvalidHeader("header changed on disk"));
    }
    let payload = stored_payload(&bytes[range], &header)?;
    check_payload(&header, &payload)
}
