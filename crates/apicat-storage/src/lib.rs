//! The on-disk container for an apicat catalog.
//!
//! A catalog file is a 64-byte little-endian [`StorageHeader`] followed by
//! one `rkyv` archived root, optionally zstd-compressed. The header records
//! the catalog format version, the endianness and pointer width of the
//! writer (`rkyv` archives are not portable across either) and a content
//! hash of the uncompressed payload. [`ArchiveFile::open`] rejects anything
//! this build cannot read before handing out the archived root.

mod archive;
mod error;
mod header;
mod write;

pub use archive::{ArchiveFile, CheckableArchived};
pub use error::StorageError;
pub use header::{Compression, StorageHeader, HEADER_LEN, MAX_PAYLOAD_LEN_BYTES};
pub use write::{write_archive, WriteArchiveOptions, WriteCompression};

pub(crate) fn content_hash(payload: &[u8]) -> u64 {
    let hash = blake3::hash(payload);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}
