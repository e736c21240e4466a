use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use apicat_core::Endian;

use crate::error::StorageError;

/// Size of the fixed header that precedes the catalog payload.
pub const HEADER_LEN: usize = 64;

const MAGIC: &[u8; 8] = b"APICATLG";
const HEADER_VERSION: u32 = 2;

/// Upper bound for a catalog payload (after decompression).
pub const MAX_PAYLOAD_LEN_BYTES: u64 = 8 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Compression {
    None = 0,
    Zstd = 1,
}

impl Compression {
    fn from_u8(value: u8) -> Result<Self, StorageError> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Zstd),
            other => Err(StorageError::UnsupportedCompression(other)),
        }
    }
}

/// Fixed-size little-endian header of a catalog file.
///
/// ```text
///  0..8   magic "APICATLG"
///  8..12  header version
/// 12      endian
/// 13      pointer width (bytes)
/// 14      compression
/// 15      reserved
/// 16..20  catalog format version
/// 20..24  reserved
/// 24..32  payload length (as stored)
/// 32..40  payload length (uncompressed)
/// 40..48  content hash (blake3 prefix of the uncompressed payload)
/// 48..64  reserved
/// ```
///
/// The payload always starts right after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHeader {
    pub format_version: u32,
    pub endian: Endian,
    pub pointer_width: u8,
    pub compression: Compression,
    pub payload_len: u64,
    pub uncompressed_len: u64,
    pub content_hash: u64,
}

impl StorageHeader {
    /// Header for a payload written on the current target.
    pub fn for_target(
        format_version: u32,
        compression: Compression,
        payload_len: u64,
        uncompressed_len: u64,
        content_hash: u64,
    ) -> Self {
        Self {
            format_version,
            endian: apicat_core::target_endian(),
            pointer_width: apicat_core::target_pointer_width(),
            compression,
            payload_len,
            uncompressed_len,
            content_hash,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(MAGIC);
        LittleEndian::write_u32(&mut out[8..12], HEADER_VERSION);
        out[12] = self.endian.as_u8();
        out[13] = self.pointer_width;
        out[14] = self.compression as u8;
        LittleEndian::write_u32(&mut out[16..20], self.format_version);
        LittleEndian::write_u64(&mut out[24..32], self.payload_len);
        LittleEndian::write_u64(&mut out[32..40], self.uncompressed_len);
        LittleEndian::write_u64(&mut out[40..48], self.content_hash);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < HEADER_LEN {
            return Err(StorageError::Truncated {
                expected: HEADER_LEN,
                found: bytes.len(),
            });
        }
        if &bytes[0..8] != MAGIC {
            return Err(StorageError::InvalidHeader("not an apicat catalog"));
        }
        if LittleEndian::read_u32(&bytes[8..12]) != HEADER_VERSION {
            return Err(StorageError::InvalidHeader("unsupported header version"));
        }

        let endian =
            Endian::from_u8(bytes[12]).ok_or(StorageError::InvalidHeader("unknown endian tag"))?;
        Ok(Self {
            format_version: LittleEndian::read_u32(&bytes[16..20]),
            endian,
            pointer_width: bytes[13],
            compression: Compression::from_u8(bytes[14])?,
            payload_len: LittleEndian::read_u64(&bytes[24..32]),
            uncompressed_len: LittleEndian::read_u64(&bytes[32..40]),
            content_hash: LittleEndian::read_u64(&bytes[40..48]),
        })
    }

    /// Decodes the header at the start of `file` and checks that this build can
    /// read the catalog behind it. Returns the header and the byte range of the
    /// stored payload inside `file`.
    pub fn read_frame(
        file: &[u8],
        format_version: u32,
    ) -> Result<(Self, Range<usize>), StorageError> {
        let header = Self::decode(file)?;

        if header.format_version != format_version {
            return Err(StorageError::WrongFormat {
                expected: format_version,
                found: header.format_version,
            });
        }
        let endian = apicat_core::target_endian();
        if header.endian != endian {
            return Err(StorageError::WrongEndian {
                expected: endian,
                found: header.endian,
            });
        }
        let pointer_width = apicat_core::target_pointer_width();
        if header.pointer_width != pointer_width {
            return Err(StorageError::WrongPointerWidth {
                expected: pointer_width,
                found: header.pointer_width,
            });
        }
        if header.uncompressed_len > MAX_PAYLOAD_LEN_BYTES {
            return Err(StorageError::OversizedPayload {
                payload_len: header.uncompressed_len,
            });
        }

        let end = usize::try_from(header.payload_len)
            .ok()
            .and_then(|len| HEADER_LEN.checked_add(len))
            .ok_or(StorageError::OversizedPayload {
                payload_len: header.payload_len,
            })?;
        if file.len() < end {
            return Err(StorageError::Truncated {
                expected: end,
                found: file.len(),
            });
        }
        Ok((header, HEADER_LEN..end))
    }
}
