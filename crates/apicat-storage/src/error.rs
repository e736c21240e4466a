use apicat_core::Endian;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
    #[error("incompatible catalog format: expected version {expected}, found {found}")]
    WrongFormat { expected: u32, found: u32 },
    #[error("catalog written for a {found:?}-endian target, this is {expected:?}-endian")]
    WrongEndian { expected: Endian, found: Endian },
    #[error("catalog written for {found}-byte pointers, this target uses {expected}")]
    WrongPointerWidth { expected: u8, found: u8 },
    #[error("truncated file: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("payload is not {required}-byte aligned (address {got:#x})")]
    Misaligned { required: usize, got: usize },
    #[error("archive validation failed: {0}")]
    Validation(String),
    #[error("zstd: {0}")]
    Compression(String),
    #[error("unsupported compression tag {0}")]
    UnsupportedCompression(u8),
    #[error("payload of {payload_len} bytes exceeds the catalog size limit")]
    OversizedPayload { payload_len: u64 },
    #[error("payload is {found} bytes after decompression, header says {expected}")]
    LengthMismatch { expected: u64, found: u64 },
    #[error("payload hash mismatch: expected {expected:#018x}, found {found:#018x}")]
    HashMismatch { expected: u64, found: u64 },
}
