//! Core shared types for apicat.
//!
//! This crate is intentionally small: stable catalog identifiers, the API kind
//! taxonomy, and the target facts the storage layer records in catalog files.

mod id;
mod kind;

pub use id::{CatalogId, IdHasher, IdParseError};
pub use kind::{Accessibility, ApiKind};

/// Byte order of the machine that wrote (or is reading) a persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub const fn as_u8(self) -> u8 {
        match self {
            Endian::Little => 1,
            Endian::Big => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Endian::Little),
            2 => Some(Endian::Big),
            _ => None,
        }
    }
}

#[inline]
pub const fn target_endian() -> Endian {
    if cfg!(target_endian = "little") {
        Endian::Little
    } else {
        Endian::Big
    }
}

/// Pointer width of the current target, in bytes.
#[inline]
pub const fn target_pointer_width() -> u8 {
    std::mem::size_of::<usize>() as u8
}
