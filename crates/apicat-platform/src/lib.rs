//! Target platform monikers and their compatibility relation.
//!
//! A [`PlatformMoniker`] names a compilation target (`net45`,
//! `netstandard2.0`, `net6.0-windows`). Package assets are grouped by moniker,
//! and [`nearest`] picks the group a given target should compile against.
//! Compatibility is a partial order: [`is_compatible`] answers "can assets for
//! `candidate` be used by `target`", and most pairs of unrelated families are
//! simply incomparable.

mod compat;
mod moniker;
mod version;

pub use compat::{is_compatible, is_known_unsupported, nearest, FrameworkSpecific};
pub use moniker::{
    PlatformMoniker, PlatformParseError, ANY, NET_CORE_APP, NET_FRAMEWORK, NET_PORTABLE,
    NET_STANDARD,
};
pub use version::FrameworkVersion;
