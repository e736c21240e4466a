use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A stable 128-bit content-derived identifier.
///
/// Identifiers are the first 16 bytes of a SHA-256 digest, so the same input
/// bytes produce the same id on every machine and in every indexing run. They
/// identify APIs (by documentation id), assemblies (by their sorted API
/// surface) and markup (by fingerprint).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CatalogId([u8; 16]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("expected 32 hex digits, found {found}")]
    InvalidLength { found: usize },
    #[error("invalid hex digit in identifier")]
    InvalidHex,
}

impl CatalogId {
    pub const LEN: usize = 16;

    pub const NIL: CatalogId = CatalogId([0; 16]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Reads an id from the first 16 bytes of `bytes`.
    ///
    /// Panics if `bytes` is shorter than [`CatalogId::LEN`].
    pub fn read_from(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&bytes[..Self::LEN]);
        Self(raw)
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0; 16]
    }

    /// Hashes an arbitrary byte sequence into an id.
    pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let mut hasher = IdHasher::new();
        hasher.update(bytes.as_ref());
        hasher.finish()
    }

    /// Identity of one API symbol, derived from its documentation id.
    pub fn for_documentation_id(documentation_id: &str) -> Self {
        Self::hash_bytes(documentation_id.as_bytes())
    }

    /// Identity of an assembly's public surface.
    ///
    /// Member order is irrelevant: ids are sorted ordinally (and duplicates
    /// collapsed) before hashing, one id per line.
    pub fn for_api_set<I, S>(documentation_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids: Vec<S> = documentation_ids.into_iter().collect();
        ids.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        ids.dedup_by(|a, b| a.as_ref() == b.as_ref());

        let mut hasher = IdHasher::new();
        for id in &ids {
            hasher.update(id.as_ref().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finish()
    }

    /// Parses the GUID-style text form. Dashes and surrounding braces are optional.
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let trimmed = text.trim();
        let trimmed = trimmed
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(trimmed);
        let digits: String = trimmed.chars().filter(|c| *c != '-').collect();
        if digits.len() != 32 {
            return Err(IdParseError::InvalidLength {
                found: digits.len(),
            });
        }

        let mut raw = [0u8; 16];
        hex::decode_to_slice(&digits, &mut raw).map_err(|_| IdParseError::InvalidHex)?;
        Ok(Self(raw))
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

impl fmt::Debug for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CatalogId({self})")
    }
}

impl FromStr for CatalogId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CatalogId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Streaming builder for [`CatalogId`] values.
#[derive(Clone, Default)]
pub struct IdHasher {
    inner: Sha256,
}

impl IdHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finish(self) -> CatalogId {
        let digest = self.inner.finalize();
        CatalogId::read_from(&digest)
    }
}
