use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};

use crate::error::ResolveError;

/// A package version: one to four numeric parts plus optional prerelease and
/// build labels (`1.0`, `4.5.1.2`, `2.0.0-beta.1+sha.abc`).
///
/// The first three parts and the labels are held in a [`semver::Version`];
/// the fourth part is kept alongside. Ordering and equality ignore build
/// metadata.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    version: semver::Version,
    revision: u64,
}

impl PackageVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            version: semver::Version::new(major, minor, patch),
            revision: 0,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidVersion(text.to_string());
        let trimmed = text.trim();

        let (rest, build) = match trimmed.split_once('+') {
            Some((_, "")) => return Err(invalid()),
            Some((rest, build)) => (rest, BuildMetadata::new(build).map_err(|_| invalid())?),
            None => (trimmed, BuildMetadata::EMPTY),
        };
        let (numbers, pre) = match rest.split_once('-') {
            Some((_, "")) => return Err(invalid()),
            Some((numbers, pre)) => (numbers, Prerelease::new(pre).map_err(|_| invalid())?),
            None => (rest, Prerelease::EMPTY),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for part in numbers.split('.') {
            if count == parts.len() || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            parts[count] = part.parse().map_err(|_| invalid())?;
            count += 1;
        }

        let mut version = semver::Version::new(parts[0], parts[1], parts[2]);
        version.pre = pre;
        version.build = build;
        Ok(Self {
            version,
            revision: parts[3],
        })
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    pub fn build_metadata(&self) -> &str {
        self.version.build.as_str()
    }

    /// Canonical text used for lookups and file names: three parts at least,
    /// the fourth only when non-zero, the prerelease label, no build metadata.
    pub fn to_normalized_string(&self) -> String {
        let v = &self.version;
        let mut out = format!("{}.{}.{}", v.major, v.minor, v.patch);
        if self.revision != 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if !v.pre.is_empty() {
            out.push('-');
            out.push_str(v.pre.as_str());
        }
        out
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        (a.major, a.minor, a.patch, self.revision)
            .cmp(&(b.major, b.minor, b.patch, other.revision))
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_normalized_string().hash(state);
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())?;
        if !self.version.build.is_empty() {
            write!(f, "+{}", self.version.build)?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageVersion::parse(s)
    }
}
