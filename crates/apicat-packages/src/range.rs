use std::fmt;

use crate::error::ResolveError;
use crate::version::PackageVersion;

/// A dependency version range in interval notation.
///
/// | text | meaning |
/// |---|---|
/// | `1.0` | `>= 1.0` |
/// | `[1.0]` | `== 1.0` |
/// | `[1.0,2.0)` | `>= 1.0, < 2.0` |
/// | `(,3.0]` | `<= 3.0` |
/// | `(1.0,)` | `> 1.0` |
///
/// Closure resolution only looks at the lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionRange {
    min: Option<PackageVersion>,
    min_inclusive: bool,
    max: Option<PackageVersion>,
    max_inclusive: bool,
}

impl VersionRange {
    /// `>= version`.
    pub fn at_least(version: PackageVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// Every version.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidRange(text.to_string());
        let text = text.trim();
        if text.is_empty() || text == "*" {
            return Ok(Self::all());
        }

        let Some(first) = text.chars().next() else {
            return Ok(Self::all());
        };
        if first != '[' && first != '(' {
            return Ok(Self::at_least(PackageVersion::parse(text)?));
        }

        let min_inclusive = first == '[';
        let max_inclusive = match text.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };
        let inner = &text[1..text.len() - 1];

        let bound = |part: &str| -> Result<Option<PackageVersion>, ResolveError> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                PackageVersion::parse(part).map(Some)
            }
        };

        let range = match inner.split_once(',') {
            None => {
                let exact = bound(inner)?.ok_or_else(invalid)?;
                if !(min_inclusive && max_inclusive) {
                    return Err(invalid());
                }
                Self {
                    min: Some(exact.clone()),
                    min_inclusive: true,
                    max: Some(exact),
                    max_inclusive: true,
                }
            }
            Some((low, high)) => Self {
                min: bound(low)?,
                min_inclusive,
                max: bound(high)?,
                max_inclusive,
            },
        };

        if let (Some(min), Some(max)) = (&range.min, &range.max) {
            if min > max || (min == max && !(range.min_inclusive && range.max_inclusive)) {
                return Err(invalid());
            }
        }
        Ok(range)
    }

    /// The declared lower bound, which is the version the closure fetches.
    pub fn min_version(&self) -> Option<&PackageVersion> {
        self.min.as_ref()
    }

    pub fn max_version(&self) -> Option<&PackageVersion> {
        self.max.as_ref()
    }

    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        let above = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above && below
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => f.write_str("*"),
            (Some(min), None) if self.min_inclusive => write!(f, "{}", min.to_normalized_string()),
            (Some(min), Some(max)) if min == max => write!(f, "[{}]", min.to_normalized_string()),
            (min, max) => {
                f.write_str(if self.min_inclusive { "[" } else { "(" })?;
                if let Some(min) = min {
                    f.write_str(&min.to_normalized_string())?;
                }
                f.write_str(", ")?;
                if let Some(max) = max {
                    f.write_str(&max.to_normalized_string())?;
                }
                f.write_str(if self.max_inclusive { "]" } else { ")" })
            }
        }
    }
}
