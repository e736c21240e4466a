use std::fmt;

/// Four-part framework version (`major.minor.build.revision`).
///
/// Missing parts are zero, so `4.5` and `4.5.0.0` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameworkVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl FrameworkVersion {
    pub const ZERO: FrameworkVersion = FrameworkVersion::new(0, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: 0,
            revision: 0,
        }
    }

    pub const fn with_build(self, build: u32) -> Self {
        Self { build, ..self }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn parts(&self) -> [u32; 4] {
        [self.major, self.minor, self.build, self.revision]
    }

    fn from_parts(parts: &[u32]) -> Self {
        let at = |i: usize| parts.get(i).copied().unwrap_or(0);
        Self {
            major: at(0),
            minor: at(1),
            build: at(2),
            revision: at(3),
        }
    }

    /// Parses `4.5`, `10.0.19041`, or `v4.6.1`.
    pub fn parse_dotted(text: &str) -> Option<Self> {
        let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
        if text.is_empty() {
            return None;
        }
        let mut parts = Vec::with_capacity(4);
        for part in text.split('.') {
            parts.push(part.parse::<u32>().ok()?);
        }
        (parts.len() <= 4).then(|| Self::from_parts(&parts))
    }

    /// Parses the compact folder form where each digit is one part (`451` is
    /// `4.5.1`).
    pub fn parse_digits(text: &str) -> Option<Self> {
        if text.is_empty() || text.len() > 4 {
            return None;
        }
        let mut parts = Vec::with_capacity(4);
        for c in text.chars() {
            parts.push(c.to_digit(10)?);
        }
        Some(Self::from_parts(&parts))
    }

    /// Dotted form with trailing zero parts dropped, keeping at least `min_parts`.
    pub fn to_dotted(&self, min_parts: usize) -> String {
        let parts = self.trimmed(min_parts);
        parts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Compact folder form, or `None` when some part does not fit one digit.
    pub fn to_digits(&self, min_parts: usize) -> Option<String> {
        let parts = self.trimmed(min_parts);
        if parts.iter().any(|part| *part > 9) {
            return None;
        }
        Some(parts.iter().map(u32::to_string).collect())
    }

    fn trimmed(&self, min_parts: usize) -> Vec<u32> {
        let mut parts = self.parts().to_vec();
        while parts.len() > min_parts.max(1) && parts.last() == Some(&0) {
            parts.pop();
        }
        parts
    }
}

/// Display form used in UI text: `4.5`, `4.6.1`, `10.0.19041`.
impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = if self.revision != 0 {
            4
        } else if self.build != 0 {
            3
        } else {
            2
        };
        let parts = self.parts();
        for (i, part) in parts[..fields].iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
