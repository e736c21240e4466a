use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::version::FrameworkVersion;

pub const NET_FRAMEWORK: &str = ".NETFramework";
pub const NET_CORE_APP: &str = ".NETCoreApp";
pub const NET_STANDARD: &str = ".NETStandard";
pub const NET_PORTABLE: &str = ".NETPortable";
pub const ANY: &str = "Any";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformParseError {
    #[error("empty platform moniker")]
    Empty,
    #[error("unknown framework {0:?}")]
    UnknownFramework(String),
    #[error("invalid version in platform moniker {0:?}")]
    InvalidVersion(String),
    #[error("malformed platform moniker {0:?}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionStyle {
    /// Compact digits (`net45`), trimmed to at least this many parts.
    Digits(usize),
    /// Dotted (`netstandard2.0`).
    Dotted,
}

struct KnownFramework {
    identifier: &'static str,
    short: &'static str,
    style: VersionStyle,
}

const fn known(identifier: &'static str, short: &'static str, style: VersionStyle) -> KnownFramework {
    KnownFramework {
        identifier,
        short,
        style,
    }
}

static FRAMEWORKS: &[KnownFramework] = &[
    known(NET_FRAMEWORK, "net", VersionStyle::Digits(2)),
    known(NET_CORE_APP, "netcoreapp", VersionStyle::Dotted),
    known(NET_STANDARD, "netstandard", VersionStyle::Dotted),
    known(".NETPlatform", "dotnet", VersionStyle::Dotted),
    known(".NETCore", "netcore", VersionStyle::Digits(2)),
    known(NET_PORTABLE, "portable", VersionStyle::Digits(2)),
    known("UAP", "uap", VersionStyle::Dotted),
    known("Windows", "win", VersionStyle::Digits(1)),
    known("WindowsPhone", "wp", VersionStyle::Digits(1)),
    known("WindowsPhoneApp", "wpa", VersionStyle::Digits(2)),
    known("Silverlight", "sl", VersionStyle::Digits(1)),
    known("MonoAndroid", "monoandroid", VersionStyle::Digits(2)),
    known("MonoTouch", "monotouch", VersionStyle::Digits(2)),
    known("MonoMac", "monomac", VersionStyle::Digits(2)),
    known("Xamarin.iOS", "xamarinios", VersionStyle::Digits(2)),
    known("Xamarin.Mac", "xamarinmac", VersionStyle::Digits(2)),
    known("Xamarin.TVOS", "xamarintvos", VersionStyle::Digits(2)),
    known("Xamarin.WatchOS", "xamarinwatchos", VersionStyle::Digits(2)),
    known("Tizen", "tizen", VersionStyle::Dotted),
    known("DNX", "dnx", VersionStyle::Digits(2)),
    known("DNXCore", "dnxcore", VersionStyle::Digits(2)),
    known("ASP.NETCore", "aspnetcore", VersionStyle::Digits(2)),
    known("ASP.NET", "aspnet", VersionStyle::Digits(2)),
    known("native", "native", VersionStyle::Digits(2)),
    known(ANY, "any", VersionStyle::Digits(2)),
];

static PROFILES: &[(&str, &str)] = &[
    ("client", "Client"),
    ("full", "Full"),
    ("cf", "CompactFramework"),
    ("wp", "WindowsPhone"),
    ("wp71", "WindowsPhone71"),
];

fn by_identifier(identifier: &str) -> Option<&'static KnownFramework> {
    FRAMEWORKS
        .iter()
        .find(|f| f.identifier.eq_ignore_ascii_case(identifier))
}

fn by_short(short: &str) -> Option<&'static KnownFramework> {
    FRAMEWORKS.iter().find(|f| f.short.eq_ignore_ascii_case(short))
}

fn by_identifier_prefix(text: &str) -> Option<&'static KnownFramework> {
    FRAMEWORKS
        .iter()
        .filter(|f| {
            let len = f.identifier.len();
            text.len() >= len && text.as_bytes()[..len].eq_ignore_ascii_case(f.identifier.as_bytes())
        })
        .max_by_key(|f| f.identifier.len())
}

/// A target platform: framework family, version, and optionally a profile or a
/// sub-platform with its own version (`net6.0-windows10.0.19041`).
///
/// Known families are stored under their canonical identifier
/// (`.NETFramework`), so derived equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformMoniker {
    framework: String,
    version: FrameworkVersion,
    profile: Option<String>,
    platform: Option<String>,
    platform_version: FrameworkVersion,
}

impl PlatformMoniker {
    pub fn new(framework: impl Into<String>, version: FrameworkVersion) -> Self {
        let framework = framework.into();
        let framework = match by_identifier(&framework) {
            Some(known) => known.identifier.to_string(),
            None => framework,
        };
        Self {
            framework,
            version,
            profile: None,
            platform: None,
            platform_version: FrameworkVersion::ZERO,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>, version: FrameworkVersion) -> Self {
        self.platform = Some(platform.into());
        self.platform_version = version;
        self
    }

    pub fn any() -> Self {
        Self::new(ANY, FrameworkVersion::ZERO)
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn version(&self) -> FrameworkVersion {
        self.version
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn platform_version(&self) -> FrameworkVersion {
        self.platform_version
    }

    pub fn is_portable(&self) -> bool {
        self.framework == NET_PORTABLE
    }

    pub fn is_any(&self) -> bool {
        self.framework == ANY
    }

    pub(crate) fn same_family(&self, other: &PlatformMoniker) -> bool {
        self.framework.eq_ignore_ascii_case(&other.framework)
    }

    /// The frameworks a portable profile (`net45+win8`) targets. Entries that
    /// do not parse are skipped.
    pub fn portable_frameworks(&self) -> Vec<PlatformMoniker> {
        if !self.is_portable() {
            return Vec::new();
        }
        self.profile
            .as_deref()
            .unwrap_or_default()
            .split('+')
            .filter_map(|part| PlatformMoniker::parse_folder(part).ok())
            .filter(|moniker| !moniker.is_portable())
            .collect()
    }

    /// Parses either a short folder name (`net45`, `net6.0-windows`) or a full
    /// name (`.NETFramework,Version=v4.5,Profile=Client`).
    pub fn parse(text: &str) -> Result<Self, PlatformParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlatformParseError::Empty);
        }
        if text.contains(',') {
            Self::parse_full(text)
        } else {
            Self::parse_folder(text)
        }
    }

    fn parse_full(text: &str) -> Result<Self, PlatformParseError> {
        let mut components = text.split(',').map(str::trim);
        let identifier = components.next().unwrap_or_default();
        if identifier.is_empty() {
            return Err(PlatformParseError::Malformed(text.to_string()));
        }

        let mut moniker = PlatformMoniker::new(identifier, FrameworkVersion::ZERO);
        for component in components {
            let (key, value) = component
                .split_once('=')
                .ok_or_else(|| PlatformParseError::Malformed(text.to_string()))?;
            let version = || {
                FrameworkVersion::parse_dotted(value)
                    .ok_or_else(|| PlatformParseError::InvalidVersion(text.to_string()))
            };
            match key.trim() {
                k if k.eq_ignore_ascii_case("Version") => moniker.version = version()?,
                k if k.eq_ignore_ascii_case("Profile") => moniker.profile = Some(value.to_string()),
                k if k.eq_ignore_ascii_case("Platform") => moniker.platform = Some(value.to_string()),
                k if k.eq_ignore_ascii_case("PlatformVersion") => {
                    moniker.platform_version = version()?
                }
                _ => return Err(PlatformParseError::Malformed(text.to_string())),
            }
        }
        Ok(moniker)
    }

    fn parse_folder(text: &str) -> Result<Self, PlatformParseError> {
        let (head, suffix) = match text.split_once('-') {
            Some((head, suffix)) => (head, Some(suffix)),
            None => (text, None),
        };

        let split = head
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(head.len());
        let (short, version_text) = head.split_at(split);
        // Manifests also spell targets as identifier plus version (`.NETStandard2.0`).
        let (known, version_text) = match by_short(short) {
            Some(known) => (known, version_text),
            None => by_identifier_prefix(head)
                .map(|known| (known, &head[known.identifier.len()..]))
                .ok_or_else(|| PlatformParseError::UnknownFramework(short.to_string()))?,
        };

        let version = if version_text.is_empty() {
            FrameworkVersion::ZERO
        } else if version_text.contains('.') {
            FrameworkVersion::parse_dotted(version_text)
                .ok_or_else(|| PlatformParseError::InvalidVersion(text.to_string()))?
        } else {
            FrameworkVersion::parse_digits(version_text)
                .ok_or_else(|| PlatformParseError::InvalidVersion(text.to_string()))?
        };

        let framework = if known.identifier == NET_FRAMEWORK && version.major >= 5 {
            NET_CORE_APP
        } else {
            known.identifier
        };
        let mut moniker = PlatformMoniker::new(framework, version);

        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            if moniker.is_portable() {
                moniker.profile = Some(suffix.to_string());
            } else if moniker.framework == NET_CORE_APP && version.major >= 5 {
                let split = suffix
                    .find(|c: char| c.is_ascii_digit())
                    .unwrap_or(suffix.len());
                let (platform, platform_version) = suffix.split_at(split);
                moniker.platform = Some(platform.to_string());
                if !platform_version.is_empty() {
                    moniker.platform_version = FrameworkVersion::parse_dotted(platform_version)
                        .ok_or_else(|| PlatformParseError::InvalidVersion(text.to_string()))?;
                }
            } else {
                let profile = PROFILES
                    .iter()
                    .find(|(short, _)| short.eq_ignore_ascii_case(suffix))
                    .map_or(suffix, |(_, full)| *full);
                moniker.profile = Some(profile.to_string());
            }
        }

        Ok(moniker)
    }

    /// Short folder name as used inside package archives (`net45`,
    /// `netstandard2.0`, `net6.0-windows10.0.19041`).
    pub fn short_folder_name(&self) -> String {
        let uses_net5_naming = self.framework == NET_CORE_APP && self.version.major >= 5;
        let known = by_identifier(&self.framework);

        let mut out = match (uses_net5_naming, known) {
            (true, _) => "net".to_string(),
            (false, Some(known)) => known.short.to_string(),
            (false, None) => self.framework.to_ascii_lowercase(),
        };

        if self.is_portable() {
            if let Some(profile) = &self.profile {
                out.push('-');
                out.push_str(profile);
            }
            return out;
        }

        let style = if uses_net5_naming {
            VersionStyle::Dotted
        } else {
            known.map_or(VersionStyle::Dotted, |k| k.style)
        };
        let always_versioned = matches!(
            self.framework.as_str(),
            NET_FRAMEWORK | NET_CORE_APP | NET_STANDARD
        );
        if always_versioned || !self.version.is_zero() {
            match style {
                VersionStyle::Digits(min) => match self.version.to_digits(min) {
                    Some(digits) => out.push_str(&digits),
                    None => out.push_str(&self.version.to_dotted(2)),
                },
                VersionStyle::Dotted => out.push_str(&self.version.to_dotted(2)),
            }
        }

        if let Some(profile) = &self.profile {
            let short = PROFILES
                .iter()
                .find(|(_, full)| full.eq_ignore_ascii_case(profile))
                .map_or(profile.as_str(), |(short, _)| *short);
            out.push('-');
            out.push_str(short);
        }

        if let Some(platform) = &self.platform {
            out.push('-');
            out.push_str(platform);
            if !self.platform_version.is_zero() {
                out.push_str(&self.platform_version.to_dotted(2));
            }
        }

        out
    }

    /// Human-facing family name (".NET Framework", ".NET Core", ".NET").
    pub fn framework_display_name(&self) -> &str {
        match self.framework.as_str() {
            NET_FRAMEWORK => ".NET Framework",
            NET_CORE_APP if self.version.major >= 5 => ".NET",
            NET_CORE_APP => ".NET Core",
            NET_STANDARD => ".NET Standard",
            "MonoAndroid" => "Xamarin Android",
            "Xamarin.iOS" => "Xamarin iOS",
            "Xamarin.Mac" => "Xamarin macOS",
            "Xamarin.TVOS" => "Xamarin tvOS",
            "Xamarin.WatchOS" => "Xamarin watchOS",
            other => other,
        }
    }

    /// Human-facing version, with the profile or sub-platform appended.
    pub fn version_display(&self) -> String {
        if self.is_portable() {
            return self.short_folder_name();
        }
        if let Some(profile) = &self.profile {
            return format!("{} ({profile})", self.version);
        }
        if let Some(platform) = &self.platform {
            if self.platform_version.is_zero() {
                return format!("{}-{platform}", self.version);
            }
            return format!("{}-{platform}{}", self.version, self.platform_version);
        }
        self.version.to_string()
    }

    /// Whether the catalog surfaces this family in availability views.
    pub fn is_relevant(&self) -> bool {
        matches!(
            self.framework.as_str(),
            NET_CORE_APP | NET_STANDARD | NET_FRAMEWORK
        )
    }
}

/// Full framework name, e.g. `.NETFramework,Version=v4.5,Profile=Client`.
impl fmt::Display for PlatformMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.framework, self.version.to_dotted(2))?;
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={profile}")?;
        }
        if let Some(platform) = &self.platform {
            write!(f, ",Platform={platform}")?;
            if !self.platform_version.is_zero() {
                write!(f, ",PlatformVersion=v{}", self.platform_version.to_dotted(2))?;
            }
        }
        Ok(())
    }
}

impl FromStr for PlatformMoniker {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformMoniker::parse(s)
    }
}

impl Serialize for PlatformMoniker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.short_folder_name())
    }
}

impl<'de> Deserialize<'de> for PlatformMoniker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PlatformMoniker::parse(&text).map_err(serde::de::Error::custom)
    }
}
