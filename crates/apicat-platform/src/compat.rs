use crate::moniker::{PlatformMoniker, NET_CORE_APP, NET_FRAMEWORK, NET_STANDARD};
use crate::version::FrameworkVersion;

/// Anything grouped under a target platform (reference groups, dependency
/// groups, lib folders).
pub trait FrameworkSpecific {
    fn platform(&self) -> &PlatformMoniker;
}

impl FrameworkSpecific for PlatformMoniker {
    fn platform(&self) -> &PlatformMoniker {
        self
    }
}

impl<T: FrameworkSpecific> FrameworkSpecific for &T {
    fn platform(&self) -> &PlatformMoniker {
        (**self).platform()
    }
}

struct Fallback {
    target: &'static str,
    since: FrameworkVersion,
    compatible: &'static str,
    up_to: FrameworkVersion,
}

const fn fallback(
    target: &'static str,
    since: (u32, u32, u32),
    compatible: &'static str,
    up_to: (u32, u32),
) -> Fallback {
    Fallback {
        target,
        since: FrameworkVersion::new(since.0, since.1).with_build(since.2),
        compatible,
        up_to: FrameworkVersion::new(up_to.0, up_to.1),
    }
}

/// Cross-family compatibility: a target of family `target` at version `since`
/// or later can consume `compatible` groups up to version `up_to`.
static FALLBACKS: &[Fallback] = &[
    fallback(NET_CORE_APP, (1, 0, 0), NET_STANDARD, (1, 6)),
    fallback(NET_CORE_APP, (2, 0, 0), NET_STANDARD, (2, 0)),
    fallback(NET_CORE_APP, (3, 0, 0), NET_STANDARD, (2, 1)),
    fallback(NET_FRAMEWORK, (4, 5, 0), NET_STANDARD, (1, 1)),
    fallback(NET_FRAMEWORK, (4, 5, 1), NET_STANDARD, (1, 2)),
    fallback(NET_FRAMEWORK, (4, 6, 0), NET_STANDARD, (1, 3)),
    fallback(NET_FRAMEWORK, (4, 6, 1), NET_STANDARD, (2, 0)),
    fallback("UAP", (10, 0, 0), NET_STANDARD, (1, 4)),
    fallback("UAP", (10, 0, 0), "Windows", (8, 1)),
    fallback("UAP", (10, 0, 0), "WindowsPhoneApp", (8, 1)),
    fallback("UAP", (10, 0, 0), ".NETCore", (5, 0)),
    fallback("Windows", (8, 0, 0), NET_STANDARD, (1, 1)),
    fallback("Windows", (8, 1, 0), NET_STANDARD, (1, 2)),
    fallback("WindowsPhoneApp", (8, 1, 0), NET_STANDARD, (1, 2)),
    fallback("WindowsPhone", (8, 0, 0), NET_STANDARD, (1, 0)),
    fallback("Tizen", (4, 0, 0), NET_STANDARD, (2, 0)),
    fallback("MonoAndroid", (0, 0, 0), NET_STANDARD, (2, 1)),
    fallback("Xamarin.iOS", (0, 0, 0), NET_STANDARD, (2, 1)),
    fallback("Xamarin.Mac", (0, 0, 0), NET_STANDARD, (2, 1)),
    fallback("Xamarin.TVOS", (0, 0, 0), NET_STANDARD, (2, 1)),
    fallback("Xamarin.WatchOS", (0, 0, 0), NET_STANDARD, (2, 1)),
];

/// Highest version of `family` a `target` platform can consume, if any.
fn fallback_limit(target: &PlatformMoniker, family: &str) -> Option<FrameworkVersion> {
    FALLBACKS
        .iter()
        .filter(|f| {
            f.target.eq_ignore_ascii_case(target.framework())
                && f.compatible.eq_ignore_ascii_case(family)
                && f.since <= target.version()
        })
        .map(|f| f.up_to)
        .max()
}

/// Whether assets built for `candidate` can be used when compiling for `target`.
///
/// Within one family the candidate must not be newer than the target; a
/// candidate profile or sub-platform must match the target's (a candidate
/// without one is a fallback). Across families the [`FALLBACKS`] table decides.
/// Portable candidates are compatible when any of their frameworks is; a
/// portable target needs the candidate to serve all of its frameworks.
pub fn is_compatible(target: &PlatformMoniker, candidate: &PlatformMoniker) -> bool {
    if candidate.is_any() {
        return true;
    }

    if target.is_portable() {
        if candidate.is_portable() && candidate == target {
            return true;
        }
        let frameworks = target.portable_frameworks();
        return !frameworks.is_empty()
            && frameworks
                .iter()
                .all(|framework| is_compatible(framework, candidate));
    }

    if candidate.is_portable() {
        return candidate
            .portable_frameworks()
            .iter()
            .any(|framework| is_compatible(target, framework));
    }

    if target.same_family(candidate) {
        if candidate.version() > target.version() {
            return false;
        }
        if let Some(profile) = candidate.profile() {
            if !target
                .profile()
                .is_some_and(|p| p.eq_ignore_ascii_case(profile))
            {
                return false;
            }
        }
        if let Some(platform) = candidate.platform() {
            let same_platform = target
                .platform()
                .is_some_and(|p| p.eq_ignore_ascii_case(platform));
            if !same_platform || candidate.platform_version() > target.platform_version() {
                return false;
            }
        }
        return true;
    }

    fallback_limit(target, candidate.framework())
        .is_some_and(|limit| candidate.version() <= limit)
}

/// Preference among compatible candidates; larger is nearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Nearness {
    tier: u8,
    platform: bool,
    profile: bool,
    version: FrameworkVersion,
    platform_version: FrameworkVersion,
}

fn nearness(target: &PlatformMoniker, candidate: &PlatformMoniker) -> Nearness {
    let tier = if candidate.is_any() {
        0
    } else if candidate.is_portable() && !target.is_portable() {
        1
    } else if target.same_family(candidate) {
        3
    } else {
        2
    };
    Nearness {
        tier,
        platform: candidate.platform().is_some(),
        profile: candidate.profile().is_some(),
        version: candidate.version(),
        platform_version: candidate.platform_version(),
    }
}

/// Picks the group nearest to `target` among `candidates`.
///
/// Same-family groups always beat fallback families, which beat portable
/// profiles, which beat framework-agnostic groups. Within a tier an exact
/// sub-platform or profile beats a plain group, then the highest version not
/// newer than the target wins. Ties keep the earliest candidate.
pub fn nearest<'a, T, I>(target: &PlatformMoniker, candidates: I) -> Option<&'a T>
where
    T: FrameworkSpecific + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<(Nearness, &'a T)> = None;
    for candidate in candidates {
        let moniker = candidate.platform();
        if !is_compatible(target, moniker) {
            continue;
        }
        let rank = nearness(target, moniker);
        if best.as_ref().map_or(true, |(current, _)| rank > *current) {
            best = Some((rank, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

static KNOWN_UNSUPPORTED: &[&str] = &[
    ".NETCore,Version=v5.0",
    ".NETFramework,Version=v4.6.3",
    ".NETPlatform,Version=v5.0",
    ".NETPlatform,Version=v5.4",
    ".NETPortable,Version=v0.0,Profile=aspnetcore50+net45+win8+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=net40+sl4+win8",
    ".NETPortable,Version=v0.0,Profile=net40+sl4+win8+wp71+wpa81",
    ".NETPortable,Version=v0.0,Profile=net40+sl4+win8+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=net40+win8+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=net45+netcore45+wp8+wp81+wpa81",
    ".NETPortable,Version=v0.0,Profile=net45+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=net451+win8+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=win8+wp8+wpa81",
    ".NETPortable,Version=v0.0,Profile=win8+wpa81",
    "Any,Version=v0.0",
    "ASP.NETCore,Version=v5.0",
    "DNX,Version=v4.5.1",
    "DNXCore,Version=v5.0",
    "native,Version=v0.0",
    "Silverlight,Version=v4.0",
    "Silverlight,Version=v4.0,Profile=WindowsPhone71",
    "Silverlight,Version=v5.0",
    "WindowsPhone,Version=v8.0",
    "WindowsPhoneApp,Version=v8.1",
];

/// Whether `moniker` is a retired platform whose missing reference assemblies
/// are expected and not worth reporting.
pub fn is_known_unsupported(moniker: &PlatformMoniker) -> bool {
    let full = moniker.to_string();
    KNOWN_UNSUPPORTED
        .iter()
        .any(|known| known.eq_ignore_ascii_case(&full))
}
