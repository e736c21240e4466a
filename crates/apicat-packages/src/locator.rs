use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apicat_platform::{PlatformMoniker, NET_CORE_APP, NET_FRAMEWORK, NET_STANDARD};

use crate::error::ResolveError;
use crate::source::PackageSource;
use crate::version::PackageVersion;

/// One compile-time reference assembly.
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ReferenceFile {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ReferenceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceFile")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The reference assemblies of a platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    pub files: Vec<ReferenceFile>,
}

impl ReferenceSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Finds the reference assemblies of a target platform.
pub trait FrameworkLocator: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when this locator does not know the platform.
    fn locate(&self, platform: &PlatformMoniker) -> Result<Option<ReferenceSet>, ResolveError>;
}

/// Runs `locators` in order; the first non-empty set wins.
pub fn locate_platform(
    locators: &[Box<dyn FrameworkLocator>],
    platform: &PlatformMoniker,
) -> Result<Option<ReferenceSet>, ResolveError> {
    for locator in locators {
        match locator.locate(platform)? {
            Some(set) if !set.is_empty() => {
                tracing::debug!(
                    target = "apicat.packages",
                    platform = %platform.short_folder_name(),
                    locator = locator.name(),
                    files = set.files.len(),
                    "located platform references"
                );
                return Ok(Some(set));
            }
            _ => continue,
        }
    }
    Ok(None)
}

/// The locators tried for every platform, in order: offline archived sets,
/// registry reference packs (when a source is given), portable profiles.
pub fn default_locators(
    frameworks_root: &Path,
    packs: Option<Arc<dyn PackageSource>>,
) -> Vec<Box<dyn FrameworkLocator>> {
    let mut locators: Vec<Box<dyn FrameworkLocator>> =
        vec![Box::new(ArchivedFrameworkLocator::new(frameworks_root))];
    if let Some(source) = packs {
        locators.push(Box::new(PackBasedFrameworkLocator::new(source)));
    }
    locators.push(Box::new(PortableFrameworkLocator::new(frameworks_root)));
    locators
}

/// Reads every `.dll` directly inside `dir`, sorted by file name. A missing
/// directory yields `None`.
fn read_assembly_dir(dir: &Path) -> Result<Option<ReferenceSet>, ResolveError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ResolveError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ResolveError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_dll = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"));
        if is_dll && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        files.push(ReferenceFile::new(path.to_string_lossy(), bytes));
    }
    Ok(Some(ReferenceSet { files }))
}

/// Offline reference sets laid out as `<root>/archived/<short folder name>/*.dll`.
#[derive(Debug, Clone)]
pub struct ArchivedFrameworkLocator {
    root: PathBuf,
}

impl ArchivedFrameworkLocator {
    pub fn new(frameworks_root: &Path) -> Self {
        Self {
            root: frameworks_root.join("archived"),
        }
    }
}

impl FrameworkLocator for ArchivedFrameworkLocator {
    fn name(&self) -> &'static str {
        "archived"
    }

    fn locate(&self, platform: &PlatformMoniker) -> Result<Option<ReferenceSet>, ResolveError> {
        if platform.is_portable() {
            return Ok(None);
        }
        read_assembly_dir(&self.root.join(platform.short_folder_name()))
    }
}

/// A registry package carrying reference assemblies under `folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePack {
    pub id: String,
    pub version: PackageVersion,
    pub folder: String,
}

/// Reference packs that make up `platform`, or an empty list when the
/// platform is not pack-distributed.
pub fn reference_packs(platform: &PlatformMoniker) -> Vec<ReferencePack> {
    let version = platform.version();
    let (major, minor) = (u64::from(version.major), u64::from(version.minor));
    let short = platform.short_folder_name();
    let pack = |id: &str, version: PackageVersion, folder: String| ReferencePack {
        id: id.to_string(),
        version,
        folder,
    };

    match platform.framework() {
        NET_CORE_APP if major >= 3 => {
            let tfm = PlatformMoniker::new(NET_CORE_APP, version).short_folder_name();
            let runtime_version = PackageVersion::new(major, minor, 0);
            let mut packs = vec![pack(
                "Microsoft.NETCore.App.Ref",
                runtime_version.clone(),
                format!("ref/{tfm}"),
            )];
            if platform
                .platform()
                .is_some_and(|p| p.eq_ignore_ascii_case("windows"))
            {
                packs.push(pack(
                    "Microsoft.WindowsDesktop.App.Ref",
                    runtime_version,
                    format!("ref/{tfm}"),
                ));
            }
            packs
        }
        NET_STANDARD if (major, minor) == (2, 1) => vec![pack(
            "NETStandard.Library.Ref",
            PackageVersion::new(2, 1, 0),
            "ref/netstandard2.1".to_string(),
        )],
        NET_STANDARD if (major, minor) == (2, 0) => vec![pack(
            "NETStandard.Library",
            PackageVersion::new(2, 0, 3),
            "build/netstandard2.0/ref".to_string(),
        )],
        NET_FRAMEWORK if platform.profile().is_none() => vec![pack(
            &format!("Microsoft.NETFramework.ReferenceAssemblies.{short}"),
            PackageVersion::new(1, 0, 3),
            format!("build/.NETFramework/v{}", version.to_dotted(2)),
        )],
        _ => Vec::new(),
    }
}

/// Reference packs fetched through a [`PackageSource`].
pub struct PackBasedFrameworkLocator {
    source: Arc<dyn PackageSource>,
}

impl PackBasedFrameworkLocator {
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        Self { source }
    }
}

impl FrameworkLocator for PackBasedFrameworkLocator {
    fn name(&self) -> &'static str {
        "reference-pack"
    }

    fn locate(&self, platform: &PlatformMoniker) -> Result<Option<ReferenceSet>, ResolveError> {
        let packs = reference_packs(platform);
        if packs.is_empty() {
            return Ok(None);
        }

        let mut files = Vec::new();
        for pack in packs {
            let archive = match self.source.fetch(&pack.id, &pack.version) {
                Ok(archive) => archive,
                Err(err) if err.is_not_found() => return Ok(None),
                Err(err) => return Err(err),
            };
            let prefix = format!("{}/", pack.folder.to_ascii_lowercase());
            for path in archive.files() {
                let lower = path.to_ascii_lowercase();
                let in_folder = lower
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/') && rest.ends_with(".dll"));
                if in_folder {
                    files.push(ReferenceFile::new(path.clone(), archive.read(path)?));
                }
            }
        }
        Ok(Some(ReferenceSet { files }))
    }
}

/// Portable profile reference sets laid out as `<root>/portable/<profile>/*.dll`,
/// e.g. `portable/net45+win8/`.
#[derive(Debug, Clone)]
pub struct PortableFrameworkLocator {
    root: PathBuf,
}

impl PortableFrameworkLocator {
    pub fn new(frameworks_root: &Path) -> Self {
        Self {
            root: frameworks_root.join("portable"),
        }
    }
}

impl FrameworkLocator for PortableFrameworkLocator {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn locate(&self, platform: &PlatformMoniker) -> Result<Option<ReferenceSet>, ResolveError> {
        match platform.profile() {
            Some(profile) if platform.is_portable() => read_assembly_dir(&self.root.join(profile)),
            _ => Ok(None),
        }
    }
}
