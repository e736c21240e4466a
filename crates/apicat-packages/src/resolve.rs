use apicat_platform::{nearest, PlatformMoniker};

use crate::archive::{FileGroup, PackageArchive};
use crate::closure::{DependencyClosure, FetchScope};
use crate::error::ResolveError;

/// What a package compiles against for one target platform.
#[derive(Debug)]
pub struct PlatformResolution {
    pub platform: PlatformMoniker,
    /// Nearest reference group of the package itself.
    pub references: FileGroup,
    pub closure: DependencyClosure,
}

/// Target platforms of `archive`, each paired with its nearest reference
/// group. Platforms without a compatible reference group are dropped.
pub fn reference_targets(archive: &dyn PackageArchive) -> Vec<(PlatformMoniker, FileGroup)> {
    let groups = archive.reference_groups();
    archive
        .target_platforms()
        .into_iter()
        .filter_map(|platform| {
            let group = nearest::<FileGroup, _>(&platform, &groups)?.clone();
            Some((platform, group))
        })
        .collect()
}

/// Resolves the reference group and dependency closure of `archive` for
/// `platform`. `Ok(None)` when the package has nothing to compile for it.
pub fn resolve_platform(
    archive: &dyn PackageArchive,
    platform: &PlatformMoniker,
    scope: &FetchScope<'_>,
) -> Result<Option<PlatformResolution>, ResolveError> {
    let groups = archive.reference_groups();
    let Some(references) = nearest::<FileGroup, _>(platform, &groups) else {
        return Ok(None);
    };
    let closure = DependencyClosure::resolve(archive, platform, scope)?;
    Ok(Some(PlatformResolution {
        platform: platform.clone(),
        references: references.clone(),
        closure,
    }))
}
