use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use apicat_platform::{nearest, PlatformMoniker};

use crate::archive::{FileGroup, PackageArchive};
use crate::error::ResolveError;
use crate::locator::ReferenceFile;
use crate::source::PackageSource;
use crate::version::PackageVersion;

/// Memoizes archive fetches for the duration of one package.
///
/// Every archive fetched through the scope is released when the scope is
/// dropped, on success and on every error path alike.
pub struct FetchScope<'a> {
    source: &'a dyn PackageSource,
    fetched: RefCell<HashMap<(String, String), Arc<dyn PackageArchive>>>,
}

impl<'a> FetchScope<'a> {
    pub fn new(source: &'a dyn PackageSource) -> Self {
        Self {
            source,
            fetched: RefCell::new(HashMap::new()),
        }
    }

    pub fn fetch(
        &self,
        id: &str,
        version: &PackageVersion,
    ) -> Result<Arc<dyn PackageArchive>, ResolveError> {
        let key = (id.to_ascii_lowercase(), version.to_normalized_string());
        if let Some(archive) = self.fetched.borrow().get(&key) {
            return Ok(Arc::clone(archive));
        }
        let archive = self.source.fetch(id, version)?;
        self.fetched.borrow_mut().insert(key, Arc::clone(&archive));
        Ok(archive)
    }

    /// Number of distinct archives fetched so far.
    pub fn len(&self) -> usize {
        self.fetched.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for FetchScope<'_> {
    fn drop(&mut self) {
        let released = self.fetched.get_mut().len();
        if released > 0 {
            tracing::trace!(target = "apicat.packages", released, "released package archives");
        }
    }
}

/// The transitive dependencies of one package for one target platform: at
/// most one archive per package id.
#[derive(Default)]
pub struct DependencyClosure {
    packages: BTreeMap<String, Arc<dyn PackageArchive>>,
}

impl std::fmt::Debug for DependencyClosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.packages
                    .iter()
                    .map(|(id, archive)| (id, archive.identity().version.to_normalized_string())),
            )
            .finish()
    }
}

impl DependencyClosure {
    /// Resolves the closure of `root` for `platform`, depth-first.
    ///
    /// For every dependency of the nearest dependency group, the declared
    /// minimum version is fetched. When an id is reached again with a higher
    /// minimum, the resolved archive is evicted and the higher version fetched
    /// and recursed into; a lower or equal minimum keeps the existing one.
    /// Any dependency that cannot be fetched fails the whole closure.
    pub fn resolve(
        root: &dyn PackageArchive,
        platform: &PlatformMoniker,
        scope: &FetchScope<'_>,
    ) -> Result<Self, ResolveError> {
        let mut closure = DependencyClosure::default();
        closure.add_dependencies(root, platform, scope)?;
        Ok(closure)
    }

    fn add_dependencies(
        &mut self,
        package: &dyn PackageArchive,
        platform: &PlatformMoniker,
        scope: &FetchScope<'_>,
    ) -> Result<(), ResolveError> {
        let Some(group) = nearest(platform, package.dependency_groups()) else {
            return Ok(());
        };

        for dependency in &group.dependencies {
            let key = dependency.id.to_ascii_lowercase();
            let min = dependency.range.min_version().ok_or_else(|| {
                ResolveError::UnboundedDependency {
                    id: dependency.id.clone(),
                    dependent: package.identity().to_string(),
                }
            })?;

            if let Some(existing) = self.packages.get(&key) {
                let existing_version = &existing.identity().version;
                if min <= existing_version {
                    continue;
                }
                tracing::debug!(
                    target = "apicat.packages",
                    id = %dependency.id,
                    evicted = %existing_version,
                    required = %min,
                    "dependency version conflict; keeping higher minimum"
                );
                self.packages.remove(&key);
            }

            let archive = scope.fetch(&dependency.id, min)?;
            self.packages.insert(key, Arc::clone(&archive));
            self.add_dependencies(archive.as_ref(), platform, scope)?;
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn PackageArchive>> {
        self.packages.get(&id.to_ascii_lowercase())
    }

    /// Archives in the closure, ordered by lowercase id.
    pub fn packages(&self) -> impl Iterator<Item = &Arc<dyn PackageArchive>> {
        self.packages.values()
    }

    /// Reference files contributed by the closure for `platform`: the
    /// nearest reference group of every member, when it has one.
    pub fn reference_files(
        &self,
        platform: &PlatformMoniker,
    ) -> Result<Vec<ReferenceFile>, ResolveError> {
        let mut files = Vec::new();
        for archive in self.packages.values() {
            let groups = archive.reference_groups();
            let Some(group) = nearest::<FileGroup, _>(platform, &groups) else {
                continue;
            };
            for item in &group.items {
                files.push(ReferenceFile::new(item.clone(), archive.read(item)?));
            }
        }
        Ok(files)
    }
}
