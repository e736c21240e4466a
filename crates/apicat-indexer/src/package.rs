use std::sync::Arc;

use apicat_packages::{
    locate_platform, resolve_platform, FetchScope, FrameworkLocator, PackageArchive,
    PackageSource, PackageVersion, ReferenceFile,
};
use apicat_platform::{is_known_unsupported, PlatformMoniker};
use serde::Serialize;

use crate::assembly::AssemblyIndex;
use crate::error::IndexError;
use crate::symbols::SymbolProvider;

/// Everything extracted from one package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndex {
    pub id: String,
    /// Normalized version string.
    pub version: String,
    pub frameworks: Vec<FrameworkIndex>,
    pub skipped: Vec<PlatformSkip>,
}

/// The assemblies a package ships for one framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkIndex {
    /// Short folder name of the platform (`net45`, `netstandard2.0`).
    pub framework: String,
    pub assemblies: Vec<AssemblyIndex>,
}

/// A platform that could not be indexed. The rest of the package still is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSkip {
    pub framework: String,
    pub reason: String,
}

/// Runs the per-package pipeline: target platforms, dependency closure,
/// platform references, symbol extraction.
pub struct PackageIndexer {
    source: Arc<dyn PackageSource>,
    locators: Vec<Box<dyn FrameworkLocator>>,
    symbols: Arc<dyn SymbolProvider>,
}

impl PackageIndexer {
    pub fn new(
        source: Arc<dyn PackageSource>,
        locators: Vec<Box<dyn FrameworkLocator>>,
        symbols: Arc<dyn SymbolProvider>,
    ) -> Self {
        Self {
            source,
            locators,
            symbols,
        }
    }

    /// Indexes every target platform of the package.
    ///
    /// Only failing to fetch the package itself is an error. A platform whose
    /// dependencies, references or symbols cannot be loaded is recorded in
    /// [`PackageIndex::skipped`] and the remaining platforms are indexed.
    /// Archives fetched along the way are released before returning.
    pub fn index(&self, id: &str, version: &PackageVersion) -> Result<PackageIndex, IndexError> {
        let scope = FetchScope::new(self.source.as_ref());
        let root = scope.fetch(id, version)?;
        let identity = root.identity().clone();

        let mut index = PackageIndex {
            id: identity.id.clone(),
            version: identity.version.to_normalized_string(),
            frameworks: Vec::new(),
            skipped: Vec::new(),
        };

        for platform in root.target_platforms() {
            let framework = platform.short_folder_name();
            match self.index_platform(root.as_ref(), &platform, &scope) {
                Ok(Some(assemblies)) => {
                    tracing::debug!(
                        target = "apicat.indexer",
                        package = %identity,
                        framework = %framework,
                        assemblies = assemblies.len(),
                        "indexed platform"
                    );
                    index.frameworks.push(FrameworkIndex {
                        framework,
                        assemblies,
                    });
                }
                Ok(None) => {
                    tracing::debug!(
                        target = "apicat.indexer",
                        package = %identity,
                        framework = %framework,
                        "no compatible reference group; skipping platform"
                    );
                }
                Err(IndexError::PlatformNotFound { .. }) if is_known_unsupported(&platform) => {
                    tracing::debug!(
                        target = "apicat.indexer",
                        package = %identity,
                        framework = %framework,
                        "retired platform without reference assemblies"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        target = "apicat.indexer",
                        package = %identity,
                        framework = %framework,
                        error = %err,
                        "skipping platform"
                    );
                    index.skipped.push(PlatformSkip {
                        framework,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            target = "apicat.indexer",
            package = %identity,
            frameworks = index.frameworks.len(),
            skipped = index.skipped.len(),
            fetched = scope.len(),
            "indexed package"
        );
        Ok(index)
    }

    fn index_platform(
        &self,
        root: &dyn PackageArchive,
        platform: &PlatformMoniker,
        scope: &FetchScope<'_>,
    ) -> Result<Option<Vec<AssemblyIndex>>, IndexError> {
        let Some(resolution) = resolve_platform(root, platform, scope)? else {
            return Ok(None);
        };
        let framework = locate_platform(&self.locators, platform)?.ok_or_else(|| {
            IndexError::PlatformNotFound {
                platform: platform.short_folder_name(),
            }
        })?;

        let own = resolution
            .references
            .items
            .iter()
            .map(|item| Ok(ReferenceFile::new(item.clone(), root.read(item)?)))
            .collect::<Result<Vec<_>, IndexError>>()?;

        let mut references = own.clone();
        references.extend(resolution.closure.reference_files(platform)?);
        references.extend(framework.files);

        own.iter()
            .map(|file| {
                let tree = self.symbols.load(file, &references)?;
                AssemblyIndex::extract(&tree)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}
