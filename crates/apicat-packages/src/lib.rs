//! Package archives, dependency closures and platform reference sets.
//!
//! A package is opened through a [`PackageSource`] as a [`PackageArchive`].
//! For every platform it ships assets for, [`resolve_platform`] picks the
//! nearest reference group and resolves the [`DependencyClosure`]; the
//! platform's own reference assemblies come from the first
//! [`FrameworkLocator`] that knows it.

mod archive;
mod closure;
mod error;
mod locator;
mod nuspec;
mod range;
mod resolve;
mod source;
mod version;

pub use archive::{FileGroup, NupkgArchive, PackageArchive, PackageIdentity};
pub use closure::{DependencyClosure, FetchScope};
pub use error::ResolveError;
pub use locator::{
    default_locators, locate_platform, reference_packs, ArchivedFrameworkLocator,
    FrameworkLocator, PackBasedFrameworkLocator, PortableFrameworkLocator, ReferenceFile,
    ReferencePack, ReferenceSet,
};
pub use nuspec::{DependencyGroup, Nuspec, PackageDependency};
pub use range::VersionRange;
pub use resolve::{reference_targets, resolve_platform, PlatformResolution};
pub use source::{nupkg_file_name, DirectorySource, HttpSource, PackageSource, DEFAULT_URL_TEMPLATE};
pub use version::PackageVersion;
