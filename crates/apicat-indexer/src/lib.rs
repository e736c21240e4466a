//! Turns packages into catalog records.
//!
//! [`PackageIndexer::index`] resolves every target platform of a package,
//! loads the symbols of its reference assemblies through a
//! [`SymbolProvider`] and produces a [`PackageIndex`]: content-addressed
//! assemblies with their visible APIs and parsed declaration markup.
//! [`PackageIndex::merge_into`] writes that into a
//! [`apicat_catalog::CatalogBuilder`]. [`BatchIndexer`] runs many packages on
//! worker threads with a single writer.

mod assembly;
mod batch;
mod error;
mod merge;
mod package;
mod symbols;

pub use assembly::{ApiEntry, AssemblyIndex};
pub use batch::{BatchIndexer, BatchReport, PackageFailure, PackageReport, PackageRequest};
pub use error::IndexError;
pub use merge::MergeStats;
pub use package::{FrameworkIndex, PackageIndex, PackageIndexer, PlatformSkip};
pub use symbols::{
    AssemblyInfo, ManifestSymbolProvider, Symbol, SymbolIdx, SymbolProvider, SymbolTree,
};
