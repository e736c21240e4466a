//! The API catalog: a flat, offset-addressed store of APIs, assemblies,
//! declarations and markup.
//!
//! A catalog is built with a [`CatalogBuilder`], saved as a single artifact
//! (see `apicat-storage`) and opened read-only as a [`Catalog`]. Both expose
//! the same queries through [`CatalogView`]. Records never move: an offset
//! handed out by the builder addresses the same record after any number of
//! save/reopen/merge cycles.

mod builder;
mod catalog;
mod error;
mod tables;
mod view;

pub use builder::CatalogBuilder;
pub use catalog::Catalog;
pub use error::CatalogError;
pub use tables::{CatalogTables, NONE};
pub use view::{
    ApiRef, AssemblyRef, AvailabilityRef, CatalogStats, CatalogView, DeclarationRef,
    FrameworkRef, PackageRef,
};

/// Bump whenever the table layout or its interpretation changes.
pub const CATALOG_FORMAT_VERSION: u32 = 1;
