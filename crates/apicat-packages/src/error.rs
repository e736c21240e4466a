use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("package {id} {version} not found")]
    PackageNotFound { id: String, version: String },

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid package archive {package}: {source}")]
    Archive {
        package: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("package archive {package} has no entry {entry}")]
    MissingEntry { package: String, entry: String },

    #[error("invalid nuspec in {package}: {message}")]
    Nuspec { package: String, message: String },

    #[error("invalid package version {0:?}")]
    InvalidVersion(String),

    #[error("invalid version range {0:?}")]
    InvalidRange(String),

    #[error("dependency {id} of {dependent} has no lower version bound")]
    UnboundedDependency { id: String, dependent: String },
}

impl ResolveError {
    /// Whether the error means "the package does not exist" as opposed to a
    /// transport or format problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::PackageNotFound { .. })
    }
}
