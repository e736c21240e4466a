use apicat_catalog::CatalogError;
use apicat_markup::MarkupError;
use apicat_packages::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid declaration markup for {documentation_id}: {source}")]
    Markup {
        documentation_id: String,
        #[source]
        source: MarkupError,
    },

    #[error("failed to read symbols from {path}: {message}")]
    Symbols { path: String, message: String },

    #[error("invalid symbol tree for {assembly}: {message}")]
    InvalidSymbolTree { assembly: String, message: String },

    #[error("no reference assemblies found for {platform}")]
    PlatformNotFound { platform: String },
}
