use std::path::Path;

use apicat_storage::{ArchiveFile, StorageHeader};

use crate::error::CatalogError;
use crate::tables::{archived_tables, CatalogTables};
use crate::view::CatalogView;

/// A frozen, read-only catalog.
///
/// Uncompressed catalogs are served straight from a memory map; compressed
/// ones are decompressed once on open. Lookups by id binary-search the sorted
/// index tables. The catalog is `Send + Sync` and needs no locking.
#[derive(Debug)]
pub struct Catalog {
    archive: ArchiveFile<CatalogTables>,
}

impl Catalog {
    /// Opens a saved catalog. Files written with a different format version
    /// fail with [`apicat_storage::StorageError::WrongFormat`].
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let archive = CatalogTables::open(path)?;
        tracing::debug!(
            target = "apicat.catalog",
            path = %path.display(),
            mapped = archive.is_mapped(),
            payload_len = archive.header().payload_len,
            "opened catalog"
        );
        Ok(Self { archive })
    }

    pub fn header(&self) -> &StorageHeader {
        self.archive.header()
    }

    pub fn is_mapped(&self) -> bool {
        self.archive.is_mapped()
    }

    pub fn view(&self) -> CatalogView<'_> {
        CatalogView::new(archived_tables(self.archive.archived()))
    }
}
