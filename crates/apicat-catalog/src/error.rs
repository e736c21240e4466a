use apicat_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{table} table exceeds the 4 GiB offset range")]
    TableFull { table: &'static str },

    #[error("catalog file has a malformed {table} table")]
    Corrupt { table: &'static str },
}
