use apicat_core::{ApiKind, CatalogId};
use apicat_markup::Markup;

use crate::error::IndexError;
use crate::symbols::SymbolTree;

/// One API of an extracted assembly, ready to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEntry {
    pub id: CatalogId,
    /// Index of the parent entry; always smaller than this entry's index.
    pub parent: Option<usize>,
    pub kind: ApiKind,
    pub name: String,
    pub markup: Markup,
}

/// The public surface of one assembly with its content identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyIndex {
    pub id: CatalogId,
    pub name: String,
    pub version: String,
    pub public_key_token: String,
    pub apis: Vec<ApiEntry>,
}

impl AssemblyIndex {
    /// Keeps the visible symbols of `tree`, derives their ids and parses
    /// their declarations.
    ///
    /// The assembly id hashes the documentation ids of the visible surface,
    /// so two builds exposing the same APIs collapse into one assembly.
    pub fn extract(tree: &SymbolTree) -> Result<Self, IndexError> {
        tree.validate()?;
        let visible = tree.visibility();

        let mut entries: Vec<Option<usize>> = vec![None; tree.len()];
        let mut apis = Vec::new();
        let mut documentation_ids = Vec::new();

        for (idx, symbol) in tree.iter() {
            let i = idx.0 as usize;
            if !visible[i] {
                continue;
            }
            let markup =
                Markup::parse(&symbol.declaration).map_err(|source| IndexError::Markup {
                    documentation_id: symbol.documentation_id.clone(),
                    source,
                })?;
            let parent = symbol.parent.and_then(|parent| entries[parent.0 as usize]);

            entries[i] = Some(apis.len());
            documentation_ids.push(symbol.documentation_id.as_str());
            apis.push(ApiEntry {
                id: CatalogId::for_documentation_id(&symbol.documentation_id),
                parent,
                kind: symbol.kind,
                name: symbol.name.clone(),
                markup,
            });
        }

        Ok(Self {
            id: CatalogId::for_api_set(documentation_ids),
            name: tree.assembly.name.clone(),
            version: tree.assembly.version.clone(),
            public_key_token: tree.assembly.public_key_token.clone(),
            apis,
        })
    }
}
