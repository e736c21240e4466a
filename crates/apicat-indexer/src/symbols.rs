use apicat_core::{Accessibility, ApiKind};
use apicat_packages::ReferenceFile;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Index of a symbol inside its [`SymbolTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolIdx(pub u32);

impl SymbolIdx {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One symbol of an assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: ApiKind,
    /// Display name (`List<T>`, `Add(T)`).
    pub name: String,
    /// Documentation comment id (`T:System.Collections.Generic.List`1`).
    pub documentation_id: String,
    pub accessibility: Accessibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<SymbolIdx>,
    /// Declaration text in markup form.
    pub declaration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub public_key_token: String,
}

/// The symbols of one assembly as an arena: parents refer to earlier
/// entries by index. Namespaces are roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTree {
    pub assembly: AssemblyInfo,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

impl SymbolTree {
    pub fn new(assembly: AssemblyInfo) -> Self {
        Self {
            assembly,
            symbols: Vec::new(),
        }
    }

    /// Appends a symbol and returns its index.
    ///
    /// Panics if `symbol.parent` does not refer to an earlier symbol.
    pub fn push(&mut self, symbol: Symbol) -> SymbolIdx {
        let idx = SymbolIdx(self.symbols.len() as u32);
        if let Some(parent) = symbol.parent {
            assert!(parent < idx, "symbol parent {parent:?} must precede {idx:?}");
        }
        self.symbols.push(symbol);
        idx
    }

    pub fn get(&self, idx: SymbolIdx) -> &Symbol {
        &self.symbols[idx.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolIdx, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolIdx(i as u32), symbol))
    }

    pub fn children(&self, parent: SymbolIdx) -> impl Iterator<Item = (SymbolIdx, &Symbol)> {
        self.iter()
            .filter(move |(_, symbol)| symbol.parent == Some(parent))
    }

    /// Checks that every parent index refers to an earlier symbol.
    pub fn validate(&self) -> Result<(), IndexError> {
        for (idx, symbol) in self.iter() {
            if let Some(parent) = symbol.parent {
                if parent >= idx {
                    return Err(IndexError::InvalidSymbolTree {
                        assembly: self.assembly.name.clone(),
                        message: format!(
                            "symbol {} refers to parent {} which does not precede it",
                            idx.0, parent.0
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Which symbols belong to the public surface.
    ///
    /// A type or member is visible when it and all its ancestors below the
    /// namespace are public or protected. A namespace is visible when it
    /// contains a visible type.
    pub fn visibility(&self) -> Vec<bool> {
        let mut visible = vec![false; self.symbols.len()];
        for (idx, symbol) in self.iter() {
            if symbol.kind == ApiKind::Namespace {
                continue;
            }
            let parent_ok = match symbol.parent {
                None => true,
                Some(parent) => {
                    self.get(parent).kind == ApiKind::Namespace || visible[parent.index()]
                }
            };
            visible[idx.index()] = parent_ok && symbol.accessibility.is_visible();
        }
        for idx in 0..self.symbols.len() {
            if !visible[idx] {
                continue;
            }
            if let Some(parent) = self.symbols[idx].parent {
                if self.get(parent).kind == ApiKind::Namespace {
                    visible[parent.index()] = true;
                }
            }
        }
        visible
    }
}

/// Extracts the symbols of an assembly.
///
/// `references` holds everything the assembly compiles against: dependency
/// assemblies and the platform's reference assemblies.
pub trait SymbolProvider: Send + Sync {
    fn load(
        &self,
        assembly: &ReferenceFile,
        references: &[ReferenceFile],
    ) -> Result<SymbolTree, IndexError>;
}

/// Reads symbol trees serialized as JSON, the interchange format written by
/// external extractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestSymbolProvider;

impl SymbolProvider for ManifestSymbolProvider {
    fn load(
        &self,
        assembly: &ReferenceFile,
        _references: &[ReferenceFile],
    ) -> Result<SymbolTree, IndexError> {
        let tree: SymbolTree =
            serde_json::from_slice(&assembly.bytes).map_err(|err| IndexError::Symbols {
                path: assembly.path.clone(),
                message: err.to_string(),
            })?;
        tree.validate()?;
        Ok(tree)
    }
}
