use std::collections::HashMap;
use std::path::Path;

use apicat_core::{ApiKind, CatalogId};
use apicat_markup::Markup;
use apicat_storage::WriteArchiveOptions;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::tables::*;
use crate::view::CatalogView;

/// Mutable catalog under construction.
///
/// Every insert appends to its table, so offsets handed out stay valid for
/// the lifetime of the catalog, across saves and reopens. APIs, assemblies,
/// markups, packages and frameworks are deduplicated by identity; the first
/// insert wins and later inserts return the existing offset.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: CatalogTables,
    api_ids: HashMap<CatalogId, u32>,
    assembly_ids: HashMap<CatalogId, u32>,
    markup_ids: HashMap<CatalogId, u32>,
    strings: HashMap<String, u32>,
    packages: HashMap<(String, String), u32>,
    frameworks: HashMap<String, u32>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a saved catalog for further merging.
    ///
    /// The tables are loaded as they are; the id indexes, the string table and
    /// the small package and framework tables are decoded into lookup maps, so
    /// merging after a reopen interns and deduplicates exactly like a builder
    /// that never saved.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let tables = CatalogTables::open(path)?.to_owned()?;
        Self::from_tables(tables)
    }

    pub(crate) fn from_tables(tables: CatalogTables) -> Result<Self, CatalogError> {
        let api_ids = decode_index(&tables.api_index);
        let assembly_ids = decode_index(&tables.assembly_index);
        let markup_ids = decode_index(&tables.markup_index);
        let mut strings = HashMap::new();
        for record in string_records(&tables.strings) {
            let (offset, text) = record?;
            // Catalogs written before a reopen may hold repeats; keep the first.
            strings.entry(text.to_string()).or_insert(offset);
        }

        let mut builder = Self {
            api_ids,
            assembly_ids,
            markup_ids,
            strings,
            ..Self::default()
        };
        let (packages, frameworks) = {
            let view = CatalogView::new(builder_tables(&tables, &builder));
            let packages: HashMap<_, _> = view
                .packages()
                .map(|p| ((p.id().to_ascii_lowercase(), p.version().to_string()), p.offset()))
                .collect();
            let frameworks: HashMap<_, _> = view
                .frameworks()
                .map(|f| (f.name().to_string(), f.offset()))
                .collect();
            (packages, frameworks)
        };
        builder.packages = packages;
        builder.frameworks = frameworks;
        builder.tables = tables;

        tracing::debug!(
            target = "apicat.catalog",
            apis = builder.api_ids.len(),
            assemblies = builder.assembly_ids.len(),
            markups = builder.markup_ids.len(),
            packages = builder.packages.len(),
            strings = builder.strings.len(),
            "reopened catalog for merging"
        );
        Ok(builder)
    }

    pub fn view(&self) -> CatalogView<'_> {
        CatalogView::new(builder_tables(&self.tables, self))
    }

    fn intern(&mut self, text: &str) -> Result<u32, CatalogError> {
        if let Some(offset) = self.strings.get(text) {
            return Ok(*offset);
        }
        let offset = push_str(&mut self.tables.strings, text)?;
        self.strings.insert(text.to_string(), offset);
        Ok(offset)
    }

    /// Inserts an API node, or returns the offset of the node with this id.
    ///
    /// A new node is appended to its parent's children (or the root list when
    /// `parent` is `None`).
    pub fn insert_api(
        &mut self,
        id: CatalogId,
        kind: ApiKind,
        parent: Option<u32>,
        name: &str,
    ) -> Result<u32, CatalogError> {
        if let Some(offset) = self.api_ids.get(&id) {
            let existing = read_kind(&self.tables.apis, *offset);
            if existing != kind {
                tracing::warn!(
                    target = "apicat.catalog",
                    id = %id,
                    existing = ?existing,
                    inserted = ?kind,
                    name,
                    "api id reused with a different kind; keeping the first"
                );
            }
            return Ok(*offset);
        }

        let name = self.intern(name)?;
        let offset = next_offset(&self.tables.apis, "api")?;

        let mut record = [0u8; API_RECORD];
        record[..CatalogId::LEN].copy_from_slice(id.as_bytes());
        record[API_KIND] = kind.as_u8();
        write_u32(&mut record, API_PARENT, parent.unwrap_or(NONE));
        write_u32(&mut record, API_NAME, name);
        for field in [
            API_FIRST_CHILD,
            API_LAST_CHILD,
            API_NEXT_SIBLING,
            API_FIRST_DECLARATION,
            API_LAST_DECLARATION,
        ] {
            write_u32(&mut record, field, NONE);
        }
        self.tables.apis.extend_from_slice(&record);

        match parent {
            Some(parent) => {
                let apis = &mut self.tables.apis;
                let parent_at = parent as usize;
                match link(read_u32(apis, parent_at + API_LAST_CHILD)) {
                    Some(last) => write_u32(apis, last as usize + API_NEXT_SIBLING, offset),
                    None => write_u32(apis, parent_at + API_FIRST_CHILD, offset),
                }
                write_u32(apis, parent_at + API_LAST_CHILD, offset);
            }
            None => self.tables.roots.extend_from_slice(&offset.to_le_bytes()),
        }

        self.api_ids.insert(id, offset);
        Ok(offset)
    }

    /// Inserts an assembly. Returns its offset and whether it was new.
    pub fn insert_assembly(
        &mut self,
        id: CatalogId,
        name: &str,
        version: &str,
        public_key_token: &str,
    ) -> Result<(u32, bool), CatalogError> {
        if let Some(offset) = self.assembly_ids.get(&id) {
            return Ok((*offset, false));
        }

        let name = self.intern(name)?;
        let version = self.intern(version)?;
        let public_key_token = self.intern(public_key_token)?;
        let offset = next_offset(&self.tables.assemblies, "assembly")?;

        let mut record = [0u8; ASSEMBLY_RECORD];
        record[..CatalogId::LEN].copy_from_slice(id.as_bytes());
        write_u32(&mut record, ASSEMBLY_NAME, name);
        write_u32(&mut record, ASSEMBLY_VERSION, version);
        write_u32(&mut record, ASSEMBLY_PUBLIC_KEY_TOKEN, public_key_token);
        write_u32(&mut record, ASSEMBLY_FIRST_AVAILABILITY, NONE);
        write_u32(&mut record, ASSEMBLY_LAST_AVAILABILITY, NONE);
        self.tables.assemblies.extend_from_slice(&record);

        self.assembly_ids.insert(id, offset);
        Ok((offset, true))
    }

    /// Stores `markup` once per fingerprint and returns its offset.
    pub fn insert_markup(&mut self, markup: &Markup) -> Result<u32, CatalogError> {
        let fingerprint = markup.fingerprint();
        if let Some(offset) = self.markup_ids.get(&fingerprint) {
            return Ok(*offset);
        }

        let texts = markup
            .parts()
            .iter()
            .map(|part| self.intern(&part.text))
            .collect::<Result<Vec<_>, _>>()?;
        let offset = push_markup(&mut self.tables.markups, markup, &texts)?;
        self.markup_ids.insert(fingerprint, offset);
        Ok(offset)
    }

    /// Appends a declaration of `api` in `assembly`. Never deduplicates; the
    /// caller decides whether an assembly's declarations are new.
    pub fn insert_declaration(
        &mut self,
        api: u32,
        assembly: u32,
        markup: &Markup,
    ) -> Result<u32, CatalogError> {
        let markup = self.insert_markup(markup)?;
        let offset = next_offset(&self.tables.declarations, "declaration")?;

        let mut record = [0u8; DECLARATION_RECORD];
        write_u32(&mut record, DECLARATION_API, api);
        write_u32(&mut record, DECLARATION_ASSEMBLY, assembly);
        write_u32(&mut record, DECLARATION_MARKUP, markup);
        write_u32(&mut record, DECLARATION_NEXT, NONE);
        self.tables.declarations.extend_from_slice(&record);

        let api_at = api as usize;
        match link(read_u32(&self.tables.apis, api_at + API_LAST_DECLARATION)) {
            Some(last) => write_u32(
                &mut self.tables.declarations,
                last as usize + DECLARATION_NEXT,
                offset,
            ),
            None => write_u32(&mut self.tables.apis, api_at + API_FIRST_DECLARATION, offset),
        }
        write_u32(&mut self.tables.apis, api_at + API_LAST_DECLARATION, offset);
        Ok(offset)
    }

    /// Inserts a package version. Ids compare case-insensitively.
    pub fn insert_package(&mut self, id: &str, version: &str) -> Result<u32, CatalogError> {
        let key = (id.to_ascii_lowercase(), version.to_string());
        if let Some(offset) = self.packages.get(&key) {
            return Ok(*offset);
        }

        let id = self.intern(id)?;
        let version = self.intern(version)?;
        let offset = next_offset(&self.tables.packages, "package")?;
        self.tables.packages.extend_from_slice(&id.to_le_bytes());
        self.tables.packages.extend_from_slice(&version.to_le_bytes());
        self.packages.insert(key, offset);
        Ok(offset)
    }

    pub fn insert_framework(&mut self, name: &str) -> Result<u32, CatalogError> {
        if let Some(offset) = self.frameworks.get(name) {
            return Ok(*offset);
        }

        let text = self.intern(name)?;
        let offset = next_offset(&self.tables.frameworks, "framework")?;
        self.tables.frameworks.extend_from_slice(&text.to_le_bytes());
        self.frameworks.insert(name.to_string(), offset);
        Ok(offset)
    }

    /// Records that `assembly` ships in `package` for `framework`. Returns
    /// `false` when that triple was already recorded.
    pub fn add_availability(
        &mut self,
        assembly: u32,
        package: u32,
        framework: u32,
    ) -> Result<bool, CatalogError> {
        let known = self
            .view()
            .assembly(assembly)
            .availability()
            .any(|a| a.package().offset() == package && a.framework().offset() == framework);
        if known {
            return Ok(false);
        }

        let offset = next_offset(&self.tables.availability, "availability")?;
        let mut record = [0u8; AVAILABILITY_RECORD];
        write_u32(&mut record, AVAILABILITY_ASSEMBLY, assembly);
        write_u32(&mut record, AVAILABILITY_PACKAGE, package);
        write_u32(&mut record, AVAILABILITY_FRAMEWORK, framework);
        write_u32(&mut record, AVAILABILITY_NEXT, NONE);
        self.tables.availability.extend_from_slice(&record);

        let assembly_at = assembly as usize;
        match link(read_u32(
            &self.tables.assemblies,
            assembly_at + ASSEMBLY_LAST_AVAILABILITY,
        )) {
            Some(last) => write_u32(
                &mut self.tables.availability,
                last as usize + AVAILABILITY_NEXT,
                offset,
            ),
            None => write_u32(
                &mut self.tables.assemblies,
                assembly_at + ASSEMBLY_FIRST_AVAILABILITY,
                offset,
            ),
        }
        write_u32(
            &mut self.tables.assemblies,
            assembly_at + ASSEMBLY_LAST_AVAILABILITY,
            offset,
        );
        Ok(true)
    }

    /// Writes the catalog to `path`, replacing any previous file atomically.
    pub fn save(&mut self, path: &Path, options: WriteArchiveOptions) -> Result<(), CatalogError> {
        self.tables.api_index = encode_index(&self.api_ids);
        self.tables.assembly_index = encode_index(&self.assembly_ids);
        self.tables.markup_index = encode_index(&self.markup_ids);

        self.tables.save(path, options)?;

        let stats = self.view().stats();
        tracing::debug!(
            target = "apicat.catalog",
            path = %path.display(),
            apis = stats.apis,
            assemblies = stats.assemblies,
            declarations = stats.declarations,
            markups = stats.markups,
            "saved catalog"
        );
        Ok(())
    }

    /// Saves the catalog and reopens it read-only.
    pub fn freeze(mut self, path: &Path, options: WriteArchiveOptions) -> Result<Catalog, CatalogError> {
        self.save(path, options)?;
        drop(self);
        Catalog::open(path)
    }
}

fn builder_tables<'a>(tables: &'a CatalogTables, builder: &'a CatalogBuilder) -> Tables<'a> {
    Tables {
        strings: &tables.strings,
        markups: &tables.markups,
        apis: &tables.apis,
        assemblies: &tables.assemblies,
        declarations: &tables.declarations,
        packages: &tables.packages,
        frameworks: &tables.frameworks,
        availability: &tables.availability,
        roots: &tables.roots,
        api_index: IdIndex::Hashed(&builder.api_ids),
        assembly_index: IdIndex::Hashed(&builder.assembly_ids),
        markup_index: IdIndex::Hashed(&builder.markup_ids),
    }
}
