use std::collections::BTreeSet;
use std::fmt;

use apicat_core::{ApiKind, CatalogId};
use apicat_markup::{nest, Markup};
use serde::Serialize;

use crate::tables::*;

/// Read access to a catalog, shared by [`crate::CatalogBuilder`] and the
/// frozen [`crate::Catalog`].
///
/// Lookups by offset are O(1) seeks; offsets that do not point at a record
/// panic.
#[derive(Clone, Copy)]
pub struct CatalogView<'a> {
    tables: Tables<'a>,
}

impl fmt::Debug for CatalogView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogView")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Record counts and table sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStats {
    pub apis: usize,
    pub root_apis: usize,
    pub assemblies: usize,
    pub declarations: usize,
    pub markups: usize,
    pub packages: usize,
    pub frameworks: usize,
    pub availability: usize,
    pub string_bytes: usize,
    pub markup_bytes: usize,
}

impl<'a> CatalogView<'a> {
    pub(crate) fn new(tables: Tables<'a>) -> Self {
        Self { tables }
    }

    pub fn api(&self, offset: u32) -> ApiRef<'a> {
        assert!(
            offset as usize + API_RECORD <= self.tables.apis.len(),
            "api offset {offset} out of bounds"
        );
        ApiRef {
            tables: self.tables,
            offset,
        }
    }

    pub fn api_by_id(&self, id: CatalogId) -> Option<ApiRef<'a>> {
        self.tables.api_index.get(&id).map(|offset| self.api(offset))
    }

    pub fn assembly(&self, offset: u32) -> AssemblyRef<'a> {
        assert!(
            offset as usize + ASSEMBLY_RECORD <= self.tables.assemblies.len(),
            "assembly offset {offset} out of bounds"
        );
        AssemblyRef {
            tables: self.tables,
            offset,
        }
    }

    pub fn assembly_by_id(&self, id: CatalogId) -> Option<AssemblyRef<'a>> {
        self.tables
            .assembly_index
            .get(&id)
            .map(|offset| self.assembly(offset))
    }

    pub fn markup(&self, offset: u32) -> Markup {
        read_markup(self.tables.markups, self.tables.strings, offset)
    }

    /// Offset of the stored markup with this fingerprint.
    pub fn markup_offset(&self, fingerprint: CatalogId) -> Option<u32> {
        self.tables.markup_index.get(&fingerprint)
    }

    /// APIs without a parent (namespaces), in insertion order.
    pub fn root_apis(&self) -> impl Iterator<Item = ApiRef<'a>> + 'a {
        let tables = self.tables;
        tables
            .roots
            .chunks_exact(ROOT_RECORD)
            .map(move |entry| ApiRef {
                tables,
                offset: read_u32(entry, 0),
            })
    }

    /// Every API in table order.
    pub fn apis(&self) -> impl Iterator<Item = ApiRef<'a>> + 'a {
        let tables = self.tables;
        (0..tables.apis.len() / API_RECORD).map(move |i| ApiRef {
            tables,
            offset: (i * API_RECORD) as u32,
        })
    }

    pub fn assemblies(&self) -> impl Iterator<Item = AssemblyRef<'a>> + 'a {
        let tables = self.tables;
        (0..tables.assemblies.len() / ASSEMBLY_RECORD).map(move |i| AssemblyRef {
            tables,
            offset: (i * ASSEMBLY_RECORD) as u32,
        })
    }

    pub fn packages(&self) -> impl Iterator<Item = PackageRef<'a>> + 'a {
        let tables = self.tables;
        (0..tables.packages.len() / PACKAGE_RECORD).map(move |i| PackageRef {
            tables,
            offset: (i * PACKAGE_RECORD) as u32,
        })
    }

    pub fn frameworks(&self) -> impl Iterator<Item = FrameworkRef<'a>> + 'a {
        let tables = self.tables;
        (0..tables.frameworks.len() / FRAMEWORK_RECORD).map(move |i| FrameworkRef {
            tables,
            offset: (i * FRAMEWORK_RECORD) as u32,
        })
    }

    /// APIs whose display name equals `name`.
    pub fn apis_named<'n>(&self, name: &'n str) -> impl Iterator<Item = ApiRef<'a>> + 'n
    where
        'a: 'n,
    {
        self.apis().filter(move |api| api.name() == name)
    }

    /// The declaration of `api` in `assembly`, if the assembly declares it.
    pub fn declaration(
        &self,
        api: ApiRef<'a>,
        assembly: AssemblyRef<'a>,
    ) -> Option<DeclarationRef<'a>> {
        api.declaration_in(assembly)
    }

    pub fn stats(&self) -> CatalogStats {
        let t = &self.tables;
        CatalogStats {
            apis: t.apis.len() / API_RECORD,
            root_apis: t.roots.len() / ROOT_RECORD,
            assemblies: t.assemblies.len() / ASSEMBLY_RECORD,
            declarations: t.declarations.len() / DECLARATION_RECORD,
            markups: t.markup_index.len(),
            packages: t.packages.len() / PACKAGE_RECORD,
            frameworks: t.frameworks.len() / FRAMEWORK_RECORD,
            availability: t.availability.len() / AVAILABILITY_RECORD,
            string_bytes: t.strings.len(),
            markup_bytes: t.markups.len(),
        }
    }
}

macro_rules! record_ref {
    ($name:ident) => {
        #[derive(Clone, Copy)]
        pub struct $name<'a> {
            tables: Tables<'a>,
            offset: u32,
        }

        impl<'a> $name<'a> {
            /// Byte offset of the record inside its table.
            pub fn offset(&self) -> u32 {
                self.offset
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.offset == other.offset
            }
        }

        impl Eq for $name<'_> {}
    };
}

record_ref!(ApiRef);
record_ref!(AssemblyRef);
record_ref!(DeclarationRef);
record_ref!(PackageRef);
record_ref!(FrameworkRef);
record_ref!(AvailabilityRef);

impl<'a> ApiRef<'a> {
    fn field(&self, at: usize) -> u32 {
        read_u32(self.tables.apis, self.offset as usize + at)
    }

    fn at(&self, offset: u32) -> ApiRef<'a> {
        ApiRef {
            tables: self.tables,
            offset,
        }
    }

    pub fn id(&self) -> CatalogId {
        read_id(self.tables.apis, self.offset as usize)
    }

    pub fn kind(&self) -> ApiKind {
        read_kind(self.tables.apis, self.offset)
    }

    pub fn name(&self) -> &'a str {
        read_str(self.tables.strings, self.field(API_NAME))
    }

    pub fn parent(&self) -> Option<ApiRef<'a>> {
        link(self.field(API_PARENT)).map(|offset| self.at(offset))
    }

    /// Parent, grandparent, ... up to the root namespace.
    pub fn ancestors(&self) -> impl Iterator<Item = ApiRef<'a>> + 'a {
        std::iter::successors(self.parent(), |api| api.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = ApiRef<'a>> + 'a {
        let first = link(self.field(API_FIRST_CHILD)).map(|offset| self.at(offset));
        std::iter::successors(first, |api| {
            link(api.field(API_NEXT_SIBLING)).map(|offset| api.at(offset))
        })
    }

    /// Declarations in insertion order.
    pub fn declarations(&self) -> impl Iterator<Item = DeclarationRef<'a>> + 'a {
        let tables = self.tables;
        let first = link(self.field(API_FIRST_DECLARATION)).map(|offset| DeclarationRef {
            tables,
            offset,
        });
        std::iter::successors(first, move |declaration| {
            link(declaration.field(DECLARATION_NEXT)).map(|offset| DeclarationRef {
                tables,
                offset,
            })
        })
    }

    pub fn declaration_in(&self, assembly: AssemblyRef<'a>) -> Option<DeclarationRef<'a>> {
        self.declarations()
            .find(|declaration| declaration.field(DECLARATION_ASSEMBLY) == assembly.offset)
    }

    /// Names of the frameworks under which some declaring assembly ships.
    pub fn frameworks(&self) -> BTreeSet<&'a str> {
        self.declarations()
            .flat_map(|declaration| declaration.assembly().availability())
            .map(|availability| availability.framework().name())
            .collect()
    }

    /// Namespace-qualified display path, e.g. `System.Collections.List<T>.Add(T)`.
    pub fn full_name(&self) -> String {
        let mut names: Vec<&str> = self.ancestors().map(|api| api.name()).collect();
        names.reverse();
        names.push(self.name());
        names.join(".")
    }
}

impl fmt::Debug for ApiRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRef")
            .field("offset", &self.offset)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl<'a> AssemblyRef<'a> {
    fn field(&self, at: usize) -> u32 {
        read_u32(self.tables.assemblies, self.offset as usize + at)
    }

    pub fn id(&self) -> CatalogId {
        read_id(self.tables.assemblies, self.offset as usize)
    }

    pub fn name(&self) -> &'a str {
        read_str(self.tables.strings, self.field(ASSEMBLY_NAME))
    }

    pub fn version(&self) -> &'a str {
        read_str(self.tables.strings, self.field(ASSEMBLY_VERSION))
    }

    pub fn public_key_token(&self) -> &'a str {
        read_str(self.tables.strings, self.field(ASSEMBLY_PUBLIC_KEY_TOKEN))
    }

    /// (package, framework) pairs the assembly ships in, in insertion order.
    pub fn availability(&self) -> impl Iterator<Item = AvailabilityRef<'a>> + 'a {
        let tables = self.tables;
        let first = link(self.field(ASSEMBLY_FIRST_AVAILABILITY))
            .map(|offset| AvailabilityRef { tables, offset });
        std::iter::successors(first, move |availability| {
            link(availability.field(AVAILABILITY_NEXT))
                .map(|offset| AvailabilityRef { tables, offset })
        })
    }

    /// Distinct framework names the assembly is available for.
    pub fn frameworks(&self) -> BTreeSet<&'a str> {
        self.availability()
            .map(|availability| availability.framework().name())
            .collect()
    }

    /// Root APIs this assembly declares something under.
    pub fn root_apis(&self) -> impl Iterator<Item = ApiRef<'a>> + 'a {
        let assembly = *self;
        CatalogView::new(self.tables)
            .root_apis()
            .filter(move |api| api.declaration_in(assembly).is_some())
    }
}

impl fmt::Debug for AssemblyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyRef")
            .field("offset", &self.offset)
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}

impl<'a> DeclarationRef<'a> {
    fn field(&self, at: usize) -> u32 {
        read_u32(self.tables.declarations, self.offset as usize + at)
    }

    pub fn api(&self) -> ApiRef<'a> {
        ApiRef {
            tables: self.tables,
            offset: self.field(DECLARATION_API),
        }
    }

    pub fn assembly(&self) -> AssemblyRef<'a> {
        AssemblyRef {
            tables: self.tables,
            offset: self.field(DECLARATION_ASSEMBLY),
        }
    }

    pub fn markup_offset(&self) -> u32 {
        self.field(DECLARATION_MARKUP)
    }

    /// The declaration's own markup.
    pub fn markup(&self) -> Markup {
        read_markup(self.tables.markups, self.tables.strings, self.markup_offset())
    }

    /// The declaration nested inside the declarations of its ancestors in the
    /// same assembly, each level wrapped in braces and indented.
    ///
    /// Ancestors the assembly has no declaration for are left out.
    pub fn render(&self) -> Markup {
        let assembly = self.assembly();
        let mut levels: Vec<Markup> = self
            .api()
            .ancestors()
            .filter_map(|api| api.declaration_in(assembly))
            .map(|declaration| declaration.markup())
            .collect();
        levels.reverse();
        levels.push(self.markup());
        nest(&levels)
    }
}

impl fmt::Debug for DeclarationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclarationRef")
            .field("offset", &self.offset)
            .field("api", &self.api())
            .field("assembly", &self.assembly())
            .finish()
    }
}

impl<'a> PackageRef<'a> {
    pub fn id(&self) -> &'a str {
        read_str(self.tables.strings, read_u32(self.tables.packages, self.offset as usize))
    }

    pub fn version(&self) -> &'a str {
        read_str(
            self.tables.strings,
            read_u32(self.tables.packages, self.offset as usize + 4),
        )
    }
}

impl fmt::Debug for PackageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageRef({} {})", self.id(), self.version())
    }
}

impl<'a> FrameworkRef<'a> {
    pub fn name(&self) -> &'a str {
        read_str(
            self.tables.strings,
            read_u32(self.tables.frameworks, self.offset as usize),
        )
    }
}

impl fmt::Debug for FrameworkRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameworkRef({})", self.name())
    }
}

impl<'a> AvailabilityRef<'a> {
    fn field(&self, at: usize) -> u32 {
        read_u32(self.tables.availability, self.offset as usize + at)
    }

    pub fn assembly(&self) -> AssemblyRef<'a> {
        AssemblyRef {
            tables: self.tables,
            offset: self.field(AVAILABILITY_ASSEMBLY),
        }
    }

    pub fn package(&self) -> PackageRef<'a> {
        PackageRef {
            tables: self.tables,
            offset: self.field(AVAILABILITY_PACKAGE),
        }
    }

    pub fn framework(&self) -> FrameworkRef<'a> {
        FrameworkRef {
            tables: self.tables,
            offset: self.field(AVAILABILITY_FRAMEWORK),
        }
    }
}

impl fmt::Debug for AvailabilityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityRef")
            .field("package", &self.package())
            .field("framework", &self.framework())
            .finish()
    }
}
