use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use apicat_core::{Accessibility, ApiKind};
use apicat_indexer::{
    AssemblyInfo, IndexError, ManifestSymbolProvider, PackageIndexer, Symbol, SymbolIdx,
    SymbolProvider, SymbolTree,
};
use apicat_packages::{default_locators, DirectorySource, PackageVersion, ReferenceFile};
use zip::write::SimpleFileOptions;

/// A `.nupkg` under construction.
pub struct PackageFixture {
    id: String,
    version: String,
    groups: Vec<(String, Vec<(String, String)>)>,
    files: Vec<(String, Vec<u8>)>,
}

impl PackageFixture {
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            id: id.to_string(),
            version: version.to_string(),
            groups: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn group(mut self, target: &str, deps: &[(&str, &str)]) -> Self {
        self.groups.push((
            target.to_string(),
            deps.iter()
                .map(|(id, range)| (id.to_string(), range.to_string()))
                .collect(),
        ));
        self
    }

    pub fn file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.push((path.to_string(), bytes.to_vec()));
        self
    }

    fn nuspec(&self) -> String {
        let mut groups = String::new();
        for (target, deps) in &self.groups {
            groups.push_str(&format!("<group targetFramework=\"{target}\">"));
            for (id, range) in deps {
                groups.push_str(&format!("<dependency id=\"{id}\" version=\"{range}\" />"));
            }
            groups.push_str("</group>");
        }
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{}</id>
    <version>{}</version>
    <dependencies>{groups}</dependencies>
  </metadata>
</package>"#,
            self.id, self.version
        )
    }

    pub fn publish(&self, feed: &Path) {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file(format!("{}.nuspec", self.id), options).unwrap();
        zip.write_all(self.nuspec().as_bytes()).unwrap();
        for (path, bytes) in &self.files {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        let source = DirectorySource::new(feed);
        let version = PackageVersion::parse(&self.version).unwrap();
        let path = source.package_path(&self.id, &version);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }
}

/// Builds the JSON symbol manifest that stands in for an assembly.
pub struct ManifestFixture {
    tree: SymbolTree,
}

impl ManifestFixture {
    pub fn new(assembly: &str, version: &str) -> Self {
        Self {
            tree: SymbolTree::new(AssemblyInfo {
                name: assembly.to_string(),
                version: version.to_string(),
                public_key_token: "b77a5c561934e089".to_string(),
            }),
        }
    }

    pub fn symbol(
        &mut self,
        kind: ApiKind,
        name: &str,
        documentation_id: &str,
        accessibility: Accessibility,
        parent: Option<SymbolIdx>,
        declaration: &str,
    ) -> SymbolIdx {
        self.tree.push(Symbol {
            kind,
            name: name.to_string(),
            documentation_id: documentation_id.to_string(),
            accessibility,
            parent,
            declaration: declaration.to_string(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.tree).unwrap()
    }
}

/// `Contoso.Widget` with one public method and an internal helper type.
pub fn widget_manifest(assembly: &str) -> Vec<u8> {
    let mut manifest = ManifestFixture::new(assembly, "1.0.0.0");
    let ns = manifest.symbol(
        ApiKind::Namespace,
        "Contoso",
        "N:Contoso",
        Accessibility::Public,
        None,
        "<k>namespace</k> Contoso",
    );
    let widget = manifest.symbol(
        ApiKind::Class,
        "Widget",
        "T:Contoso.Widget",
        Accessibility::Public,
        Some(ns),
        "<k>public</k> <k>class</k> Widget",
    );
    manifest.symbol(
        ApiKind::Method,
        "Run()",
        "M:Contoso.Widget.Run",
        Accessibility::Public,
        Some(widget),
        "<k>public</k> <k>void</k> Run<p>(</p><p>)</p><p>;</p>",
    );
    manifest.symbol(
        ApiKind::Class,
        "Helper",
        "T:Contoso.Helper",
        Accessibility::Internal,
        Some(ns),
        "<k>internal</k> <k>class</k> Helper",
    );
    manifest.to_bytes()
}

/// A package feed plus an offline frameworks directory.
pub struct Workspace {
    pub feed: tempfile::TempDir,
    pub frameworks: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            feed: tempfile::tempdir().unwrap(),
            frameworks: tempfile::tempdir().unwrap(),
        }
    }

    /// Makes `framework` resolvable through the archived locator.
    pub fn archive_framework(&self, framework: &str) {
        let dir = self.frameworks.path().join("archived").join(framework);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("mscorlib.dll"), b"mscorlib").unwrap();
    }

    pub fn indexer(&self) -> PackageIndexer {
        self.indexer_with(Arc::new(ManifestSymbolProvider))
    }

    pub fn indexer_with(&self, symbols: Arc<dyn SymbolProvider>) -> PackageIndexer {
        PackageIndexer::new(
            Arc::new(DirectorySource::new(self.feed.path())),
            default_locators(self.frameworks.path(), None),
            symbols,
        )
    }
}

/// Records the reference paths every load was given.
#[derive(Default)]
pub struct RecordingProvider {
    pub loads: Mutex<Vec<(String, Vec<String>)>>,
}

impl SymbolProvider for RecordingProvider {
    fn load(
        &self,
        assembly: &ReferenceFile,
        references: &[ReferenceFile],
    ) -> Result<SymbolTree, IndexError> {
        self.loads.lock().unwrap().push((
            assembly.path.clone(),
            references.iter().map(|file| file.path.clone()).collect(),
        ));
        ManifestSymbolProvider.load(assembly, references)
    }
}

pub fn version(text: &str) -> PackageVersion {
    PackageVersion::parse(text).unwrap()
}
