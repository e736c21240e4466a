use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apicat_packages::{
    DirectorySource, PackageArchive, PackageSource, PackageVersion, ResolveError,
};
use zip::write::SimpleFileOptions;

/// A `.nupkg` under construction.
pub struct PackageFixture {
    id: String,
    version: String,
    groups: Vec<(Option<String>, Vec<(String, String)>)>,
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
            Some(target.to_string()),
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
            match target {
                Some(target) => groups.push_str(&format!("<group targetFramework=\"{target}\">")),
                None => groups.push_str("<group>"),
            }
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

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file(format!("{}.nuspec", self.id), options).unwrap();
        zip.write_all(self.nuspec().as_bytes()).unwrap();
        for (path, bytes) in &self.files {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Writes the package into a flat-container directory.
    pub fn publish(&self, feed: &Path) {
        let source = DirectorySource::new(feed);
        let version = PackageVersion::parse(&self.version).unwrap();
        let path = source.package_path(&self.id, &version);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

/// Counts fetches that reach the underlying source.
pub struct CountingSource {
    pub inner: DirectorySource,
    pub fetches: AtomicUsize,
}

impl CountingSource {
    pub fn new(feed: &Path) -> Self {
        Self {
            inner: DirectorySource::new(feed),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PackageSource for CountingSource {
    fn fetch(
        &self,
        id: &str,
        version: &PackageVersion,
    ) -> Result<Arc<dyn PackageArchive>, ResolveError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(id, version)
    }
}
