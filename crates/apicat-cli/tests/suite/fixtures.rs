use std::io::{Cursor, Write};
use std::path::Path;

use apicat_catalog::CatalogBuilder;
use apicat_core::{ApiKind, CatalogId};
use apicat_markup::Markup;
use apicat_storage::WriteArchiveOptions;
use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use zip::write::SimpleFileOptions;

pub fn apicat() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("apicat"))
}

const WIDGET_APIS: [(&str, ApiKind, &str, &str); 3] = [
    (
        "N:Contoso",
        ApiKind::Namespace,
        "Contoso",
        "<k>namespace</k> Contoso",
    ),
    (
        "T:Contoso.Widget",
        ApiKind::Class,
        "Widget",
        "<k>public</k> <k>class</k> Widget",
    ),
    (
        "M:Contoso.Widget.Run",
        ApiKind::Method,
        "Run()",
        "<k>public</k> <k>void</k> Run<p>(</p><p>)</p><p>;</p>",
    ),
];

/// Writes a catalog holding `Contoso.Widget` from `Contoso.Widgets 1.0.0` on net45.
pub fn write_widget_catalog(path: &Path) {
    let mut builder = CatalogBuilder::new();
    let assembly_id = CatalogId::for_api_set(WIDGET_APIS.iter().map(|(doc_id, ..)| *doc_id));
    let (assembly, _) = builder
        .insert_assembly(assembly_id, "Contoso.Widgets", "1.0.0.0", "b77a5c561934e089")
        .unwrap();

    let mut parent = None;
    for (doc_id, kind, name, declaration) in WIDGET_APIS {
        let api = builder
            .insert_api(CatalogId::for_documentation_id(doc_id), kind, parent, name)
            .unwrap();
        builder
            .insert_declaration(api, assembly, &Markup::parse(declaration).unwrap())
            .unwrap();
        parent = Some(api);
    }

    let package = builder.insert_package("Contoso.Widgets", "1.0.0").unwrap();
    let framework = builder.insert_framework("net45").unwrap();
    builder.add_availability(assembly, package, framework).unwrap();
    builder.save(path, WriteArchiveOptions::default()).unwrap();
}

pub fn widget_id() -> CatalogId {
    CatalogId::for_documentation_id("T:Contoso.Widget")
}

/// Writes `<feed>/<id>/<version>/<id>.<version>.nupkg` with the given
/// dependency groups and files.
pub fn publish_package(
    feed: &Path,
    id: &str,
    version: &str,
    groups: &[(&str, Vec<(&str, &str)>)],
    files: &[(&str, &[u8])],
) {
    let mut dependencies = String::new();
    for (target, deps) in groups {
        dependencies.push_str(&format!("<group targetFramework=\"{target}\">"));
        for (dep, range) in deps {
            dependencies.push_str(&format!("<dependency id=\"{dep}\" version=\"{range}\" />"));
        }
        dependencies.push_str("</group>");
    }
    let nuspec = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <dependencies>{dependencies}</dependencies>
  </metadata>
</package>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file(format!("{id}.nuspec"), options).unwrap();
    zip.write_all(nuspec.as_bytes()).unwrap();
    for (file, bytes) in files {
        zip.start_file(*file, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    let bytes = zip.finish().unwrap().into_inner();

    let source = apicat_packages::DirectorySource::new(feed);
    let version = apicat_packages::PackageVersion::parse(version).unwrap();
    let path = source.package_path(id, &version);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Writes `apicat.toml` pointing at `<temp>/feed` and an offline `net45`
/// reference set under `<temp>/frameworks`. `extra` is appended verbatim.
pub fn write_config(temp: &TempDir, extra: &str) {
    let feed = temp.child("feed");
    feed.create_dir_all().unwrap();
    let frameworks = temp.child("frameworks");
    frameworks
        .child("archived/net45/mscorlib.dll")
        .write_binary(b"mscorlib")
        .unwrap();
    temp.child("apicat.toml")
        .write_str(&format!(
            "[packages]\nsource = '{}'\n\n[frameworks]\nroot = '{}'\nreference_packs = false\n{extra}",
            feed.path().display(),
            frameworks.path().display()
        ))
        .unwrap();
}
