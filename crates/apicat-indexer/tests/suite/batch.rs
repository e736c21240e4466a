use apicat_catalog::CatalogBuilder;
use apicat_core::{Accessibility, ApiKind};
use apicat_indexer::{BatchIndexer, PackageRequest};

use super::fixtures::{version, widget_manifest, ManifestFixture, PackageFixture, Workspace};

fn gadget_manifest() -> Vec<u8> {
    let mut manifest = ManifestFixture::new("Fabrikam.Gadgets", "2.0.0.0");
    let ns = manifest.symbol(
        ApiKind::Namespace,
        "Fabrikam",
        "N:Fabrikam",
        Accessibility::Public,
        None,
        "<k>namespace</k> Fabrikam",
    );
    manifest.symbol(
        ApiKind::Struct,
        "Gadget",
        "T:Fabrikam.Gadget",
        Accessibility::Public,
        Some(ns),
        "<k>public</k> <k>struct</k> Gadget",
    );
    manifest.to_bytes()
}

#[test]
fn batch_merges_results_through_one_writer() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    ws.archive_framework("netstandard2.0");
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .file("lib/net45/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .publish(ws.feed.path());
    PackageFixture::new("Fabrikam.Gadgets", "2.0.0")
        .file("lib/netstandard2.0/Fabrikam.Gadgets.dll", &gadget_manifest())
        .publish(ws.feed.path());

    let requests = vec![
        PackageRequest::new("Contoso.Widgets", version("1.0.0")),
        PackageRequest::new("Missing.Package", version("3.0.0")),
        PackageRequest::new("Fabrikam.Gadgets", version("2.0.0")),
    ];
    let indexer = ws.indexer();
    let mut builder = CatalogBuilder::new();
    let report = BatchIndexer::new(2)
        .with_queue_capacity(1)
        .run(&indexer, &requests, &mut builder)
        .unwrap();

    let packages: Vec<_> = report.packages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(packages, ["Contoso.Widgets", "Fabrikam.Gadgets"]);
    assert_eq!(report.packages[1].frameworks, ["netstandard2.0"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "Missing.Package");
    assert_eq!(report.failures[0].version, "3.0.0");

    assert_eq!(report.merged.apis, 5);
    assert_eq!(report.merged.assemblies, 2);
    assert_eq!(report.merged.declarations, 5);

    let stats = builder.view().stats();
    assert_eq!(stats.packages, 2);
    assert_eq!(stats.frameworks, 2);
    assert_eq!(stats.root_apis, 2);

    // A second pass over the same packages changes nothing.
    let again = BatchIndexer::new(3)
        .run(&indexer, &requests, &mut builder)
        .unwrap();
    assert_eq!(again.merged, Default::default());
    assert_eq!(builder.view().stats(), stats);
}

#[test]
fn empty_batch_is_a_no_op() {
    let ws = Workspace::new();
    let mut builder = CatalogBuilder::new();
    let report = BatchIndexer::default()
        .run(&ws.indexer(), &[], &mut builder)
        .unwrap();
    assert!(report.packages.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(builder.view().stats().apis, 0);
}
