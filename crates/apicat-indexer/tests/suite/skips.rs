use std::sync::Arc;

use apicat_indexer::IndexError;

use super::fixtures::{version, widget_manifest, PackageFixture, RecordingProvider, Workspace};

#[test]
fn platform_without_references_is_skipped() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .file("lib/net45/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .file(
            "lib/netstandard2.0/Contoso.Widgets.dll",
            &widget_manifest("Contoso.Widgets"),
        )
        .publish(ws.feed.path());

    let index = ws.indexer().index("Contoso.Widgets", &version("1.0.0")).unwrap();
    let indexed: Vec<_> = index.frameworks.iter().map(|f| f.framework.as_str()).collect();
    assert_eq!(indexed, ["net45"]);
    assert_eq!(index.skipped.len(), 1);
    assert_eq!(index.skipped[0].framework, "netstandard2.0");
    assert!(index.skipped[0].reason.contains("no reference assemblies"));
}

#[test]
fn retired_platform_is_dropped_silently() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .file("lib/net45/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .file("lib/sl4/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .publish(ws.feed.path());

    let index = ws.indexer().index("Contoso.Widgets", &version("1.0.0")).unwrap();
    assert_eq!(index.frameworks.len(), 1);
    assert!(index.skipped.is_empty(), "{:?}", index.skipped);
}

#[test]
fn missing_dependency_skips_only_its_platform() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    ws.archive_framework("net461");
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .group("net461", &[("Ghost", "1.0.0")])
        .group("net45", &[])
        .file("lib/net45/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .file("lib/net461/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .publish(ws.feed.path());

    let index = ws.indexer().index("Contoso.Widgets", &version("1.0.0")).unwrap();
    assert_eq!(index.frameworks.len(), 1);
    assert_eq!(index.frameworks[0].framework, "net45");
    assert_eq!(index.skipped.len(), 1);
    assert_eq!(index.skipped[0].framework, "net461");
    assert!(index.skipped[0].reason.contains("Ghost"), "{}", index.skipped[0].reason);
}

#[test]
fn broken_symbols_skip_the_platform() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .file("lib/net45/Contoso.Widgets.dll", b"MZ not a manifest")
        .publish(ws.feed.path());

    let index = ws.indexer().index("Contoso.Widgets", &version("1.0.0")).unwrap();
    assert!(index.frameworks.is_empty());
    assert_eq!(index.skipped.len(), 1);
    assert!(index.skipped[0].reason.contains("lib/net45/Contoso.Widgets.dll"));
}

#[test]
fn missing_package_is_an_error() {
    let ws = Workspace::new();
    let err = ws.indexer().index("Nope", &version("1.0.0")).unwrap_err();
    match err {
        IndexError::Resolve(err) => assert!(err.is_not_found(), "{err}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn symbols_see_dependencies_and_platform_references() {
    let ws = Workspace::new();
    ws.archive_framework("net45");
    PackageFixture::new("Contoso.Core", "1.2.0")
        .file("lib/net45/Contoso.Core.dll", b"core")
        .publish(ws.feed.path());
    PackageFixture::new("Contoso.Widgets", "1.0.0")
        .group("net45", &[("Contoso.Core", "1.2.0")])
        .file("lib/net45/Contoso.Widgets.dll", &widget_manifest("Contoso.Widgets"))
        .publish(ws.feed.path());

    let provider = Arc::new(RecordingProvider::default());
    let index = ws
        .indexer_with(provider.clone())
        .index("Contoso.Widgets", &version("1.0.0"))
        .unwrap();
    assert!(index.skipped.is_empty(), "{:?}", index.skipped);

    let loads = provider.loads.lock().unwrap();
    assert_eq!(loads.len(), 1);
    let (assembly, references) = &loads[0];
    assert_eq!(assembly, "lib/net45/Contoso.Widgets.dll");
    assert_eq!(references.len(), 3);
    assert_eq!(references[0], "lib/net45/Contoso.Widgets.dll");
    assert_eq!(references[1], "lib/net45/Contoso.Core.dll");
    assert!(references[2].ends_with("mscorlib.dll"), "{}", references[2]);
}
