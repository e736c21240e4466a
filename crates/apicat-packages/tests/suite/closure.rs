use apicat_packages::{
    resolve_platform, DependencyClosure, FetchScope, PackageSource, PackageVersion, ResolveError,
};
use apicat_platform::PlatformMoniker;

use super::fixtures::{CountingSource, PackageFixture};

fn net45() -> PlatformMoniker {
    PlatformMoniker::parse("net45").unwrap()
}

/// Root -> A 1.0, B 1.0; A -> D 1.0; B -> D 2.0.
fn publish_diamond(feed: &std::path::Path) {
    PackageFixture::new("Root", "1.0.0")
        .group("net45", &[("A", "1.0"), ("B", "1.0")])
        .file("lib/net45/Root.dll", b"root")
        .publish(feed);
    PackageFixture::new("A", "1.0.0")
        .group("net45", &[("D", "1.0")])
        .file("lib/net45/A.dll", b"a")
        .publish(feed);
    PackageFixture::new("B", "1.0.0")
        .group("net45", &[("D", "[2.0,3.0)")])
        .file("lib/net45/B.dll", b"b")
        .publish(feed);
    PackageFixture::new("D", "1.0.0")
        .file("lib/net45/D.dll", b"d1")
        .publish(feed);
    PackageFixture::new("D", "2.0.0")
        .file("lib/net45/D.dll", b"d2")
        .publish(feed);
}

#[test]
fn higher_minimum_version_wins() {
    let feed = tempfile::tempdir().unwrap();
    publish_diamond(feed.path());

    let source = CountingSource::new(feed.path());
    let root = source.fetch("Root", &PackageVersion::new(1, 0, 0)).unwrap();
    let scope = FetchScope::new(&source);
    let closure = DependencyClosure::resolve(root.as_ref(), &net45(), &scope).unwrap();

    assert_eq!(closure.len(), 3);
    let d = closure.get("d").unwrap();
    assert_eq!(d.identity().version, PackageVersion::new(2, 0, 0));

    let ids: Vec<String> = closure
        .packages()
        .map(|archive| archive.identity().to_string())
        .collect();
    assert_eq!(ids, ["A 1.0.0", "B 1.0.0", "D 2.0.0"]);

    let references = closure.reference_files(&net45()).unwrap();
    let d_dll = references
        .iter()
        .find(|file| file.path == "lib/net45/D.dll")
        .unwrap();
    assert_eq!(d_dll.bytes, b"d2");
}

#[test]
fn fetch_scope_memoizes_archives() {
    let feed = tempfile::tempdir().unwrap();
    publish_diamond(feed.path());

    let source = CountingSource::new(feed.path());
    let root = source.fetch("Root", &PackageVersion::new(1, 0, 0)).unwrap();
    let scope = FetchScope::new(&source);

    DependencyClosure::resolve(root.as_ref(), &net45(), &scope).unwrap();
    let after_first = source.fetches();
    // Root, then A, D 1.0, B, D 2.0 through the scope.
    assert_eq!(after_first, 5);
    assert_eq!(scope.len(), 4);

    DependencyClosure::resolve(root.as_ref(), &net45(), &scope).unwrap();
    assert_eq!(source.fetches(), after_first);
}

#[test]
fn missing_dependency_fails_the_closure() {
    let feed = tempfile::tempdir().unwrap();
    PackageFixture::new("Lonely", "1.0.0")
        .group("net45", &[("Ghost", "1.0")])
        .file("lib/net45/Lonely.dll", b"x")
        .publish(feed.path());

    let source = CountingSource::new(feed.path());
    let root = source.fetch("Lonely", &PackageVersion::new(1, 0, 0)).unwrap();
    let scope = FetchScope::new(&source);

    let err = resolve_platform(root.as_ref(), &net45(), &scope).unwrap_err();
    assert!(
        matches!(&err, ResolveError::PackageNotFound { id, .. } if id == "Ghost"),
        "{err}"
    );
}

#[test]
fn unbounded_dependency_is_an_error() {
    let feed = tempfile::tempdir().unwrap();
    PackageFixture::new("Open", "1.0.0")
        .group("net45", &[("Anything", "(,2.0]")])
        .file("lib/net45/Open.dll", b"x")
        .publish(feed.path());

    let source = CountingSource::new(feed.path());
    let root = source.fetch("Open", &PackageVersion::new(1, 0, 0)).unwrap();
    let scope = FetchScope::new(&source);
    let err = DependencyClosure::resolve(root.as_ref(), &net45(), &scope).unwrap_err();
    assert!(matches!(err, ResolveError::UnboundedDependency { .. }), "{err}");
}

#[test]
fn dependency_group_follows_nearest_platform() {
    let feed = tempfile::tempdir().unwrap();
    PackageFixture::new("Split", "1.0.0")
        .group("net45", &[("Legacy", "1.0")])
        .group("netstandard2.0", &[])
        .file("lib/net45/Split.dll", b"x")
        .file("lib/netstandard2.0/Split.dll", b"y")
        .publish(feed.path());
    PackageFixture::new("Legacy", "1.0.0")
        .file("lib/net45/Legacy.dll", b"l")
        .publish(feed.path());

    let source = CountingSource::new(feed.path());
    let root = source.fetch("Split", &PackageVersion::new(1, 0, 0)).unwrap();
    let scope = FetchScope::new(&source);

    let modern = resolve_platform(
        root.as_ref(),
        &PlatformMoniker::parse("net6.0").unwrap(),
        &scope,
    )
    .unwrap()
    .unwrap();
    assert!(modern.closure.is_empty());
    assert_eq!(modern.references.items, ["lib/netstandard2.0/Split.dll"]);

    let legacy = resolve_platform(
        root.as_ref(),
        &PlatformMoniker::parse("net48").unwrap(),
        &scope,
    )
    .unwrap()
    .unwrap();
    assert_eq!(legacy.closure.len(), 1);
    assert!(legacy.closure.get("Legacy").is_some());
    assert_eq!(legacy.references.items, ["lib/net45/Split.dll"]);
}
