use std::sync::Arc;

use apicat_packages::{
    default_locators, locate_platform, DirectorySource, PackBasedFrameworkLocator,
    FrameworkLocator,
};
use apicat_platform::PlatformMoniker;

use super::fixtures::PackageFixture;

#[test]
fn reference_packs_come_from_the_source() {
    let feed = tempfile::tempdir().unwrap();
    PackageFixture::new("Microsoft.NETCore.App.Ref", "6.0.0")
        .file("ref/net6.0/System.Runtime.dll", b"runtime")
        .file("ref/net6.0/System.Runtime.xml", b"docs")
        .file("ref/net6.0/analyzers/Extra.dll", b"nested")
        .file("data/FrameworkList.xml", b"<list />")
        .publish(feed.path());

    let locator = PackBasedFrameworkLocator::new(Arc::new(DirectorySource::new(feed.path())));
    let set = locator
        .locate(&PlatformMoniker::parse("net6.0").unwrap())
        .unwrap()
        .unwrap();
    let paths: Vec<_> = set.files.iter().map(|file| file.path.as_str()).collect();
    assert_eq!(paths, ["ref/net6.0/System.Runtime.dll"]);

    // Not published: the locator passes.
    assert_eq!(
        locator
            .locate(&PlatformMoniker::parse("net7.0").unwrap())
            .unwrap(),
        None
    );
}

#[test]
fn archived_sets_win_over_packs() {
    let frameworks = tempfile::tempdir().unwrap();
    let archived = frameworks.path().join("archived").join("net6.0");
    std::fs::create_dir_all(&archived).unwrap();
    std::fs::write(archived.join("System.Runtime.dll"), b"archived").unwrap();

    let feed = tempfile::tempdir().unwrap();
    PackageFixture::new("Microsoft.NETCore.App.Ref", "6.0.0")
        .file("ref/net6.0/System.Runtime.dll", b"pack")
        .publish(feed.path());

    let locators = default_locators(
        frameworks.path(),
        Some(Arc::new(DirectorySource::new(feed.path()))),
    );
    let set = locate_platform(&locators, &PlatformMoniker::parse("net6.0").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(set.files.len(), 1);
    assert_eq!(set.files[0].bytes, b"archived");

    std::fs::remove_file(archived.join("System.Runtime.dll")).unwrap();
    let set = locate_platform(&locators, &PlatformMoniker::parse("net6.0").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(set.files[0].bytes, b"pack");
}
