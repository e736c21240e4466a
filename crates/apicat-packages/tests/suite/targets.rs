use apicat_packages::{reference_targets, NupkgArchive, PackageArchive, ResolveError};

use super::fixtures::PackageFixture;

fn short_names(targets: &[(apicat_platform::PlatformMoniker, apicat_packages::FileGroup)]) -> Vec<(String, Vec<String>)> {
    targets
        .iter()
        .map(|(platform, group)| (platform.short_folder_name(), group.items.clone()))
        .collect()
}

#[test]
fn lib_only_package_targets_every_lib_folder() {
    let bytes = PackageFixture::new("Contoso.Widgets", "1.2.0")
        .file("lib/net45/Contoso.Widgets.dll", b"45")
        .file("lib/netstandard2.0/Contoso.Widgets.dll", b"ns")
        .file("lib/netstandard2.0/Contoso.Widgets.xml", b"docs")
        .file("lib/net6.0/_._", b"")
        .file("content/readme.txt", b"hi")
        .to_bytes();
    let archive = NupkgArchive::from_bytes("Contoso.Widgets", bytes).unwrap();

    assert_eq!(archive.identity().id, "Contoso.Widgets");
    assert_eq!(archive.identity().version.to_normalized_string(), "1.2.0");

    let targets = reference_targets(&archive);
    assert_eq!(
        short_names(&targets),
        [
            ("net45".to_string(), vec!["lib/net45/Contoso.Widgets.dll".to_string()]),
            ("net6.0".to_string(), Vec::new()),
            (
                "netstandard2.0".to_string(),
                vec!["lib/netstandard2.0/Contoso.Widgets.dll".to_string()]
            ),
        ]
    );
}

#[test]
fn ref_folder_takes_precedence_and_incompatible_targets_are_dropped() {
    let bytes = PackageFixture::new("Contoso.Facade", "2.0.0")
        .file("lib/net45/Contoso.Facade.dll", b"impl45")
        .file("lib/netstandard2.0/Contoso.Facade.dll", b"impl")
        .file("ref/netstandard2.0/Contoso.Facade.dll", b"ref")
        .to_bytes();
    let archive = NupkgArchive::from_bytes("Contoso.Facade", bytes).unwrap();

    // net45 ships a lib but no reference group it can compile against.
    let targets = reference_targets(&archive);
    assert_eq!(
        short_names(&targets),
        [(
            "netstandard2.0".to_string(),
            vec!["ref/netstandard2.0/Contoso.Facade.dll".to_string()]
        )]
    );
    assert_eq!(
        archive.read("ref/netstandard2.0/Contoso.Facade.dll").unwrap(),
        b"ref"
    );
}

#[test]
fn missing_entries_and_manifests_are_reported() {
    let bytes = PackageFixture::new("Contoso.Widgets", "1.0.0").to_bytes();
    let archive = NupkgArchive::from_bytes("Contoso.Widgets", bytes).unwrap();
    let err = archive.read("lib/net45/Nope.dll").unwrap_err();
    assert!(matches!(err, ResolveError::MissingEntry { .. }), "{err}");

    let err = NupkgArchive::from_bytes("garbage", b"not a zip".to_vec()).unwrap_err();
    assert!(matches!(err, ResolveError::Archive { .. }), "{err}");
}
