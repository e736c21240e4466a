use std::path::{Path, PathBuf};

use apicat_config::{
    discover_config_path, ApicatConfig, CatalogCompression, ConfigError, ConfigValidationError,
    ConfigWarning, PackageLocation, DEFAULT_PACKAGE_SOURCE,
};
use apicat_storage::WriteCompression;
use tempfile::tempdir;

#[test]
fn empty_config_uses_defaults() {
    let (config, diagnostics) = ApicatConfig::load_from_str_with_diagnostics("").unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(config, ApicatConfig::default());
    assert_eq!(config.catalog.path, PathBuf::from("apicat.catalog"));
    assert_eq!(config.catalog.write_options().compression, WriteCompression::None);
    assert_eq!(
        config.packages.location(),
        PackageLocation::Http(DEFAULT_PACKAGE_SOURCE.to_string())
    );
    assert!(config.frameworks.reference_packs);
    assert!(config.indexer.worker_count() >= 1);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
}

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[catalog]
compresion = "zstd"

[packages]
timeout = 5
"#;
    let (_config, diagnostics) = ApicatConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["catalog.compresion", "packages.timeout", "typo"]
    );
    assert!(diagnostics.is_ok());
}

#[test]
fn compression_maps_to_write_options() {
    let text = r#"
[catalog]
compression = "zstd"
zstd_level = 9
validate_after_write = true
"#;
    let (config, diagnostics) = ApicatConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(config.catalog.compression, CatalogCompression::Zstd);
    let options = config.catalog.write_options();
    assert_eq!(options.compression, WriteCompression::Zstd { level: 9 });
    assert!(options.validate_after_write);

    let (config, _) = ApicatConfig::load_from_str_with_diagnostics(
        "[catalog]\ncompression = \"auto\"\nauto_threshold_bytes = 1024\n",
    )
    .unwrap();
    assert_eq!(
        config.catalog.write_options().compression,
        WriteCompression::Auto { threshold: 1024 }
    );
}

#[test]
fn semantic_errors_are_collected() {
    let text = r#"
[catalog]
compression = "zstd"
zstd_level = 40

[packages]
source = "https://example.org/packages/{id}.nupkg"
timeout_ms = 0

[logging]
level = "info,apicat=notalevel"
"#;
    let (_config, diagnostics) = ApicatConfig::load_from_str_with_diagnostics(text).unwrap();
    let paths: Vec<_> = diagnostics
        .errors
        .iter()
        .map(|error| match error {
            ConfigValidationError::InvalidValue { toml_path, .. } => toml_path.as_str(),
            _ => "other",
        })
        .collect();
    assert_eq!(
        paths,
        ["catalog.zstd_level", "packages.timeout_ms", "packages.source"]
    );
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

#[test]
fn load_from_path_rejects_invalid_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("apicat.toml");
    std::fs::write(&path, "[packages]\ntimeout_ms = 0\n").unwrap();

    let err = ApicatConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    assert!(err.to_string().contains("packages.timeout_ms"));

    std::fs::write(&path, "[packages\n").unwrap();
    let err = ApicatConfig::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn relative_paths_resolve_against_the_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("apicat.toml");
    std::fs::write(
        &path,
        r#"
[catalog]
path = "out/catalog.bin"

[packages]
source = "feed"

[frameworks]
root = "/opt/frameworks"
"#,
    )
    .unwrap();

    let config = ApicatConfig::load_from_path(&path).unwrap();
    assert_eq!(config.catalog.path, dir.path().join("out/catalog.bin"));
    assert_eq!(
        config.packages.location(),
        PackageLocation::Directory(dir.path().join("feed"))
    );
    assert_eq!(config.frameworks.root, Path::new("/opt/frameworks"));
}

#[test]
fn explicit_path_wins_over_discovery() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".apicat.toml"), "").unwrap();

    let explicit = dir.path().join("custom.toml");
    assert_eq!(
        discover_config_path(Some(&explicit), dir.path()),
        Some(explicit.clone())
    );
    if std::env::var_os(apicat_config::APICAT_CONFIG_ENV_VAR).is_none() {
        assert_eq!(
            discover_config_path(None, dir.path()),
            Some(dir.path().join(".apicat.toml"))
        );
        let empty = tempdir().unwrap();
        assert_eq!(discover_config_path(None, empty.path()), None);
    }
}
