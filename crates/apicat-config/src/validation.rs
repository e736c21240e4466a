use crate::diagnostics::{ConfigDiagnostics, ConfigValidationError, ConfigWarning};
use crate::{ApicatConfig, CatalogCompression, LoggingConfig, PackageLocation};

impl ApicatConfig {
    /// Checks semantic constraints, reporting every problem in one pass.
    #[must_use]
    pub fn validate(&self) -> ConfigDiagnostics {
        let mut out = ConfigDiagnostics::default();
        validate_catalog(self, &mut out);
        validate_packages(self, &mut out);
        validate_frameworks(self, &mut out);
        validate_indexer(self, &mut out);
        validate_logging(self, &mut out);
        out
    }
}

fn invalid(out: &mut ConfigDiagnostics, toml_path: &str, message: impl Into<String>) {
    out.errors.push(ConfigValidationError::InvalidValue {
        toml_path: toml_path.to_owned(),
        message: message.into(),
    });
}

fn validate_catalog(config: &ApicatConfig, out: &mut ConfigDiagnostics) {
    let catalog = &config.catalog;
    if catalog.path.as_os_str().is_empty() {
        invalid(out, "catalog.path", "must not be empty");
    }
    match catalog.compression {
        CatalogCompression::Zstd if !(1..=22).contains(&catalog.zstd_level) => {
            invalid(out, "catalog.zstd_level", "must be between 1 and 22");
        }
        CatalogCompression::None | CatalogCompression::Auto
            if catalog.zstd_level != crate::CatalogConfig::default().zstd_level =>
        {
            out.warnings.push(ConfigWarning::ZstdLevelIgnored {
                level: catalog.zstd_level,
            });
        }
        _ => {}
    }
}

fn validate_packages(config: &ApicatConfig, out: &mut ConfigDiagnostics) {
    let packages = &config.packages;
    if packages.timeout_ms == 0 {
        invalid(out, "packages.timeout_ms", "must be >= 1");
    }
    match packages.location() {
        PackageLocation::Http(template) => {
            for placeholder in ["{id}", "{version}"] {
                if !template.contains(placeholder) {
                    invalid(
                        out,
                        "packages.source",
                        format!("URL template must contain {placeholder}"),
                    );
                }
            }
        }
        PackageLocation::Directory(dir) => {
            if dir.as_os_str().is_empty() {
                invalid(out, "packages.source", "must not be empty");
            }
        }
    }
}

fn validate_frameworks(config: &ApicatConfig, out: &mut ConfigDiagnostics) {
    // Relative roots are only meaningful once resolved against the config file.
    let root = &config.frameworks.root;
    if root.is_absolute() && !root.is_dir() {
        out.warnings.push(ConfigWarning::FrameworksRootMissing { path: root.clone() });
    }
}

fn validate_indexer(config: &ApicatConfig, out: &mut ConfigDiagnostics) {
    if config.indexer.queue_capacity == 0 {
        invalid(out, "indexer.queue_capacity", "must be >= 1");
    }
}

fn validate_logging(config: &ApicatConfig, out: &mut ConfigDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
