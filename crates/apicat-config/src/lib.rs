use std::path::{Path, PathBuf};
use std::time::Duration;

use apicat_storage::{WriteArchiveOptions, WriteCompression};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

mod diagnostics;
mod logging;
mod schema;
mod validation;

pub use diagnostics::{ConfigDiagnostics, ConfigValidationError, ConfigWarning};
pub use logging::init_tracing;
pub use schema::json_schema;

/// Environment variable naming the config file to load.
pub const APICAT_CONFIG_ENV_VAR: &str = "APICAT_CONFIG_PATH";

/// Public flat-container feed used when no package source is configured.
pub const DEFAULT_PACKAGE_SOURCE: &str =
    "https://api.nuget.org/v3-flatcontainer/{id}/{version}/{id}.{version}.nupkg";

/// Top-level apicat configuration loaded from TOML.
///
/// ```toml
/// [catalog]
/// path = "catalog/apicat.bin"
/// compression = "zstd" # "none" | "zstd" | "auto"
///
/// [packages]
/// source = "./feed" # a directory, or an URL template with {id} and {version}
/// timeout_ms = 30000
///
/// [frameworks]
/// root = "./frameworks"
/// reference_packs = true
///
/// [indexer]
/// workers = 4
///
/// [logging]
/// level = "info,apicat.packages=debug"
/// ```
///
/// Relative paths are resolved against the directory of the config file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct ApicatConfig {
    /// Where the catalog lives and how it is written.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Where packages are fetched from.
    #[serde(default)]
    pub packages: PackagesConfig,

    /// Where platform reference assemblies are found.
    #[serde(default)]
    pub frameworks: FrameworksConfig,

    /// Batch indexing settings.
    #[serde(default)]
    pub indexer: IndexerConfig,

    /// Logging settings for all apicat crates.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CatalogCompression {
    /// Stored uncompressed and memory-mapped on open.
    #[default]
    None,
    /// Always zstd-compressed.
    Zstd,
    /// Compressed once the payload reaches `catalog.auto_threshold_bytes`.
    Auto,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Catalog file path.
    #[serde(default = "CatalogConfig::default_path")]
    #[schemars(with = "String")]
    pub path: PathBuf,

    #[serde(default)]
    pub compression: CatalogCompression,

    /// Zstd level used when `compression = "zstd"`.
    #[serde(default = "CatalogConfig::default_zstd_level")]
    #[schemars(range(min = 1, max = 22))]
    pub zstd_level: i32,

    /// Payload size from which `compression = "auto"` compresses.
    #[serde(default = "CatalogConfig::default_auto_threshold_bytes")]
    pub auto_threshold_bytes: u64,

    /// Re-read and verify the catalog after writing it.
    #[serde(default)]
    pub validate_after_write: bool,
}

impl CatalogConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("apicat.catalog")
    }

    fn default_zstd_level() -> i32 {
        3
    }

    fn default_auto_threshold_bytes() -> u64 {
        64 * 1024 * 1024
    }

    pub fn write_options(&self) -> WriteArchiveOptions {
        let compression = match self.compression {
            CatalogCompression::None => WriteCompression::None,
            CatalogCompression::Zstd => WriteCompression::Zstd {
                level: self.zstd_level,
            },
            CatalogCompression::Auto => WriteCompression::Auto {
                threshold: self.auto_threshold_bytes,
            },
        };
        WriteArchiveOptions {
            compression,
            validate_after_write: self.validate_after_write,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            compression: CatalogCompression::default(),
            zstd_level: Self::default_zstd_level(),
            auto_threshold_bytes: Self::default_auto_threshold_bytes(),
            validate_after_write: false,
        }
    }
}

/// Where [`PackagesConfig::source`] points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageLocation {
    Directory(PathBuf),
    /// URL template with `{id}` and `{version}` placeholders.
    Http(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct PackagesConfig {
    /// A flat-container directory, or an `http(s)` URL template containing
    /// `{id}` and `{version}`.
    #[serde(default = "PackagesConfig::default_source")]
    pub source: String,

    /// Per-request timeout of the HTTP source.
    #[serde(default = "PackagesConfig::default_timeout_ms")]
    #[schemars(range(min = 1))]
    pub timeout_ms: u64,
}

impl PackagesConfig {
    fn default_source() -> String {
        DEFAULT_PACKAGE_SOURCE.to_owned()
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }

    pub fn location(&self) -> PackageLocation {
        match Url::parse(&self.source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                PackageLocation::Http(self.source.clone())
            }
            _ => PackageLocation::Directory(PathBuf::from(&self.source)),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            source: Self::default_source(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct FrameworksConfig {
    /// Directory holding `archived/<framework>/` and `portable/<profile>/`
    /// reference sets.
    #[serde(default = "FrameworksConfig::default_root")]
    #[schemars(with = "String")]
    pub root: PathBuf,

    /// Fall back to reference packs from the package source.
    #[serde(default = "FrameworksConfig::default_reference_packs")]
    pub reference_packs: bool,
}

impl FrameworksConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("frameworks")
    }

    fn default_reference_packs() -> bool {
        true
    }
}

impl Default for FrameworksConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            reference_packs: Self::default_reference_packs(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct IndexerConfig {
    /// Extraction threads. `0` uses the available parallelism.
    #[serde(default)]
    pub workers: usize,

    /// Results buffered between the workers and the catalog writer.
    #[serde(default = "IndexerConfig::default_queue_capacity")]
    #[schemars(range(min = 1))]
    pub queue_capacity: usize,
}

impl IndexerConfig {
    fn default_queue_capacity() -> usize {
        16
    }

    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.workers
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, events are filtered but dropped.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective filter: `level`, with `RUST_LOG` merged in when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a source snippet; keep just the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ApicatConfig {
    /// Loads a config file. Relative paths in it are resolved against the
    /// file's directory. Unknown keys are logged and ignored; validation
    /// errors fail the load.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let (config, diagnostics) = Self::load_from_path_with_diagnostics(path)?;
        for key in &diagnostics.unknown_keys {
            tracing::warn!(target = "apicat.config", key = %key, "ignoring unknown config key");
        }
        for warning in &diagnostics.warnings {
            tracing::warn!(target = "apicat.config", warning = %warning, "config warning");
        }
        match diagnostics.errors.first() {
            Some(error) => Err(ConfigError::Invalid(error.to_string())),
            None => Ok(config),
        }
    }

    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let (mut config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<ApicatConfig>(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative_paths(dir);
        }

        let mut diagnostics = config.validate();
        diagnostics.unknown_keys = unknown_keys;
        Ok((config, diagnostics))
    }

    /// Parses a config from TOML text without touching relative paths.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<ApicatConfig>(text)?;
        let mut diagnostics = config.validate();
        diagnostics.unknown_keys = unknown_keys;
        Ok((config, diagnostics))
    }

    /// Makes relative paths absolute against `base`.
    pub fn resolve_relative_paths(&mut self, base: &Path) {
        if self.catalog.path.is_relative() {
            self.catalog.path = base.join(&self.catalog.path);
        }
        if self.frameworks.root.is_relative() {
            self.frameworks.root = base.join(&self.frameworks.root);
        }
        if let PackageLocation::Directory(dir) = self.packages.location() {
            if dir.is_relative() {
                self.packages.source = base.join(dir).display().to_string();
            }
        }
    }
}

/// The config file to load: `explicit` when given, otherwise
/// [`APICAT_CONFIG_ENV_VAR`], otherwise `apicat.toml` or `.apicat.toml` in
/// `dir`.
pub fn discover_config_path(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = std::env::var_os(APICAT_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        return Some(if candidate.is_absolute() {
            candidate
        } else {
            dir.join(candidate)
        });
    }
    ["apicat.toml", ".apicat.toml"]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Loads the config found by [`discover_config_path`], or the defaults when
/// there is none.
pub fn load(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<(ApicatConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(explicit, dir) else {
        return Ok((ApicatConfig::default(), None));
    };
    let config = ApicatConfig::load_from_path(&path)?;
    tracing::debug!(target = "apicat.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}
