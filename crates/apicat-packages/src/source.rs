use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::archive::{NupkgArchive, PackageArchive};
use crate::error::ResolveError;
use crate::version::PackageVersion;

/// Where package archives come from.
pub trait PackageSource: Send + Sync {
    fn fetch(&self, id: &str, version: &PackageVersion)
        -> Result<Arc<dyn PackageArchive>, ResolveError>;
}

/// File name of a package inside a flat container: `<id>.<version>.nupkg`,
/// both lowercase.
pub fn nupkg_file_name(id: &str, version: &PackageVersion) -> String {
    format!(
        "{}.{}.nupkg",
        id.to_ascii_lowercase(),
        version.to_normalized_string().to_ascii_lowercase()
    )
}

/// A local flat container: `<root>/<id>/<version>/<id>.<version>.nupkg`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_path(&self, id: &str, version: &PackageVersion) -> PathBuf {
        self.root
            .join(id.to_ascii_lowercase())
            .join(version.to_normalized_string().to_ascii_lowercase())
            .join(nupkg_file_name(id, version))
    }
}

impl PackageSource for DirectorySource {
    fn fetch(
        &self,
        id: &str,
        version: &PackageVersion,
    ) -> Result<Arc<dyn PackageArchive>, ResolveError> {
        let path = self.package_path(id, version);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResolveError::PackageNotFound {
                    id: id.to_string(),
                    version: version.to_normalized_string(),
                })
            }
            Err(source) => return Err(ResolveError::Io { path, source }),
        };

        tracing::debug!(
            target = "apicat.packages",
            id,
            version = %version,
            path = %path.display(),
            "read package from directory"
        );
        Ok(Arc::new(NupkgArchive::from_bytes(id, bytes)?))
    }
}

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://api.nuget.org/v3-flatcontainer/{id}/{version}/{id}.{version}.nupkg";

/// Largest archive the HTTP source downloads.
const MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// An HTTP flat container. `{id}` and `{version}` in the URL template are
/// replaced by the lowercase id and normalized version.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url_template: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            url_template: url_template.into(),
            agent,
        }
    }

    pub fn package_url(&self, id: &str, version: &PackageVersion) -> String {
        self.url_template
            .replace("{id}", &id.to_ascii_lowercase())
            .replace(
                "{version}",
                &version.to_normalized_string().to_ascii_lowercase(),
            )
    }
}

impl PackageSource for HttpSource {
    fn fetch(
        &self,
        id: &str,
        version: &PackageVersion,
    ) -> Result<Arc<dyn PackageArchive>, ResolveError> {
        let url = self.package_url(id, version);
        let response = self.agent.get(&url).call().map_err(|err| match err {
            ureq::Error::Status(404, _) => ResolveError::PackageNotFound {
                id: id.to_string(),
                version: version.to_normalized_string(),
            },
            ureq::Error::Status(code, _) => ResolveError::Transport {
                url: url.clone(),
                message: format!("server returned status {code}"),
            },
            ureq::Error::Transport(transport) => ResolveError::Transport {
                url: url.clone(),
                message: transport.to_string(),
            },
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_DOWNLOAD_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|err| ResolveError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;

        tracing::debug!(
            target = "apicat.packages",
            id,
            version = %version,
            url = %url,
            len = bytes.len(),
            "downloaded package"
        );
        Ok(Arc::new(NupkgArchive::from_bytes(id, bytes)?))
    }
}
