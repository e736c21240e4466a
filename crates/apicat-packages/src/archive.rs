use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};

use apicat_platform::{FrameworkSpecific, PlatformMoniker};
use zip::ZipArchive;

use crate::error::ResolveError;
use crate::nuspec::{DependencyGroup, Nuspec};
use crate::version::PackageVersion;

/// Package id plus version. Ids compare case-insensitively.
#[derive(Debug, Clone)]
pub struct PackageIdentity {
    pub id: String,
    pub version: PackageVersion,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Lowercase id, the key used for closures and file layouts.
    pub fn key(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version == other.version
    }
}

impl Eq for PackageIdentity {}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version.to_normalized_string())
    }
}

/// Files of a package grouped under one target platform folder
/// (`lib/net45/`, `ref/netstandard2.0/`).
///
/// A group can be empty: a `_._` placeholder marks a platform the package
/// supports without shipping assemblies for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub platform: PlatformMoniker,
    pub items: Vec<String>,
}

impl FrameworkSpecific for FileGroup {
    fn platform(&self) -> &PlatformMoniker {
        &self.platform
    }
}

/// Read access to one package archive.
pub trait PackageArchive: Send + Sync {
    fn identity(&self) -> &PackageIdentity;

    fn nuspec(&self) -> &Nuspec;

    /// All file paths in the archive, `/`-separated.
    fn files(&self) -> &[String];

    fn read(&self, path: &str) -> Result<Vec<u8>, ResolveError>;

    fn dependency_groups(&self) -> &[DependencyGroup] {
        &self.nuspec().dependency_groups
    }

    /// Assemblies under `lib/<platform>/`.
    fn lib_groups(&self) -> Vec<FileGroup> {
        group_files(&self.identity().id, self.files(), "lib")
    }

    /// Compile-time reference assemblies: `ref/<platform>/` when the package
    /// has a `ref` folder, `lib/<platform>/` otherwise.
    fn reference_groups(&self) -> Vec<FileGroup> {
        let refs = group_files(&self.identity().id, self.files(), "ref");
        if refs.is_empty() {
            self.lib_groups()
        } else {
            refs
        }
    }

    /// Every platform the package ships assets for, deduplicated and ordered
    /// by short folder name.
    fn target_platforms(&self) -> Vec<PlatformMoniker> {
        let mut platforms = BTreeMap::new();
        for group in self.reference_groups().into_iter().chain(self.lib_groups()) {
            platforms
                .entry(group.platform.short_folder_name())
                .or_insert(group.platform);
        }
        platforms.into_values().collect()
    }
}

fn group_files(package: &str, files: &[String], root: &str) -> Vec<FileGroup> {
    let mut groups: BTreeMap<String, FileGroup> = BTreeMap::new();

    for path in files {
        let mut segments = path.split('/');
        if !segments.next().is_some_and(|s| s.eq_ignore_ascii_case(root)) {
            continue;
        }
        let (folder, file) = match (segments.next(), segments.next(), segments.next()) {
            (Some(file), None, _) => (None, file),
            (Some(folder), Some(file), None) => (Some(folder), file),
            _ => continue,
        };

        let placeholder = file == "_._";
        if !placeholder && !is_assembly(file) {
            continue;
        }

        let platform = match folder {
            None => PlatformMoniker::any(),
            Some(folder) => match PlatformMoniker::parse(folder) {
                Ok(platform) => platform,
                Err(err) => {
                    tracing::debug!(
                        target = "apicat.packages",
                        package,
                        folder,
                        error = %err,
                        "ignoring asset folder with unrecognized platform"
                    );
                    continue;
                }
            },
        };

        let group = groups
            .entry(platform.short_folder_name())
            .or_insert_with(|| FileGroup {
                platform,
                items: Vec::new(),
            });
        if !placeholder {
            group.items.push(path.clone());
        }
    }

    groups.into_values().collect()
}

fn is_assembly(file: &str) -> bool {
    file.len() > 4
        && file.is_char_boundary(file.len() - 4)
        && file[file.len() - 4..].eq_ignore_ascii_case(".dll")
}

/// A `.nupkg` (zip) archive held in memory.
pub struct NupkgArchive {
    identity: PackageIdentity,
    nuspec: Nuspec,
    files: Vec<String>,
    bytes: Vec<u8>,
}

impl fmt::Debug for NupkgArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NupkgArchive")
            .field("identity", &self.identity)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

impl NupkgArchive {
    /// Opens an archive from its bytes. `name` labels errors until the
    /// manifest has been read.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, ResolveError> {
        let zip_error = |source| ResolveError::Archive {
            package: name.to_string(),
            source,
        };

        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice())).map_err(zip_error)?;
        let files: Vec<String> = zip.file_names().map(str::to_string).collect();

        let nuspec_path = files
            .iter()
            .find(|path| !path.contains('/') && path.to_ascii_lowercase().ends_with(".nuspec"))
            .cloned()
            .ok_or_else(|| ResolveError::MissingEntry {
                package: name.to_string(),
                entry: "*.nuspec".to_string(),
            })?;

        let mut text = String::new();
        zip.by_name(&nuspec_path)
            .map_err(zip_error)?
            .read_to_string(&mut text)
            .map_err(|source| ResolveError::Nuspec {
                package: name.to_string(),
                message: source.to_string(),
            })?;
        let nuspec = Nuspec::parse(name, &text)?;
        let identity = PackageIdentity::new(nuspec.id.clone(), nuspec.version.clone());
        drop(zip);

        Ok(Self {
            identity,
            nuspec,
            files,
            bytes,
        })
    }
}

impl PackageArchive for NupkgArchive {
    fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    fn nuspec(&self) -> &Nuspec {
        &self.nuspec
    }

    fn files(&self) -> &[String] {
        &self.files
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        let package = self.identity.to_string();
        let mut zip = ZipArchive::new(Cursor::new(self.bytes.as_slice())).map_err(|source| {
            ResolveError::Archive {
                package: package.clone(),
                source,
            }
        })?;
        let mut entry = match zip.by_name(path) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ResolveError::MissingEntry {
                    package,
                    entry: path.to_string(),
                })
            }
            Err(source) => return Err(ResolveError::Archive { package, source }),
        };
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|source| ResolveError::Archive {
                package: package.clone(),
                source: source.into(),
            })?;
        Ok(buf)
    }
}
