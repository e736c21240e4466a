use apicat_platform::{FrameworkSpecific, PlatformMoniker};

use crate::error::ResolveError;
use crate::range::VersionRange;
use crate::version::PackageVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    pub id: String,
    pub range: VersionRange,
}

/// Dependencies declared for one target platform. Nuspecs with a flat
/// `<dependencies>` list produce a single group for [`PlatformMoniker::any`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub platform: PlatformMoniker,
    pub dependencies: Vec<PackageDependency>,
}

impl FrameworkSpecific for DependencyGroup {
    fn platform(&self) -> &PlatformMoniker {
        &self.platform
    }
}

/// The parts of a package manifest the resolver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nuspec {
    pub id: String,
    pub version: PackageVersion,
    pub dependency_groups: Vec<DependencyGroup>,
}

impl Nuspec {
    /// Parses a `.nuspec` document. Element names are matched without their
    /// namespace since manifests use several schema namespaces.
    pub fn parse(package: &str, text: &str) -> Result<Self, ResolveError> {
        let error = |message: String| ResolveError::Nuspec {
            package: package.to_string(),
            message,
        };

        let doc = roxmltree::Document::parse(text).map_err(|err| error(err.to_string()))?;
        let root = doc.root_element();
        let metadata = child_element(&root, "metadata")
            .ok_or_else(|| error("missing <metadata>".to_string()))?;

        let id = child_text(&metadata, "id").ok_or_else(|| error("missing <id>".to_string()))?;
        let version = child_text(&metadata, "version")
            .ok_or_else(|| error("missing <version>".to_string()))?;
        let version = PackageVersion::parse(&version)?;

        let mut dependency_groups = Vec::new();
        if let Some(dependencies) = child_element(&metadata, "dependencies") {
            let flat = parse_dependencies(&dependencies)?;
            if !flat.is_empty() {
                dependency_groups.push(DependencyGroup {
                    platform: PlatformMoniker::any(),
                    dependencies: flat,
                });
            }

            for group in dependencies
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "group")
            {
                let platform = match group.attribute("targetFramework") {
                    None => PlatformMoniker::any(),
                    Some(text) => match PlatformMoniker::parse(text) {
                        Ok(platform) => platform,
                        Err(err) => {
                            tracing::debug!(
                                target = "apicat.packages",
                                package,
                                target_framework = text,
                                error = %err,
                                "skipping dependency group with unrecognized target framework"
                            );
                            continue;
                        }
                    },
                };
                dependency_groups.push(DependencyGroup {
                    platform,
                    dependencies: parse_dependencies(&group)?,
                });
            }
        }

        Ok(Self {
            id,
            version,
            dependency_groups,
        })
    }
}

fn parse_dependencies(node: &roxmltree::Node<'_, '_>) -> Result<Vec<PackageDependency>, ResolveError> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "dependency")
        .filter_map(|dep| {
            let id = dep.attribute("id")?.trim();
            (!id.is_empty()).then(|| -> Result<PackageDependency, ResolveError> {
                let range = VersionRange::parse(dep.attribute("version").unwrap_or_default())?;
                Ok(PackageDependency {
                    id: id.to_string(),
                    range,
                })
            })
        })
        .collect()
}

fn child_element<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
