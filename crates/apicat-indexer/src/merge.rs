use apicat_catalog::{CatalogBuilder, CatalogError, CatalogStats};
use serde::Serialize;

use crate::package::PackageIndex;

/// Records a merge added to the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub apis: usize,
    pub assemblies: usize,
    pub declarations: usize,
    pub markups: usize,
    pub availability: usize,
}

impl MergeStats {
    fn between(before: &CatalogStats, after: &CatalogStats) -> Self {
        Self {
            apis: after.apis - before.apis,
            assemblies: after.assemblies - before.assemblies,
            declarations: after.declarations - before.declarations,
            markups: after.markups - before.markups,
            availability: after.availability - before.availability,
        }
    }

    pub fn add(&mut self, other: MergeStats) {
        self.apis += other.apis;
        self.assemblies += other.assemblies;
        self.declarations += other.declarations;
        self.markups += other.markups;
        self.availability += other.availability;
    }
}

impl PackageIndex {
    /// Merges the package into `builder`.
    ///
    /// APIs and declarations are only written for assemblies the catalog has
    /// not seen yet; a known assembly id means the same surface was already
    /// merged, so it only gains an availability record. Merging the same
    /// package twice is a no-op.
    pub fn merge_into(&self, builder: &mut CatalogBuilder) -> Result<MergeStats, CatalogError> {
        let before = builder.view().stats();
        let package = builder.insert_package(&self.id, &self.version)?;

        for framework in &self.frameworks {
            let framework_offset = builder.insert_framework(&framework.framework)?;
            for assembly in &framework.assemblies {
                let (offset, added) = builder.insert_assembly(
                    assembly.id,
                    &assembly.name,
                    &assembly.version,
                    &assembly.public_key_token,
                )?;
                if added {
                    let mut apis: Vec<u32> = Vec::with_capacity(assembly.apis.len());
                    for api in &assembly.apis {
                        let parent = api.parent.map(|parent| apis[parent]);
                        let api_offset = builder.insert_api(api.id, api.kind, parent, &api.name)?;
                        builder.insert_declaration(api_offset, offset, &api.markup)?;
                        apis.push(api_offset);
                    }
                }
                builder.add_availability(offset, package, framework_offset)?;
            }
        }

        let stats = MergeStats::between(&before, &builder.view().stats());
        tracing::debug!(
            target = "apicat.indexer",
            package = %self.id,
            version = %self.version,
            apis = stats.apis,
            assemblies = stats.assemblies,
            declarations = stats.declarations,
            "merged package"
        );
        Ok(stats)
    }
}
