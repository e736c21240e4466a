use std::thread;

use apicat_catalog::CatalogBuilder;
use apicat_packages::PackageVersion;
use crossbeam_channel as channel;
use serde::Serialize;

use crate::error::IndexError;
use crate::merge::MergeStats;
use crate::package::{PackageIndex, PackageIndexer, PlatformSkip};

const DEFAULT_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub id: String,
    pub version: PackageVersion,
}

impl PackageRequest {
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub id: String,
    pub version: String,
    pub frameworks: Vec<String>,
    pub skipped: Vec<PlatformSkip>,
    pub merged: MergeStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFailure {
    pub id: String,
    pub version: String,
    pub error: String,
}

/// Outcome of a batch, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub packages: Vec<PackageReport>,
    pub failures: Vec<PackageFailure>,
    pub merged: MergeStats,
}

/// Indexes many packages into one catalog.
///
/// Extraction runs on `workers` threads; results flow over a bounded queue to
/// the calling thread, which is the only one that touches the builder.
#[derive(Debug, Clone, Copy)]
pub struct BatchIndexer {
    workers: usize,
    queue_capacity: usize,
}

impl Default for BatchIndexer {
    fn default() -> Self {
        Self::new(thread::available_parallelism().map_or(1, |n| n.get()))
    }
}

impl BatchIndexer {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Indexes `requests` and merges every result into `builder`.
    ///
    /// A package that cannot be fetched is reported in
    /// [`BatchReport::failures`]. A catalog error stops the batch; packages
    /// merged before it stay in the builder.
    pub fn run(
        &self,
        indexer: &PackageIndexer,
        requests: &[PackageRequest],
        builder: &mut CatalogBuilder,
    ) -> Result<BatchReport, IndexError> {
        self.drive(
            requests,
            |request| indexer.index(&request.id, &request.version),
            |index| Ok(index.merge_into(builder)?),
        )
    }

    fn drive<I, M>(
        &self,
        requests: &[PackageRequest],
        index: I,
        mut merge: M,
    ) -> Result<BatchReport, IndexError>
    where
        I: Fn(&PackageRequest) -> Result<PackageIndex, IndexError> + Sync,
        M: FnMut(&PackageIndex) -> Result<MergeStats, IndexError>,
    {
        let (work_tx, work_rx) = channel::bounded::<(usize, &PackageRequest)>(self.queue_capacity);
        let (result_tx, result_rx) =
            channel::bounded::<(usize, Result<PackageIndex, IndexError>)>(self.queue_capacity);

        let mut reports: Vec<(usize, PackageReport)> = Vec::new();
        let mut failures: Vec<(usize, PackageFailure)> = Vec::new();
        let mut merged = MergeStats::default();
        let index = &index;

        thread::scope(|scope| -> Result<(), IndexError> {
            scope.spawn(move || {
                for item in requests.iter().enumerate() {
                    if work_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..self.workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (position, request) in work_rx {
                        if result_tx.send((position, index(request))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            drop(result_tx);

            // The receiver is owned here so that an early return disconnects
            // the workers before the scope joins them.
            let results = result_rx;
            for (position, result) in results {
                let request = &requests[position];
                match result {
                    Ok(package) => {
                        let stats = merge(&package)?;
                        merged.add(stats);
                        reports.push((
                            position,
                            PackageReport {
                                frameworks: package
                                    .frameworks
                                    .iter()
                                    .map(|framework| framework.framework.clone())
                                    .collect(),
                                id: package.id,
                                version: package.version,
                                skipped: package.skipped,
                                merged: stats,
                            },
                        ));
                    }
                    Err(err) => {
                        tracing::warn!(
                            target = "apicat.indexer",
                            package = %request.id,
                            version = %request.version,
                            error = %err,
                            "failed to index package"
                        );
                        failures.push((
                            position,
                            PackageFailure {
                                id: request.id.clone(),
                                version: request.version.to_normalized_string(),
                                error: err.to_string(),
                            },
                        ));
                    }
                }
            }
            Ok(())
        })?;

        reports.sort_by_key(|(position, _)| *position);
        failures.sort_by_key(|(position, _)| *position);
        tracing::info!(
            target = "apicat.indexer",
            packages = reports.len(),
            failures = failures.len(),
            apis = merged.apis,
            assemblies = merged.assemblies,
            declarations = merged.declarations,
            "batch finished"
        );

        Ok(BatchReport {
            packages: reports.into_iter().map(|(_, report)| report).collect(),
            failures: failures.into_iter().map(|(_, failure)| failure).collect(),
            merged,
        })
    }
}
