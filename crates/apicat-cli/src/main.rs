use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apicat_catalog::{ApiRef, Catalog, CatalogBuilder, CatalogStats};
use apicat_config::{ApicatConfig, PackageLocation};
use apicat_core::{ApiKind, CatalogId};
use apicat_indexer::{
    BatchIndexer, BatchReport, ManifestSymbolProvider, PackageIndexer, PackageRequest,
};
use apicat_packages::{
    default_locators, locate_platform, resolve_platform, DirectorySource, FetchScope,
    FrameworkLocator, HttpSource, PackageSource, PackageVersion,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "apicat", version, about = "Build and query API catalogs")]
struct Cli {
    /// Config file (defaults to $APICAT_CONFIG_PATH, then ./apicat.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index packages into the catalog, creating it if needed
    Index(IndexArgs),
    /// Print the header and record counts of a catalog
    Inspect(CatalogArgs),
    /// Look up APIs by id or by name and print their declarations
    Lookup(LookupArgs),
    /// Dry-run platform and dependency resolution for a package
    Resolve(ResolveArgs),
    /// Print the JSON schema of the config file
    Schema,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog file (defaults to `catalog.path` from the config)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// An API id (GUID form) or a simple API name such as `Widget` or `Run()`
    query: String,
    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Args)]
struct IndexArgs {
    /// Packages as `<ID>@<VERSION>`
    #[arg(required = true, value_name = "ID@VERSION")]
    packages: Vec<String>,
    #[command(flatten)]
    catalog: CatalogArgs,
}

#[derive(Args)]
struct ResolveArgs {
    /// Package id
    id: String,
    /// Package version
    version: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let (config, config_path) = apicat_config::load(cli.config.as_deref(), &cwd)?;
    apicat_config::init_tracing(&config.logging);
    tracing::debug!(
        target = "apicat.cli",
        config = ?config_path,
        catalog = %config.catalog.path.display(),
        "loaded config"
    );

    match cli.command {
        Command::Index(args) => {
            let path = catalog_path(&config, &args.catalog);
            let requests = args
                .packages
                .iter()
                .map(|package| parse_request(package))
                .collect::<Result<Vec<_>>>()?;
            let report = index(&config, &path, &requests)?;
            print_output(&report, args.catalog.json)?;
            Ok(if report.failures.is_empty() { 0 } else { 1 })
        }
        Command::Inspect(args) => {
            let path = catalog_path(&config, &args);
            let catalog = open_catalog(&path)?;
            let report = inspect(&path, &catalog);
            print_output(&report, args.json)?;
            Ok(0)
        }
        Command::Lookup(args) => {
            let path = catalog_path(&config, &args.catalog);
            let catalog = open_catalog(&path)?;
            let view = catalog.view();
            let apis: Vec<ApiRef<'_>> = match CatalogId::parse(&args.query) {
                Ok(id) => view.api_by_id(id).into_iter().collect(),
                Err(_) => view.apis_named(&args.query).collect(),
            };
            let reports: Vec<ApiReport> = apis.iter().map(ApiReport::new).collect();
            print_output(&reports, args.catalog.json)?;
            Ok(if reports.is_empty() { 1 } else { 0 })
        }
        Command::Resolve(args) => {
            let version = PackageVersion::parse(&args.version)?;
            let report = resolve(&config, &args.id, &version)?;
            print_output(&report, args.json)?;
            Ok(0)
        }
        Command::Schema => {
            print_output(&apicat_config::json_schema(), true)?;
            Ok(0)
        }
    }
}

fn catalog_path(config: &ApicatConfig, args: &CatalogArgs) -> PathBuf {
    args.catalog
        .clone()
        .unwrap_or_else(|| config.catalog.path.clone())
}

fn open_catalog(path: &Path) -> Result<Catalog> {
    Catalog::open(path).with_context(|| format!("failed to open catalog {}", path.display()))
}

#[derive(Serialize)]
struct InspectReport {
    path: PathBuf,
    format_version: u32,
    compression: String,
    mapped: bool,
    payload_bytes: u64,
    stats: CatalogStats,
    frameworks: Vec<String>,
}

fn inspect(path: &Path, catalog: &Catalog) -> InspectReport {
    let header = catalog.header();
    let view = catalog.view();
    InspectReport {
        path: path.to_path_buf(),
        format_version: header.format_version,
        compression: format!("{:?}", header.compression).to_ascii_lowercase(),
        mapped: catalog.is_mapped(),
        payload_bytes: header.payload_len,
        stats: view.stats(),
        frameworks: view
            .frameworks()
            .map(|framework| framework.name().to_string())
            .collect(),
    }
}

#[derive(Serialize)]
struct ApiReport {
    id: String,
    kind: ApiKind,
    name: String,
    frameworks: Vec<String>,
    declarations: Vec<DeclarationReport>,
}

#[derive(Serialize)]
struct DeclarationReport {
    assembly: String,
    assembly_version: String,
    markup: String,
}

impl ApiReport {
    fn new(api: &ApiRef<'_>) -> Self {
        Self {
            id: api.id().to_string(),
            kind: api.kind(),
            name: api.full_name(),
            frameworks: api.frameworks().into_iter().map(str::to_string).collect(),
            declarations: api
                .declarations()
                .map(|declaration| {
                    let assembly = declaration.assembly();
                    DeclarationReport {
                        assembly: assembly.name().to_string(),
                        assembly_version: assembly.version().to_string(),
                        markup: declaration.render().to_string(),
                    }
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ResolveReport {
    id: String,
    version: String,
    platforms: Vec<PlatformReport>,
}

#[derive(Serialize)]
struct PlatformReport {
    framework: String,
    references: Vec<String>,
    dependencies: Vec<String>,
    framework_references: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn package_source(config: &ApicatConfig) -> Arc<dyn PackageSource> {
    match config.packages.location() {
        PackageLocation::Directory(dir) => Arc::new(DirectorySource::new(dir)),
        PackageLocation::Http(template) => {
            Arc::new(HttpSource::new(template, config.packages.timeout()))
        }
    }
}

fn framework_locators(
    config: &ApicatConfig,
    source: &Arc<dyn PackageSource>,
) -> Vec<Box<dyn FrameworkLocator>> {
    default_locators(
        &config.frameworks.root,
        config
            .frameworks
            .reference_packs
            .then(|| Arc::clone(source)),
    )
}

fn parse_request(text: &str) -> Result<PackageRequest> {
    let Some((id, version)) = text.rsplit_once('@') else {
        anyhow::bail!("expected <ID>@<VERSION>, got {text:?}");
    };
    if id.is_empty() {
        anyhow::bail!("missing package id in {text:?}");
    }
    let version =
        PackageVersion::parse(version).with_context(|| format!("invalid version in {text:?}"))?;
    Ok(PackageRequest::new(id, version))
}

fn index(config: &ApicatConfig, path: &Path, requests: &[PackageRequest]) -> Result<BatchReport> {
    let mut builder = if path.is_file() {
        CatalogBuilder::open(path)
            .with_context(|| format!("failed to open catalog {}", path.display()))?
    } else {
        CatalogBuilder::new()
    };

    let source = package_source(config);
    let locators = framework_locators(config, &source);
    let indexer = PackageIndexer::new(source, locators, Arc::new(ManifestSymbolProvider));
    let report = BatchIndexer::new(config.indexer.worker_count())
        .with_queue_capacity(config.indexer.queue_capacity)
        .run(&indexer, requests, &mut builder)?;

    builder
        .save(path, config.catalog.write_options())
        .with_context(|| format!("failed to write catalog {}", path.display()))?;
    Ok(report)
}

fn resolve(config: &ApicatConfig, id: &str, version: &PackageVersion) -> Result<ResolveReport> {
    let source = package_source(config);
    let locators = framework_locators(config, &source);
    let scope = FetchScope::new(source.as_ref());
    let root = scope
        .fetch(id, version)
        .with_context(|| format!("failed to fetch {id} {version}"))?;

    let mut platforms = Vec::new();
    for platform in root.target_platforms() {
        let mut report = PlatformReport {
            framework: platform.short_folder_name(),
            references: Vec::new(),
            dependencies: Vec::new(),
            framework_references: 0,
            error: None,
        };
        match resolve_platform(root.as_ref(), &platform, &scope) {
            Ok(Some(resolution)) => {
                report.references = resolution.references.items;
                report.dependencies = resolution
                    .closure
                    .packages()
                    .map(|archive| archive.identity().to_string())
                    .collect();
                match locate_platform(&locators, &platform) {
                    Ok(Some(set)) => report.framework_references = set.files.len(),
                    Ok(None) => report.error = Some("no reference assemblies found".to_string()),
                    Err(err) => report.error = Some(err.to_string()),
                }
            }
            Ok(None) => report.error = Some("no compatible reference group".to_string()),
            Err(err) => report.error = Some(err.to_string()),
        }
        platforms.push(report);
    }

    let identity = root.identity();
    Ok(ResolveReport {
        id: identity.id.clone(),
        version: identity.version.to_normalized_string(),
        platforms,
    })
}

fn print_output<T: Serialize + 'static>(value: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
        return Ok(());
    }

    // Human output for key types. Everything else falls back to pretty JSON.
    let any = value as &dyn std::any::Any;
    if let Some(report) = any.downcast_ref::<InspectReport>() {
        println!("catalog: {}", report.path.display());
        println!("  format_version: {}", report.format_version);
        println!("  compression: {}", report.compression);
        println!("  mapped: {}", report.mapped);
        println!("  payload_bytes: {}", report.payload_bytes);
        println!("  apis: {}", report.stats.apis);
        println!("  assemblies: {}", report.stats.assemblies);
        println!("  declarations: {}", report.stats.declarations);
        println!("  markups: {}", report.stats.markups);
        println!("  packages: {}", report.stats.packages);
        println!("  frameworks: {}", report.frameworks.join(", "));
    } else if let Some(reports) = any.downcast_ref::<Vec<ApiReport>>() {
        if reports.is_empty() {
            println!("no matching apis");
        }
        for report in reports {
            println!("{} {:?} {}", report.id, report.kind, report.name);
            println!("  frameworks: {}", report.frameworks.join(", "));
            for declaration in &report.declarations {
                println!(
                    "  in {} {}:",
                    declaration.assembly, declaration.assembly_version
                );
                for line in declaration.markup.lines() {
                    println!("    {line}");
                }
            }
        }
    } else if let Some(report) = any.downcast_ref::<BatchReport>() {
        for package in &report.packages {
            println!(
                "{} {}: {}",
                package.id,
                package.version,
                package.frameworks.join(", ")
            );
            for skip in &package.skipped {
                println!("  {}: skipped ({})", skip.framework, skip.reason);
            }
        }
        for failure in &report.failures {
            println!("{} {}: failed ({})", failure.id, failure.version, failure.error);
        }
        println!(
            "merged {} apis, {} assemblies, {} declarations",
            report.merged.apis, report.merged.assemblies, report.merged.declarations
        );
    } else if let Some(report) = any.downcast_ref::<ResolveReport>() {
        println!("{} {}", report.id, report.version);
        for platform in &report.platforms {
            match &platform.error {
                Some(error) => println!("  {}: skipped ({error})", platform.framework),
                None => println!(
                    "  {}: {} references, {} dependencies, {} framework references",
                    platform.framework,
                    platform.references.len(),
                    platform.dependencies.len(),
                    platform.framework_references
                ),
            }
        }
    } else {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
    }
    Ok(())
}
