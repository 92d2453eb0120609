//! rust-rdlmigrate: embed shared data sources and datasets into reports
//!
//! This library converts report definitions (`.rdl`) that reference shared
//! data sources and shared datasets into self-contained reports, following
//! subreports so whole report trees can be migrated at once.

pub mod batch;
pub mod catalog;
pub mod convert;
pub mod error;
pub mod model;
pub mod util;
#[cfg(feature = "xsd-validation")]
pub mod validate;
pub mod xml;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use batch::BatchSummary;
pub use catalog::{LocalCatalog, ReportCatalog};
pub use convert::{convert_document, ConversionInputs, ConversionOutcome, ConversionState};
pub use error::RdlMigrateError;

use catalog::{parent_folder, report_name};
use model::{read_data_source_file, read_shared_data_set_dir, CanonicalDataSets};

/// Default output folder, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Options for converting a single report file
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Path to the .rdl file
    pub report_path: PathBuf,
    /// Data source list (defaults to `<report>.rds` next to the report)
    pub data_sources: Option<PathBuf>,
    /// Folder of shared dataset definitions (defaults to `<report>_DataSets`)
    pub data_sets: Option<PathBuf>,
    /// Output folder (defaults to `output`)
    pub output_dir: Option<PathBuf>,
    /// Server path of the report (defaults to `/<report name>`)
    pub owner: Option<String>,
    /// Add authoring metadata naming this tool
    pub origin_tag: bool,
    /// XSD to validate the converted report against
    pub schema: Option<PathBuf>,
}

/// Result of converting a single report file
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    pub output_path: PathBuf,
    pub outcome: ConversionOutcome,
}

/// Options for a batch conversion
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Local folder standing in for the report server root
    pub root: PathBuf,
    /// Server path of the report or folder to convert
    pub input: String,
    /// Output folder (defaults to `output`)
    pub output_dir: Option<PathBuf>,
    /// Replace converted reports already in the output folder
    pub overwrite: bool,
    /// Add authoring metadata naming this tool
    pub origin_tag: bool,
    /// XSD to validate converted reports against
    pub schema: Option<PathBuf>,
}

/// Convert one report file using its data source and shared dataset files
pub fn convert_report(options: ConvertOptions) -> Result<ConvertSummary> {
    let report_path = &options.report_path;
    let name = report_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report")
        .to_string();
    let owner = options.owner.clone().unwrap_or_else(|| format!("/{}", name));

    log::info!("Converting {} as {}", report_path.display(), owner);

    // Step 1: Read and parse the report
    let bytes = std::fs::read(report_path).map_err(|e| RdlMigrateError::ReportReadError {
        path: report_path.clone(),
        source: e,
    })?;
    let content = util::decode_text(&bytes).map_err(|e| RdlMigrateError::ReportReadError {
        path: report_path.clone(),
        source: e,
    })?;
    let mut document =
        xml::parse_document(&content).map_err(|e| RdlMigrateError::XmlParseError {
            context: report_path.display().to_string(),
            source: e,
        })?;

    // Step 2: Resolve data sources and bind shared datasets
    let state = ConversionState::new();
    let rds = options
        .data_sources
        .clone()
        .unwrap_or_else(|| catalog::data_source_file(report_path));
    let data_sources = if rds.is_file() {
        read_data_source_file(&rds, &state.data_source_names)?
    } else {
        if options.data_sources.is_some() {
            anyhow::bail!("Data source file not found: {}", rds.display());
        }
        Vec::new()
    };

    let data_set_dir = options
        .data_sets
        .clone()
        .unwrap_or_else(|| catalog::data_set_dir(report_path));
    let library = read_shared_data_set_dir(&data_set_dir)?;
    let data_sets = CanonicalDataSets::bind(&owner, &document, &library)?;

    log::info!(
        "Found {} data sources and {} shared dataset bindings",
        data_sources.len(),
        data_sets.len()
    );

    // Step 3: Convert. Subreports are resolved on disk around the report
    state.report_names.claim(&report_name(&owner));
    let root_folder = parent_folder(&owner);
    let catalog = LocalCatalog::new(catalog_root(report_path, &root_folder));
    let inputs = ConversionInputs {
        owner_path: &owner,
        data_sources: &data_sources,
        data_sets: &data_sets,
        root_folder: &root_folder,
    };
    let outcome = convert_document(&mut document, &inputs, &catalog, &state)
        .with_context(|| format!("Failed to convert {}", report_path.display()))?;

    for diagnostic in &outcome.subreports.diagnostics {
        log::warn!("{}", diagnostic);
    }

    if options.origin_tag {
        convert::tag_origin(&mut document, chrono::Utc::now());
    }

    // Step 4: Write the converted report
    let output_dir = options
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    std::fs::create_dir_all(&output_dir).map_err(|e| RdlMigrateError::OutputWriteError {
        path: output_dir.clone(),
        source: e,
    })?;
    let output_path = output_dir.join(format!("{}.rdl", name));
    batch::write_report(&document, &output_path, options.schema.as_deref())?;

    log::info!(
        "Conversion from {} to {} completed",
        report_path.display(),
        output_path.display()
    );

    Ok(ConvertSummary {
        output_path,
        outcome,
    })
}

/// Convert a report or folder under a local report root, following
/// subreports, and write the conversion log
pub fn run_batch(options: BatchOptions) -> Result<BatchSummary> {
    if !options.root.is_dir() {
        anyhow::bail!("Report root not found: {}", options.root.display());
    }

    let catalog = LocalCatalog::new(&options.root);
    let settings = batch::BatchSettings {
        output_dir: options
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        overwrite: options.overwrite,
        origin_tag: options.origin_tag,
        schema: options.schema,
    };

    let summary = batch::run(&catalog, &options.input, &settings)
        .with_context(|| format!("Batch conversion of {} failed", options.input))?;
    Ok(summary)
}

/// Local folder that plays the server root for a report file whose server
/// path lives in `root_folder`: one directory up per folder segment.
fn catalog_root(report_path: &Path, root_folder: &str) -> PathBuf {
    let report_dir = report_path.parent().unwrap_or(Path::new("."));
    let depth = root_folder.split('/').filter(|s| !s.is_empty()).count();
    report_dir
        .ancestors()
        .nth(depth)
        .unwrap_or(report_dir)
        .to_path_buf()
}
