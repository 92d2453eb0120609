//! Batch conversion of a report or folder, following subreports

mod report;

pub use report::{print_summary, write_conversion_log, BatchSummary, LogEntry, LogKind};

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::catalog::{parent_folder, report_name, ReportCatalog};
use crate::convert::{convert_document, tag_origin, ConversionInputs, ConversionState};
use crate::error::RdlMigrateError;
use crate::xml::{document_to_string, Document};

/// Minimum number of reports in a wave to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
pub const PARALLEL_THRESHOLD: usize = 8;

pub const CONVERSION_LOG_FILE: &str = "ConversionLog.txt";

/// Suffix of the untouched copy written next to each converted report.
pub const ORIGINAL_SUFFIX: &str = "_original";

/// How a batch run writes its results.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub output_dir: PathBuf,
    /// Replace converted reports already present in `output_dir`
    pub overwrite: bool,
    /// Add authoring metadata naming this tool
    pub origin_tag: bool,
    /// XSD to validate converted reports against
    pub schema: Option<PathBuf>,
}

/// Result of converting one report in a wave.
#[derive(Debug, Default)]
struct ReportResult {
    entries: Vec<LogEntry>,
    converted: Option<PathBuf>,
    subreports: Vec<String>,
}

/// Convert the report or folder at `input` and every subreport reachable
/// from it, then write the conversion log.
///
/// Reports are converted in waves: the reports named by `input` first, then
/// the subreports the previous wave discovered. A report that fails is
/// logged and the batch carries on.
pub fn run(
    catalog: &dyn ReportCatalog,
    input: &str,
    settings: &BatchSettings,
) -> Result<BatchSummary, RdlMigrateError> {
    fs::create_dir_all(&settings.output_dir).map_err(|e| RdlMigrateError::OutputWriteError {
        path: settings.output_dir.clone(),
        source: e,
    })?;

    let roots = if catalog.is_folder(input) {
        catalog.reports_in_folder(input)?
    } else if catalog.is_report(input) {
        vec![input.to_string()]
    } else {
        return Err(RdlMigrateError::ReportNotFound {
            path: input.to_string(),
        });
    };
    log::info!("Found {} reports to convert", roots.len());

    let state = ConversionState::new();
    let mut summary = BatchSummary {
        log_path: settings.output_dir.join(CONVERSION_LOG_FILE),
        ..Default::default()
    };

    let mut wave = Vec::with_capacity(roots.len());
    for path in roots {
        let name = report_name(&path);
        if state.report_names.claim(&name) {
            wave.push(path);
        } else {
            summary.entries.push(LogEntry::new(
                LogKind::Conflict,
                name,
                format!("{} has the same name as another report in this run", path),
            ));
        }
    }

    while !wave.is_empty() {
        log::debug!("Converting wave of {} reports", wave.len());
        let results: Vec<ReportResult> = if wave.len() >= PARALLEL_THRESHOLD {
            wave.par_iter()
                .map(|path| convert_one(catalog, path, settings, &state))
                .collect()
        } else {
            wave.iter()
                .map(|path| convert_one(catalog, path, settings, &state))
                .collect()
        };

        wave = Vec::new();
        for result in results {
            summary.entries.extend(result.entries);
            summary.converted.extend(result.converted);
            wave.extend(result.subreports);
        }
    }

    write_conversion_log(&summary.log_path, &summary.entries)?;
    Ok(summary)
}

fn convert_one(
    catalog: &dyn ReportCatalog,
    path: &str,
    settings: &BatchSettings,
    state: &ConversionState,
) -> ReportResult {
    let name = report_name(path);
    let output = settings.output_dir.join(format!("{}.rdl", name));
    let mut result = ReportResult::default();

    if output.exists() && !settings.overwrite {
        result.entries.push(LogEntry::new(
            LogKind::Conflict,
            name,
            format!("a converted report already exists at {}", output.display()),
        ));
        return result;
    }

    match convert_to_output(catalog, path, &output, settings, state) {
        Ok(subreports) => {
            log::info!("SUCCESS : {} converted to {}", name, output.display());
            result.entries.push(LogEntry::new(
                LogKind::Success,
                name,
                format!("converted to {}", output.display()),
            ));
            for diagnostic in &subreports.diagnostics {
                result.entries.push(LogEntry::from_diagnostic(diagnostic));
            }
            for subreport in &subreports.paths {
                result.entries.push(LogEntry::new(
                    LogKind::Subreport,
                    subreport.as_str(),
                    format!("queued for conversion from {}", path),
                ));
            }
            result.converted = Some(output);
            result.subreports = subreports.paths;
        }
        Err(e) => {
            log::error!("FAILED : {} {}", name, e);
            result
                .entries
                .push(LogEntry::new(LogKind::Failed, name, e.to_string()));
        }
    }

    result
}

fn convert_to_output(
    catalog: &dyn ReportCatalog,
    path: &str,
    output: &Path,
    settings: &BatchSettings,
    state: &ConversionState,
) -> Result<crate::convert::SubreportDiscovery, RdlMigrateError> {
    let mut source = catalog.load_report(path, &state.data_source_names)?;

    let original = settings
        .output_dir
        .join(format!("{}{}.rdl", report_name(path), ORIGINAL_SUFFIX));
    write_file(&original, &source.content)?;

    let root_folder = parent_folder(path);
    let inputs = ConversionInputs {
        owner_path: path,
        data_sources: &source.data_sources,
        data_sets: &source.data_sets,
        root_folder: &root_folder,
    };
    let outcome = convert_document(&mut source.document, &inputs, catalog, state)?;

    if settings.origin_tag {
        tag_origin(&mut source.document, chrono::Utc::now());
    }
    write_report(&source.document, output, settings.schema.as_deref())?;

    Ok(outcome.subreports)
}

/// Serialize `document` to `output`, validating it first when a schema is
/// given.
pub fn write_report(
    document: &Document,
    output: &Path,
    schema: Option<&Path>,
) -> Result<(), RdlMigrateError> {
    let xml = document_to_string(document).map_err(|e| RdlMigrateError::XmlWriteError {
        message: e.to_string(),
    })?;

    #[cfg(feature = "xsd-validation")]
    if let Some(schema) = schema {
        crate::validate::validate_report_xml(&xml, schema, output)?;
    }
    #[cfg(not(feature = "xsd-validation"))]
    if schema.is_some() {
        log::warn!("Built without xsd-validation, skipping schema check");
    }

    write_file(output, &xml)
}

fn write_file(path: &Path, content: &str) -> Result<(), RdlMigrateError> {
    fs::write(path, content).map_err(|e| RdlMigrateError::OutputWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
