//! Report conversion engine
//!
//! Turns a report that references shared data sources and shared datasets
//! into a self-contained one. Data sources are embedded first, then every
//! shared dataset stub is replaced by its canonical query with parameters,
//! fields and filters reconciled, and finally the converted tree is scanned
//! for subreports that need the same treatment.

pub mod constants;
mod data_sets;
mod data_sources;
mod fields;
mod filters;
mod namespace;
pub mod origin;
mod parameters;
mod subreports;

pub use data_sets::{embed_data_sets, ensure_data_sources_embedded};
pub use data_sources::{build_data_source, embed_data_sources, is_cloud_sql};
pub use fields::align_fields;
pub use filters::align_filters;
pub use namespace::rewrite_namespace;
pub use origin::tag_origin;
pub use parameters::align_parameters;
pub use subreports::{
    discover_subreports, resolve_subreport_path, SubreportDiagnostic, SubreportDiscovery,
};

use crate::catalog::ReportCatalog;
use crate::error::RdlMigrateError;
use crate::model::{CanonicalDataSets, DataSource, DataSourceNameCache, ReportNameRegistry};
use crate::xml::Document;

/// Registries shared by every conversion in one run.
#[derive(Debug, Default)]
pub struct ConversionState {
    pub data_source_names: DataSourceNameCache,
    pub report_names: ReportNameRegistry,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-document inputs to [`convert_document`].
#[derive(Debug, Clone, Copy)]
pub struct ConversionInputs<'a> {
    /// Server path of the report being converted; owner half of every
    /// dataset key
    pub owner_path: &'a str,
    pub data_sources: &'a [DataSource],
    pub data_sets: &'a CanonicalDataSets,
    /// Folder relative subreport references resolve against
    pub root_folder: &'a str,
}

/// What a successful conversion did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub embedded_data_sets: usize,
    pub subreports: SubreportDiscovery,
}

/// Convert `document` in place.
///
/// The work happens on a copy that replaces `document` only when every step
/// succeeds; on error `document` is left exactly as it was.
pub fn convert_document(
    document: &mut Document,
    inputs: &ConversionInputs<'_>,
    catalog: &dyn ReportCatalog,
    state: &ConversionState,
) -> Result<ConversionOutcome, RdlMigrateError> {
    let mut working = document.clone();

    embed_data_sources(&mut working, inputs.data_sources)?;
    let embedded_data_sets = embed_data_sets(
        inputs.owner_path,
        &mut working,
        inputs.data_sets,
        &state.data_source_names,
    )?;
    ensure_data_sources_embedded(&working, &state.data_source_names)?;
    let subreports =
        discover_subreports(&working, inputs.root_folder, catalog, &state.report_names);

    *document = working;

    log::info!(
        "Converted {}: {} data sources, {} shared datasets, {} new subreports",
        inputs.owner_path,
        inputs.data_sources.len(),
        embedded_data_sets,
        subreports.paths.len()
    );

    Ok(ConversionOutcome {
        embedded_data_sets,
        subreports,
    })
}
