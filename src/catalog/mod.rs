//! Report stores the converter reads from

mod local;

pub use local::{data_set_dir, data_source_file, LocalCatalog};

use url::Url;

use crate::error::RdlMigrateError;
use crate::model::{CanonicalDataSets, DataSource, DataSourceNameCache};
use crate::util::last_segment;
use crate::xml::Document;

/// Everything needed to convert one report.
#[derive(Debug, Clone)]
pub struct ReportSource {
    /// Server path of the report (e.g. `/Sales/Orders`)
    pub path: String,
    /// Report text exactly as stored
    pub content: String,
    pub document: Document,
    pub data_sources: Vec<DataSource>,
    pub data_sets: CanonicalDataSets,
}

impl ReportSource {
    /// Base name of the report, used for output file names.
    pub fn name(&self) -> String {
        report_name(&self.path)
    }
}

/// A store that resolves server paths to reports and their shared inputs.
///
/// Implementations are shared between worker threads during a batch run.
pub trait ReportCatalog: Send + Sync {
    fn is_report(&self, path: &str) -> bool;

    fn is_folder(&self, path: &str) -> bool;

    /// Server paths of the reports directly inside `path` (not recursive).
    fn reports_in_folder(&self, path: &str) -> Result<Vec<String>, RdlMigrateError>;

    /// Load a report with its data sources resolved and its shared dataset
    /// stubs bound to canonical trees.
    fn load_report(
        &self,
        path: &str,
        names: &DataSourceNameCache,
    ) -> Result<ReportSource, RdlMigrateError>;
}

/// Report base name: the last path segment without a `.rdl` extension.
pub fn report_name(path: &str) -> String {
    let segment = last_segment(path);
    let extension = format!(".{}", crate::convert::constants::REPORT_FILE_EXTENSION);
    if crate::util::ends_with_ci(segment, &extension) {
        segment[..segment.len() - extension.len()].to_string()
    } else {
        segment.to_string()
    }
}

/// URI schemes a report path may be written in.
const REPORT_URI_SCHEMES: &[&str] = &["http", "https", "file"];

/// `path` as an absolute URI, if it is written with one of the report URI
/// schemes. Server paths such as `Reports:Detail` are not URIs.
pub fn report_uri(path: &str) -> Option<Url> {
    Url::parse(path)
        .ok()
        .filter(|url| REPORT_URI_SCHEMES.contains(&url.scheme()))
}

/// Folder part of a server path (`/A/B/Report` -> `/A/B`, `/Report` -> `/`).
pub fn parent_folder(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => trimmed[..index].to_string(),
    }
}
