//! Filesystem report store

use std::path::{Path, PathBuf};

use super::{report_uri, ReportCatalog, ReportSource};
use crate::convert::constants::{DATA_SOURCE_FILE_EXTENSION, REPORT_FILE_EXTENSION};
use crate::error::RdlMigrateError;
use crate::model::{
    read_data_source_file, read_shared_data_set_dir, CanonicalDataSets, DataSourceNameCache,
};
use crate::util::decode_text;
use crate::xml::parse_document;

/// Suffix of the per-report folder holding shared dataset definitions.
const DATA_SET_DIR_SUFFIX: &str = "_DataSets";

/// Reports stored under a local folder that stands in for the server root.
///
/// Server path `/A/B/Report` is `<root>/A/B/Report.rdl`. Its data sources
/// live next to it in `Report.rds` and its shared datasets in
/// `Report_DataSets/*.rsd`. `file://` URIs address files directly.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Report file for a server path or `file://` URI.
    pub fn report_file(&self, path: &str) -> Option<PathBuf> {
        let local = self.local_path(path)?;
        if local
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_FILE_EXTENSION))
        {
            return Some(local);
        }
        let mut file = local.into_os_string();
        file.push(".");
        file.push(REPORT_FILE_EXTENSION);
        Some(PathBuf::from(file))
    }

    /// Local path for `path`; None when it cannot live on this disk.
    fn local_path(&self, path: &str) -> Option<PathBuf> {
        if let Some(url) = report_uri(path) {
            return match url.scheme() {
                "file" => url.to_file_path().ok(),
                _ => None,
            };
        }

        let mut local = self.root.clone();
        for segment in path.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => return None,
                other => local.push(other),
            }
        }
        Some(local)
    }
}

/// `Report.rds` next to `Report.rdl`.
pub fn data_source_file(report_file: &Path) -> PathBuf {
    report_file.with_extension(DATA_SOURCE_FILE_EXTENSION)
}

/// `Report_DataSets` next to `Report.rdl`.
pub fn data_set_dir(report_file: &Path) -> PathBuf {
    let stem = report_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    report_file.with_file_name(format!("{}{}", stem, DATA_SET_DIR_SUFFIX))
}

impl ReportCatalog for LocalCatalog {
    fn is_report(&self, path: &str) -> bool {
        self.report_file(path).is_some_and(|file| file.is_file())
    }

    fn is_folder(&self, path: &str) -> bool {
        self.local_path(path).is_some_and(|dir| dir.is_dir())
    }

    fn reports_in_folder(&self, path: &str) -> Result<Vec<String>, RdlMigrateError> {
        let dir = self
            .local_path(path)
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| RdlMigrateError::ReportNotFound {
                path: path.to_string(),
            })?;

        let folder = path.trim_end_matches('/');
        let mut reports: Vec<String> = walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_FILE_EXTENSION))
            })
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|stem| format!("{}/{}", folder, stem.to_string_lossy()))
            })
            .collect();
        reports.sort();
        Ok(reports)
    }

    fn load_report(
        &self,
        path: &str,
        names: &DataSourceNameCache,
    ) -> Result<ReportSource, RdlMigrateError> {
        let file = self
            .report_file(path)
            .filter(|file| file.is_file())
            .ok_or_else(|| RdlMigrateError::ReportNotFound {
                path: path.to_string(),
            })?;

        let bytes = std::fs::read(&file).map_err(|e| RdlMigrateError::ReportReadError {
            path: file.clone(),
            source: e,
        })?;
        let content = decode_text(&bytes).map_err(|e| RdlMigrateError::ReportReadError {
            path: file.clone(),
            source: e,
        })?;
        let document = parse_document(&content).map_err(|e| RdlMigrateError::XmlParseError {
            context: file.display().to_string(),
            source: e,
        })?;

        let rds = data_source_file(&file);
        let data_sources = if rds.is_file() {
            read_data_source_file(&rds, names)?
        } else {
            Vec::new()
        };

        let library = read_shared_data_set_dir(&data_set_dir(&file))?;
        let data_sets = CanonicalDataSets::bind(path, &document, &library)?;

        log::debug!(
            "Loaded {} with {} data sources and {} bound datasets",
            path,
            data_sources.len(),
            data_sets.len()
        );

        Ok(ReportSource {
            path: path.to_string(),
            content,
            document,
            data_sources,
            data_sets,
        })
    }
}
