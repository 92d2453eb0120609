//! Subreport discovery on a converted report

use std::fmt;

use super::constants::{REPORT_NAME, SUBREPORT};
use crate::catalog::{report_name, report_uri, ReportCatalog};
use crate::model::ReportNameRegistry;
use crate::xml::{Document, QName};

/// A subreport that was found but will not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubreportDiagnostic {
    /// The path does not name an existing report
    ResolutionFailure { path: String },
    /// Another report already claimed this output name
    NameConflict { name: String, path: String },
}

impl fmt::Display for SubreportDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubreportDiagnostic::ResolutionFailure { path } => {
                write!(f, "{} does not exist or is not a report", path)
            }
            SubreportDiagnostic::NameConflict { name, path } => write!(
                f,
                "a report with name \"{}\" has already been claimed, skipping {}",
                name, path
            ),
        }
    }
}

/// Result of scanning one report for subreports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubreportDiscovery {
    /// Newly claimed subreport paths, in document order
    pub paths: Vec<String>,
    pub diagnostics: Vec<SubreportDiagnostic>,
}

/// Find the subreports referenced by `document` that still need converting.
///
/// Each reference is resolved against `root_folder`, checked with `catalog`
/// and claimed by base name in `claimed`. Unresolvable references and name
/// conflicts are reported as diagnostics and skipped.
pub fn discover_subreports(
    document: &Document,
    root_folder: &str,
    catalog: &dyn ReportCatalog,
    claimed: &ReportNameRegistry,
) -> SubreportDiscovery {
    let ns = document.namespace();
    let subreport_name = QName::new(ns, SUBREPORT);
    let report_name_el = QName::new(ns, REPORT_NAME);

    let mut discovery = SubreportDiscovery::default();

    for subreport in document.root.descendants().filter(|el| el.name == subreport_name) {
        let Some(target) = subreport
            .child(&report_name_el)
            .or_else(|| subreport.elements().next())
        else {
            continue;
        };
        let path = resolve_subreport_path(root_folder, target.text().trim());
        let name = report_name(&path);

        if !catalog.is_report(&path) {
            log::warn!("SUBREPORT FAIL : {} does not exist or is not a report", path);
            discovery
                .diagnostics
                .push(SubreportDiagnostic::ResolutionFailure { path });
            continue;
        }

        if claimed.claim(&name) {
            log::info!("SUBREPORT : found subreport {}", path);
            discovery.paths.push(path);
        } else {
            log::warn!("CONFLICT : a report with name \"{}\" has already been claimed", name);
            discovery
                .diagnostics
                .push(SubreportDiagnostic::NameConflict { name, path });
        }
    }

    discovery
}

/// Server path a subreport reference points at.
///
/// Absolute `http`, `https` and `file` URIs are returned unchanged. Anything
/// else is joined to `root_folder` (unless already rooted), backslashes
/// become `/`, and `.` and `..` segments are collapsed. `..` never climbs
/// above the root. When `root_folder` is itself a URI the result is joined
/// with URI rules and stays a URI.
pub fn resolve_subreport_path(root_folder: &str, reference: &str) -> String {
    if report_uri(reference).is_some() {
        return reference.to_string();
    }

    let reference = reference.replace('\\', "/");
    if let Some(base) = report_uri(&format!("{}/", root_folder.trim_end_matches('/'))) {
        if let Ok(joined) = base.join(&reference) {
            return joined.to_string();
        }
    }
    let joined = if reference.starts_with('/') {
        reference
    } else {
        format!("{}/{}", root_folder.replace('\\', "/"), reference)
    };
    let rooted = match joined.find('/') {
        Some(index) => &joined[index..],
        None => joined.as_str(),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rooted.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}
