//! Canonical shared datasets and their binding to report-local stubs

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::convert::constants::{
    DATA_SET, DATA_SETS, DATA_SET_FILE_EXTENSION, NAME, SHARED_DATA_SET,
    SHARED_DATA_SET_REFERENCE,
};
use crate::error::RdlMigrateError;
use crate::util::last_segment;
use crate::xml::{parse_element, Document, Element, QName};

/// Identifies one dataset stub: the report that owns it and its local name.
///
/// A report can bind the same shared dataset under several local names, and
/// different reports can reuse a local name for different shared datasets,
/// so neither half alone is a usable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataSetKey {
    pub owner_path: String,
    pub data_set_name: String,
}

impl DataSetKey {
    pub fn new(owner_path: impl Into<String>, data_set_name: impl Into<String>) -> Self {
        Self {
            owner_path: owner_path.into(),
            data_set_name: data_set_name.into(),
        }
    }
}

impl fmt::Display for DataSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_path, self.data_set_name)
    }
}

/// Canonical dataset trees keyed by stub.
///
/// Trees are stored read-only and shared between keys; callers only ever
/// receive deep copies through [`CanonicalDataSets::instantiate`].
#[derive(Debug, Clone, Default)]
pub struct CanonicalDataSets {
    entries: HashMap<DataSetKey, Arc<Element>>,
}

impl CanonicalDataSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: DataSetKey, data_set: Element) {
        self.entries.insert(key, Arc::new(data_set));
    }

    /// Bind an already shared tree under another key without copying it.
    pub fn insert_shared(&mut self, key: DataSetKey, data_set: Arc<Element>) {
        self.entries.insert(key, data_set);
    }

    /// A private, mutable copy of the canonical tree for `key`.
    pub fn instantiate(&self, key: &DataSetKey) -> Option<Element> {
        self.entries.get(key).map(|tree| Element::clone(tree))
    }

    pub fn contains(&self, key: &DataSetKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DataSetKey> {
        self.entries.keys()
    }

    /// Bind every shared-dataset stub in `document` to its canonical tree.
    ///
    /// `library` maps shared dataset identifiers (paths relative to the
    /// dataset folder, e.g. `Sales/Orders`) to trees. A stub's reference
    /// matches an identifier exactly, ignoring case and a leading `/`.
    /// Failing that, it matches the one identifier with the same last path
    /// segment; a reference whose last segment matches several identifiers
    /// is rejected as ambiguous. Stubs with no match are left unbound; the
    /// data set embedder reports them.
    pub fn bind(
        owner_path: &str,
        document: &Document,
        library: &HashMap<String, Arc<Element>>,
    ) -> Result<Self, RdlMigrateError> {
        let mut bound = Self::new();
        for (stub_name, reference) in shared_data_set_stubs(document) {
            let wanted = reference.trim_start_matches('/');
            let exact = library
                .iter()
                .find(|(id, _)| id.eq_ignore_ascii_case(wanted))
                .map(|(_, tree)| tree);

            let tree = match exact {
                Some(tree) => Some(tree),
                None => {
                    let segment = last_segment(wanted);
                    let mut candidates: Vec<(&String, &Arc<Element>)> = library
                        .iter()
                        .filter(|(id, _)| last_segment(id).eq_ignore_ascii_case(segment))
                        .collect();
                    if candidates.len() > 1 {
                        let mut ids: Vec<&str> =
                            candidates.iter().map(|(id, _)| id.as_str()).collect();
                        ids.sort_unstable();
                        return Err(RdlMigrateError::AmbiguousSharedDataset {
                            data_set: stub_name,
                            reference,
                            candidates: ids.join(", "),
                        });
                    }
                    candidates.pop().map(|(_, tree)| tree)
                }
            };

            if let Some(tree) = tree {
                bound.insert_shared(DataSetKey::new(owner_path, stub_name), Arc::clone(tree));
            }
        }
        Ok(bound)
    }
}

/// (stub name, shared dataset reference) for every stub in the report's
/// data sets container.
pub fn shared_data_set_stubs(document: &Document) -> Vec<(String, String)> {
    let ns = document.namespace();
    let container = QName::new(ns, DATA_SETS);
    let reference = QName::new(ns, SHARED_DATA_SET_REFERENCE);

    let Some(data_sets) = document.root.find_descendant(&container) else {
        return Vec::new();
    };

    data_sets
        .elements()
        .filter_map(|stub| {
            let mut references = stub.descendants().filter(|el| el.name == reference);
            let first = references.next()?;
            if references.next().is_some() {
                return None;
            }
            let name = stub.attribute(NAME)?;
            Some((name.to_string(), first.text().trim().to_string()))
        })
        .collect()
}

/// Parse a `.rsd` shared dataset definition and return its `DataSet` tree.
pub fn parse_shared_data_set(content: &str) -> Result<Element, String> {
    let root = parse_element(content).map_err(|e| e.to_string())?;
    if root.name.local != SHARED_DATA_SET {
        return Err(format!(
            "expected root element {}, found {}",
            SHARED_DATA_SET, root.name.local
        ));
    }

    let data_set = root
        .elements()
        .find(|el| el.name.local == DATA_SET)
        .cloned()
        .ok_or_else(|| format!("{} has no {} element", SHARED_DATA_SET, DATA_SET));
    data_set
}

/// Read a `.rsd` file from disk.
pub fn read_shared_data_set_file(path: &Path) -> Result<Element, RdlMigrateError> {
    let bytes = std::fs::read(path).map_err(|e| RdlMigrateError::ReportReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let content = crate::util::decode_text(&bytes).map_err(|e| RdlMigrateError::ReportReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_shared_data_set(&content).map_err(|message| RdlMigrateError::InvalidSharedDataSetFile {
        path: path.to_path_buf(),
        message,
    })
}

/// Load every `*.rsd` below `dir` into a library keyed by identifier: the
/// file's path relative to `dir` without extension, `/`-separated
/// (`dir/Sales/Orders.rsd` is `Sales/Orders`). Identifiers are unique
/// ignoring case. A missing directory is an empty library.
pub fn read_shared_data_set_dir(
    dir: &Path,
) -> Result<HashMap<String, Arc<Element>>, RdlMigrateError> {
    let mut library = HashMap::new();
    if !dir.is_dir() {
        return Ok(library);
    }

    let pattern = dir.join("**").join(format!("*.{}", DATA_SET_FILE_EXTENSION));
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| RdlMigrateError::InvalidSharedDataSetFile {
        path: dir.to_path_buf(),
        message: format!("invalid search pattern {}: {}", pattern, e),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let file = entry.map_err(|e| RdlMigrateError::ReportReadError {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if file.is_file() {
            files.push(file);
        }
    }
    files.sort();

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for file in files {
        let id = data_set_id(dir, &file);
        if let Some(previous) = seen.insert(id.to_lowercase(), file.clone()) {
            return Err(RdlMigrateError::InvalidSharedDataSetFile {
                path: file,
                message: format!(
                    "duplicate shared dataset {} (also defined by {})",
                    id,
                    previous.display()
                ),
            });
        }

        let data_set = read_shared_data_set_file(&file)?;
        log::debug!("Loaded shared dataset {} from {}", id, file.display());
        library.insert(id, Arc::new(data_set));
    }
    Ok(library)
}

/// `dir/A/B.rsd` -> `A/B`.
fn data_set_id(dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(dir).unwrap_or(file).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
