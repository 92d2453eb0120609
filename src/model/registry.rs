//! Run-wide name registries shared across document conversions.
//!
//! Both stores are owned by the batch driver and passed by reference into
//! every conversion. Insert-if-absent happens under a single lock
//! acquisition, so concurrent workers racing on one key see exactly one
//! winner.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::{IndexMap, IndexSet};

use crate::convert::constants::DATA_SOURCE;
use crate::util::{last_segment, sanitize_identifier};

/// Maps shared data source reference paths to stable embedded names.
///
/// Names follow `DataSource{ordinal}_{segment}` where `ordinal` is the
/// number of references named before this one and `segment` is the
/// reference's last path segment reduced to letters, digits and `_`.
#[derive(Debug, Default)]
pub struct DataSourceNameCache {
    names: Mutex<IndexMap<String, String>>,
}

impl DataSourceNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `reference`, assigning one on first use.
    pub fn assign(&self, reference: &str) -> String {
        let mut names = lock(&self.names);
        if let Some(existing) = names.get(reference) {
            return existing.clone();
        }

        let name = format!(
            "{}{}_{}",
            DATA_SOURCE,
            names.len(),
            sanitize_identifier(last_segment(reference))
        );
        names.insert(reference.to_string(), name.clone());
        name
    }

    /// Previously assigned name, without assigning.
    pub fn get(&self, reference: &str) -> Option<String> {
        lock(&self.names).get(reference).cloned()
    }

    /// Reference a name was assigned to, if this cache assigned it.
    pub fn reference_for(&self, name: &str) -> Option<String> {
        lock(&self.names)
            .iter()
            .find(|(_, assigned)| assigned.as_str() == name)
            .map(|(reference, _)| reference.clone())
    }

    pub fn len(&self) -> usize {
        lock(&self.names).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (reference, name) pairs in assignment order.
    pub fn entries(&self) -> Vec<(String, String)> {
        lock(&self.names)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Report base names already claimed for output in this run.
#[derive(Debug, Default)]
pub struct ReportNameRegistry {
    names: Mutex<IndexSet<String>>,
}

impl ReportNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`. Returns false if it was already claimed.
    pub fn claim(&self, name: &str) -> bool {
        let mut names = lock(&self.names);
        if names.contains(name) {
            return false;
        }
        names.insert(name.to_string())
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        lock(&self.names).contains(name)
    }

    pub fn len(&self) -> usize {
        lock(&self.names).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claimed names in claim order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.names).iter().cloned().collect()
    }
}

/// Poisoning is ignored: every update is a single insert, so the stored
/// names are never left half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
