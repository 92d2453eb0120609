//! Authoring metadata that marks a report as produced by this tool

use chrono::{DateTime, SecondsFormat, Utc};

use super::constants::{AUTHORING_METADATA_NS, NAME};
use crate::xml::{Document, Element, QName};

/// Tool name written into the metadata
pub const TOOL_NAME: &str = "rust-rdlmigrate";

/// Tool version written into the metadata
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

const AUTHORING_METADATA_PREFIX: &str = "am";
const AUTHORING_METADATA: &str = "AuthoringMetadata";
const LAST_MODIFIED_TIMESTAMP: &str = "LastModifiedTimestamp";
const CREATED_BY: &str = "CreatedBy";
const UPDATED_BY: &str = "UpdatedBy";
const VERSION: &str = "Version";

/// Record this tool in the report's `am:AuthoringMetadata` block.
///
/// The block is created under the root when missing and updated in place
/// otherwise. `UpdatedBy` and the timestamp are always rewritten;
/// `CreatedBy` is only filled in when the report has none.
pub fn tag_origin(document: &mut Document, timestamp: DateTime<Utc>) {
    let root = &mut document.root;
    if !root
        .namespaces
        .iter()
        .any(|decl| decl.uri == AUTHORING_METADATA_NS)
    {
        root.declare_namespace(Some(AUTHORING_METADATA_PREFIX), AUTHORING_METADATA_NS);
    }

    let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    set_value(root, &[AUTHORING_METADATA, LAST_MODIFIED_TIMESTAMP], &stamp);

    let created = root
        .child(&am(AUTHORING_METADATA))
        .and_then(|metadata| metadata.child(&am(CREATED_BY)))
        .is_some();
    if !created {
        set_value(root, &[AUTHORING_METADATA, CREATED_BY, NAME], TOOL_NAME);
        set_value(root, &[AUTHORING_METADATA, CREATED_BY, VERSION], TOOL_VERSION);
    }

    set_value(root, &[AUTHORING_METADATA, UPDATED_BY, NAME], TOOL_NAME);
    set_value(root, &[AUTHORING_METADATA, UPDATED_BY, VERSION], TOOL_VERSION);
}

fn am(local: &str) -> QName {
    QName::new(Some(AUTHORING_METADATA_NS), local)
}

/// Set the text at a chain of metadata elements below `parent`, creating
/// missing links.
fn set_value(parent: &mut Element, path: &[&str], value: &str) {
    let Some((first, rest)) = path.split_first() else {
        parent.set_text(value);
        return;
    };

    let name = am(first);
    if parent.child(&name).is_none() {
        parent.push(Element::new(name.clone()));
    }
    if let Some(child) = parent.child_mut(&name) {
        set_value(child, rest, value);
    }
}
