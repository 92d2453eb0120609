//! Query parameter reconciliation between a stub and its canonical dataset

use std::collections::HashSet;

use super::constants::{
    DATA_SET_PARAMETERS, DEFAULT_VALUE, NAME, QUERY, QUERY_PARAMETER, QUERY_PARAMETERS, VALUE,
};
use crate::error::RdlMigrateError;
use crate::xml::{Element, QName};

/// Merge the stub's query parameters with the canonical dataset's declared
/// parameters and attach the result to the canonical `Query`.
///
/// Parameters already set on the stub win. A declared parameter the stub
/// does not set is added with its default value (empty when it has none).
/// The `DataSetParameters` declaration block is removed from `canonical`.
/// Nothing is attached when the merged block is empty.
pub fn align_parameters(stub: &Element, canonical: &mut Element) -> Result<(), RdlMigrateError> {
    let ns = stub.name.namespace();
    let block_name = QName::new(ns, QUERY_PARAMETERS);

    let mut query_parameters = stub
        .find_descendant(&block_name)
        .cloned()
        .unwrap_or_else(|| Element::new(block_name));

    let mut present: HashSet<String> = query_parameters
        .elements()
        .filter_map(|p| p.attribute(NAME))
        .map(str::to_string)
        .collect();

    if let Some(path) = canonical.descendant_path(&QName::new(ns, DATA_SET_PARAMETERS)) {
        if let Some(declarations) = canonical.take_at_path(&path) {
            let default_name = QName::new(ns, DEFAULT_VALUE);
            for declared in declarations.elements() {
                let Some(name) = declared.attribute(NAME) else {
                    continue;
                };
                if !present.insert(name.to_string()) {
                    continue;
                }
                let default = declared
                    .child(&default_name)
                    .map(Element::text)
                    .unwrap_or_default();
                log::debug!("Adding query parameter {} with default '{}'", name, default);
                query_parameters.push(query_parameter(ns, name, default));
            }
        }
    }

    if !query_parameters.has_children() {
        return Ok(());
    }

    let name = canonical_name(canonical);
    let query = canonical
        .find_descendant_mut(&QName::new(ns, QUERY))
        .ok_or_else(|| RdlMigrateError::InvalidCanonicalDataset {
            name,
            message: format!("no {} element to attach parameters to", QUERY),
        })?;
    query.push(query_parameters);
    Ok(())
}

fn query_parameter(ns: Option<&str>, name: &str, value: String) -> Element {
    let mut parameter = Element::new(QName::new(ns, QUERY_PARAMETER));
    parameter.set_attribute(NAME, name);
    parameter.push(Element::with_text(QName::new(ns, VALUE), value));
    parameter
}

fn canonical_name(canonical: &Element) -> String {
    canonical.attribute(NAME).unwrap_or_default().to_string()
}
