//! Field reconciliation between a stub's `Fields` block and the canonical one

use indexmap::IndexMap;

use super::constants::{DATA_FIELD, NAME, VALUE};
use crate::xml::{Element, QName};

/// Merge canonical field definitions into the stub's field list.
///
/// A stub field with exactly one `DataField` and no `Value` takes the
/// matching canonical field's `Value`, or failing that its `DataField`. The
/// canonical field is matched by the stub's `DataField` text, then by the
/// stub field's own name. Matched canonical fields with the stub field's
/// name are consumed; every canonical field left over is appended to
/// `report_fields` in canonical order.
pub fn align_fields(report_fields: &mut Element, canonical_fields: &Element) {
    let mut pending: IndexMap<String, Element> = IndexMap::new();
    for field in canonical_fields.elements() {
        if let Some(name) = field.attribute(NAME) {
            pending
                .entry(name.to_string())
                .or_insert_with(|| field.clone());
        }
    }

    for field in report_fields.elements_mut() {
        let ns = field.name.namespace().map(str::to_string);
        let data_field_name = QName::new(ns.as_deref(), DATA_FIELD);
        let value_name = QName::new(ns.as_deref(), VALUE);

        let paths = field.descendant_paths(&data_field_name);
        if paths.len() != 1 || field.count_descendants(&value_name) != 0 {
            continue;
        }
        let path = &paths[0];
        let source = field.at_path(path).map(Element::text).unwrap_or_default();
        let own_name = field.attribute(NAME).unwrap_or_default().to_string();

        let key = if pending.contains_key(&source) {
            source
        } else if pending.contains_key(&own_name) {
            own_name.clone()
        } else {
            continue;
        };
        let Some(canonical) = pending.get(&key) else {
            continue;
        };

        if let Some(mut replacement) = expression_of(canonical) {
            replacement.name = replacement.name.in_namespace(ns.as_deref());
            field.replace_at_path(path, replacement);
        }

        if canonical.attribute(NAME) == Some(own_name.as_str()) {
            pending.shift_remove(&key);
        }
    }

    let ns = report_fields.name.namespace().map(str::to_string);
    for (name, mut field) in pending {
        log::debug!("Appending canonical-only field {}", name);
        field.name = field.name.in_namespace(ns.as_deref());
        report_fields.push(field);
    }
}

/// The canonical field's single `Value`, else its single `DataField`.
fn expression_of(field: &Element) -> Option<Element> {
    let ns = field.name.namespace();
    let single = |local: &str| {
        let name = QName::new(ns, local);
        let mut matches = field.descendants().filter(|el| el.name == name);
        let first = matches.next()?;
        matches.next().is_none().then(|| first.clone())
    };
    single(VALUE).or_else(|| single(DATA_FIELD))
}
