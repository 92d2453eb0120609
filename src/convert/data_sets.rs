//! Embedding canonical shared datasets into their report stubs

use super::constants::{
    DATA_SETS, DATA_SOURCE, DATA_SOURCES, DATA_SOURCE_NAME, DATA_SOURCE_REFERENCE, FIELDS, NAME,
    QUERY, SHARED_DATA_SET, SHARED_DATA_SET_REFERENCE,
};
use super::fields::align_fields;
use super::filters::align_filters;
use super::namespace::rewrite_namespace;
use super::parameters::align_parameters;
use crate::error::RdlMigrateError;
use crate::model::{CanonicalDataSets, DataSetKey, DataSourceNameCache};
use crate::xml::{Document, Element, QName};

/// Replace every shared dataset stub in `document` with an embedded query
/// built from its canonical dataset. Returns the number of stubs embedded.
///
/// A stub is any child of the first `DataSets` container with exactly one
/// `SharedDataSetReference`. Its canonical tree is looked up by
/// `(owner_path, stub name)`; a missing entry aborts the conversion.
pub fn embed_data_sets(
    owner_path: &str,
    document: &mut Document,
    canonical: &CanonicalDataSets,
    names: &DataSourceNameCache,
) -> Result<usize, RdlMigrateError> {
    let ns = document.namespace().map(str::to_string);
    let ns = ns.as_deref();

    let Some(container) = document.root.find_descendant_mut(&QName::new(ns, DATA_SETS)) else {
        return Ok(0);
    };

    let reference_name = QName::new(ns, SHARED_DATA_SET_REFERENCE);
    let mut embedded = 0;

    for stub in container.elements_mut() {
        let mut references = stub.descendants().filter(|el| el.name == reference_name);
        let Some(reference) = references.next() else {
            continue;
        };
        if references.next().is_some() {
            continue;
        }
        let reference = reference.text().trim().to_string();

        let stub_name = stub
            .attribute(NAME)
            .ok_or_else(|| RdlMigrateError::InvalidDataSetStub {
                message: format!("dataset referencing {} has no {}", reference, NAME),
            })?
            .to_string();

        let key = DataSetKey::new(owner_path, stub_name.as_str());
        let data_set = canonical.instantiate(&key).ok_or_else(|| {
            RdlMigrateError::MissingCanonicalDataset {
                data_set: stub_name.clone(),
                reference: reference.clone(),
            }
        })?;

        log::debug!("Embedding shared dataset {} as {}", reference, stub_name);
        embed_one(ns, stub, data_set, &stub_name, names)?;
        embedded += 1;
    }

    Ok(embedded)
}

/// Check that every data source name handed out to an embedded dataset
/// names a `DataSource` embedded in `document`.
///
/// Names the report declared itself are left alone; only names assigned by
/// `names` are checked.
pub fn ensure_data_sources_embedded(
    document: &Document,
    names: &DataSourceNameCache,
) -> Result<(), RdlMigrateError> {
    let ns = document.namespace();

    let embedded: Vec<&str> = document
        .root
        .find_descendant(&QName::new(ns, DATA_SOURCES))
        .map(|container| {
            container
                .elements()
                .filter(|el| el.name.local == DATA_SOURCE)
                .filter_map(|el| el.attribute(NAME))
                .collect()
        })
        .unwrap_or_default();

    let Some(data_sets) = document.root.find_descendant(&QName::new(ns, DATA_SETS)) else {
        return Ok(());
    };

    let source_name = QName::new(ns, DATA_SOURCE_NAME);
    for name in data_sets.descendants().filter(|el| el.name == source_name) {
        let name = name.text();
        let name = name.trim();
        if embedded.contains(&name) {
            continue;
        }
        if let Some(reference) = names.reference_for(name) {
            return Err(RdlMigrateError::UnresolvedDataSource {
                name: name.to_string(),
                reference,
            });
        }
    }

    Ok(())
}

fn embed_one(
    ns: Option<&str>,
    stub: &mut Element,
    mut data_set: Element,
    stub_name: &str,
    names: &DataSourceNameCache,
) -> Result<(), RdlMigrateError> {
    rewrite_namespace(ns, &mut data_set);

    if let Some(path) = data_set.descendant_path(&QName::new(ns, DATA_SOURCE_REFERENCE)) {
        let reference = data_set
            .at_path(&path)
            .map(|el| el.text().trim().to_string())
            .unwrap_or_default();
        let source_name = names.assign(&reference);
        data_set.replace_at_path(
            &path,
            Element::with_text(QName::new(ns, DATA_SOURCE_NAME), source_name),
        );
    }

    data_set.set_attribute(NAME, stub_name);

    align_parameters(stub, &mut data_set)?;

    let query = data_set
        .descendant_path(&QName::new(ns, QUERY))
        .and_then(|path| data_set.take_at_path(&path))
        .ok_or_else(|| RdlMigrateError::InvalidCanonicalDataset {
            name: stub_name.to_string(),
            message: format!("no {} element", QUERY),
        })?;
    let shared_path = stub
        .descendant_path(&QName::new(ns, SHARED_DATA_SET))
        .ok_or_else(|| RdlMigrateError::InvalidDataSetStub {
            message: format!("{} has no {} element", stub_name, SHARED_DATA_SET),
        })?;
    stub.replace_at_path(&shared_path, query);

    let fields_name = QName::new(ns, FIELDS);
    let stub_fields = stub.descendant_paths(&fields_name);
    let canonical_fields = data_set.descendant_paths(&fields_name);
    if stub_fields.len() == 1 && canonical_fields.len() == 1 {
        if let (Some(report_fields), Some(source_fields)) = (
            stub.at_path_mut(&stub_fields[0]),
            data_set.at_path(&canonical_fields[0]),
        ) {
            align_fields(report_fields, source_fields);
        }
    }

    align_filters(stub, &data_set)
}
