//! Filter reconciliation: canonical predicates run ahead of report ones

use super::constants::FILTERS;
use crate::error::RdlMigrateError;
use crate::xml::{Element, Node, QName};

/// Prepend the canonical dataset's filter predicates to the stub's
/// `Filters` block, creating the block when the stub has none.
///
/// Either side having more than one `Filters` block is malformed input.
pub fn align_filters(stub: &mut Element, canonical: &Element) -> Result<(), RdlMigrateError> {
    let canonical_name = QName::new(canonical.name.namespace(), FILTERS);
    let stub_name = QName::new(stub.name.namespace(), FILTERS);

    let canonical_paths = canonical.descendant_paths(&canonical_name);
    ensure_single(canonical, canonical_paths.len())?;
    let stub_paths = stub.descendant_paths(&stub_name);
    ensure_single(stub, stub_paths.len())?;

    let Some(canonical_block) = canonical_paths.first().and_then(|p| canonical.at_path(p)) else {
        return Ok(());
    };
    let predicates: Vec<Node> = canonical_block
        .elements()
        .cloned()
        .map(Node::Element)
        .collect();

    let block = match stub_paths.first() {
        Some(path) => stub.at_path_mut(path),
        None => {
            stub.push(Element::new(stub_name));
            stub.elements_mut().last()
        }
    };
    let Some(block) = block else {
        return Ok(());
    };

    log::debug!("Prepending {} canonical filters", predicates.len());
    block.children.splice(0..0, predicates);
    Ok(())
}

fn ensure_single(owner: &Element, count: usize) -> Result<(), RdlMigrateError> {
    if count > 1 {
        return Err(RdlMigrateError::MalformedFilterStructure {
            element: owner.name.local.clone(),
            count,
        });
    }
    Ok(())
}
