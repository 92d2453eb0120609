//! Structural namespace rewriting

use super::constants::{QUERY_DEFINITION, REPORT_DESIGNER_NS};
use crate::xml::Element;

/// Move `element` and its descendants into `target`.
///
/// `QueryDefinition` subtrees and designer-namespace subtrees keep their
/// names; both carry provider-specific content rather than report elements.
/// Default namespace declarations on rewritten elements are dropped so the
/// writer binds the target namespace instead.
pub fn rewrite_namespace(target: Option<&str>, element: &mut Element) {
    if is_excluded(element) {
        return;
    }

    element.name = element.name.in_namespace(target);
    element.namespaces.retain(|decl| decl.prefix.is_some());
    for child in element.elements_mut() {
        rewrite_namespace(target, child);
    }
}

fn is_excluded(element: &Element) -> bool {
    element.name.local == QUERY_DEFINITION || element.name.namespace() == Some(REPORT_DESIGNER_NS)
}
