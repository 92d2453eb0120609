//! Build the owned element tree from a `roxmltree` parse.

use roxmltree::ParsingOptions;

use super::element::{Attribute, Document, Element, NamespaceDecl, Node, QName};

/// Prefix bound by XML itself; never declared explicitly.
const XML_PREFIX: &str = "xml";

/// Parse XML text into an owned [`Document`].
///
/// Whitespace-only text between child elements is dropped (the writer
/// re-indents); text inside leaf elements is preserved exactly.
pub fn parse_document(text: &str) -> Result<Document, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;

    let mut prolog = Vec::new();
    for node in doc.root().children() {
        if node.is_element() {
            break;
        }
        if node.is_comment() {
            prolog.push(Node::Comment(node.text().unwrap_or("").to_string()));
        }
    }

    Ok(Document {
        prolog,
        root: build_element(doc.root_element()),
    })
}

/// Parse XML text and return just its root element.
pub fn parse_element(text: &str) -> Result<Element, roxmltree::Error> {
    parse_document(text).map(|doc| doc.root)
}

fn build_element(node: roxmltree::Node) -> Element {
    let name = QName::new(node.tag_name().namespace(), node.tag_name().name());

    let attributes = node
        .attributes()
        .map(|a| Attribute {
            name: QName::new(a.namespace(), a.name()),
            value: a.value().to_string(),
        })
        .collect();

    let has_element_children = node.children().any(|c| c.is_element());
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(Node::Element(build_element(child)));
        } else if child.is_text() {
            let text = child.text().unwrap_or("");
            if has_element_children && text.trim().is_empty() {
                continue;
            }
            children.push(Node::Text(text.to_string()));
        } else if child.is_comment() {
            children.push(Node::Comment(child.text().unwrap_or("").to_string()));
        }
    }

    Element {
        name,
        attributes,
        namespaces: declared_namespaces(node),
        children,
    }
}

/// Namespaces declared on `node` itself rather than inherited.
///
/// `roxmltree` reports every in-scope namespace, so declarations are the
/// bindings that differ from the parent element's scope.
fn declared_namespaces(node: roxmltree::Node) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some(XML_PREFIX))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect()
}
