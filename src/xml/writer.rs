//! Serialize the owned element tree with `quick-xml`.
//!
//! Element and attribute names carry namespace URIs, not prefixes. The
//! writer tracks the bindings in scope and picks a prefix for every name,
//! declaring a namespace where nothing in scope binds it. Elements grafted
//! in from other documents therefore serialize correctly even when the
//! target document never declared their namespace.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::element::{Document, Element, Node};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix -> URI bindings in scope (None is the default namespace).
type Scope = BTreeMap<Option<String>, String>;

/// Write a document, with XML declaration and two-space indentation.
pub fn write_document<W: Write>(writer: W, doc: &Document) -> anyhow::Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    for node in &doc.prolog {
        if let Node::Comment(c) = node {
            xml_writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?;
        }
    }

    write_element(&mut xml_writer, &doc.root, &Scope::new())?;
    Ok(())
}

/// Serialize a document to a string.
pub fn document_to_string(doc: &Document) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    write_document(&mut buffer, doc)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    parent_scope: &Scope,
) -> anyhow::Result<()> {
    let mut scope = parent_scope.clone();
    let mut declarations: Vec<(Option<String>, String)> = Vec::new();

    for decl in &element.namespaces {
        if scope.get(&decl.prefix) != Some(&decl.uri) {
            declare(&mut declarations, &mut scope, decl.prefix.clone(), &decl.uri);
        }
    }

    let tag = match element.name.namespace() {
        Some(uri) => match prefix_for(&scope, uri, true) {
            Some(prefix) => qualify(prefix.as_deref(), &element.name.local),
            None => {
                declare(&mut declarations, &mut scope, None, uri);
                element.name.local.clone()
            }
        },
        None => {
            if scope.get(&None).is_some_and(|uri| !uri.is_empty()) {
                declare(&mut declarations, &mut scope, None, "");
            }
            element.name.local.clone()
        }
    };

    let mut attributes: Vec<(String, &str)> = Vec::with_capacity(element.attributes.len());
    for attr in &element.attributes {
        let key = match attr.name.namespace() {
            None => attr.name.local.clone(),
            Some(XML_NAMESPACE) => format!("xml:{}", attr.name.local),
            Some(uri) => {
                let prefix = match prefix_for(&scope, uri, false) {
                    Some(prefix) => prefix,
                    None => {
                        let generated = generate_prefix(&scope);
                        declare(&mut declarations, &mut scope, Some(generated.clone()), uri);
                        Some(generated)
                    }
                };
                qualify(prefix.as_deref(), &attr.name.local)
            }
        };
        attributes.push((key, attr.value.as_str()));
    }

    let mut start = BytesStart::new(tag.as_str());
    for (prefix, uri) in &declarations {
        match prefix {
            Some(p) => start.push_attribute((format!("xmlns:{}", p).as_str(), uri.as_str())),
            None => start.push_attribute(("xmlns", uri.as_str())),
        }
    }
    for (key, value) in &attributes {
        start.push_attribute((key.as_str(), *value));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(writer, el, &scope)?,
            Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            Node::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    Ok(())
}

fn declare(
    declarations: &mut Vec<(Option<String>, String)>,
    scope: &mut Scope,
    prefix: Option<String>,
    uri: &str,
) {
    match declarations.iter_mut().find(|(p, _)| *p == prefix) {
        Some((_, existing)) => *existing = uri.to_string(),
        None => declarations.push((prefix.clone(), uri.to_string())),
    }
    scope.insert(prefix, uri.to_string());
}

/// Find a prefix bound to `uri`. `Some(None)` means the default namespace,
/// which attributes may not use.
fn prefix_for(scope: &Scope, uri: &str, allow_default: bool) -> Option<Option<String>> {
    if allow_default && scope.get(&None).map(String::as_str) == Some(uri) {
        return Some(None);
    }
    scope
        .iter()
        .find(|(prefix, bound)| prefix.is_some() && bound.as_str() == uri)
        .map(|(prefix, _)| prefix.clone())
}

fn generate_prefix(scope: &Scope) -> String {
    (1..)
        .map(|n| format!("ns{}", n))
        .find(|candidate| !scope.contains_key(&Some(candidate.clone())))
        .unwrap_or_else(|| "ns".to_string())
}

fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}
