//! XML document model for report definitions

mod element;
mod reader;
mod writer;

pub use element::{Attribute, Descendants, Document, Element, NamespaceDecl, Node, QName};
pub use reader::{parse_document, parse_element};
pub use writer::{document_to_string, write_document};
