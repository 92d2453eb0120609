//! Owned, mutable XML element tree.
//!
//! `roxmltree` documents are read-only, but report conversion rewrites the
//! tree in place: elements are removed, replaced, renamed into other
//! namespaces and grafted between documents. This module provides the owned
//! representation the conversion engine works on. Cloning any `Element` is a
//! deep copy with no shared state.

use std::fmt;

/// Namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<String>,
    /// Local name
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Name without a namespace.
    pub fn unqualified(local: &str) -> Self {
        Self::new(None, local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Same local name, moved into `namespace`.
    pub fn in_namespace(&self, namespace: Option<&str>) -> Self {
        Self::new(namespace, &self.local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`) made on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Prefix (None for the default namespace)
    pub prefix: Option<String>,
    pub uri: String,
}

/// A child node of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An XML element with its attributes, declarations and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    /// Namespace declarations written on this element
    pub namespaces: Vec<NamespaceDecl>,
    pub children: Vec<Node>,
}

/// A parsed XML document: a single root element plus leading comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }

    /// Namespace of the root element, which report elements live in.
    pub fn namespace(&self) -> Option<&str> {
        self.root.name.namespace()
    }
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element whose only child is a text node.
    pub fn with_text(name: QName, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.set_text(text);
        element
    }

    /// Value of an un-namespaced attribute.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Set (or add) an un-namespaced attribute.
    pub fn set_attribute(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: QName::unqualified(local),
                value,
            }),
        }
    }

    /// Declare a namespace prefix on this element, replacing an existing
    /// declaration of the same prefix.
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        let prefix = prefix.map(str::to_string);
        match self.namespaces.iter_mut().find(|d| d.prefix == prefix) {
            Some(existing) => existing.uri = uri.to_string(),
            None => self.namespaces.push(NamespaceDecl {
                prefix,
                uri: uri.to_string(),
            }),
        }
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &QName) -> Option<&Element> {
        self.elements().find(|el| el.name == *name)
    }

    pub fn child_mut(&mut self, name: &QName) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == *name)
    }

    /// Whether the element has any content at all.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Insert an element before all existing content.
    pub fn prepend(&mut self, element: Element) {
        self.children.insert(0, Node::Element(element));
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Keep only the child elements matching `keep`; other nodes are untouched.
    pub fn retain_elements(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.children.retain(|node| match node {
            Node::Element(el) => keep(el),
            _ => true,
        });
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    pub fn count_descendants(&self, name: &QName) -> usize {
        self.descendants().filter(|el| el.name == *name).count()
    }

    /// First descendant element with the given name.
    pub fn find_descendant(&self, name: &QName) -> Option<&Element> {
        self.descendants().find(|el| el.name == *name)
    }

    pub fn find_descendant_mut(&mut self, name: &QName) -> Option<&mut Element> {
        let path = self.descendant_path(name)?;
        self.at_path_mut(&path)
    }

    /// Child-index path to the first descendant with the given name.
    ///
    /// Paths address `children` positions and are invalidated by any
    /// structural mutation above or before the target.
    pub fn descendant_path(&self, name: &QName) -> Option<Vec<usize>> {
        self.descendant_paths(name).into_iter().next()
    }

    /// Child-index paths to every descendant with the given name, in
    /// document order.
    pub fn descendant_paths(&self, name: &QName) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        self.collect_paths(name, &mut current, &mut out);
        out
    }

    fn collect_paths(&self, name: &QName, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (index, node) in self.children.iter().enumerate() {
            if let Node::Element(el) = node {
                current.push(index);
                if el.name == *name {
                    out.push(current.clone());
                }
                el.collect_paths(name, current, out);
                current.pop();
            }
        }
    }

    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &index in path {
            current = match current.children.get(index)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &index in path {
            current = match current.children.get_mut(index)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Detach the element at `path` and return it.
    pub fn take_at_path(&mut self, path: &[usize]) -> Option<Element> {
        let (&last, parent_path) = path.split_last()?;
        let parent = self.at_path_mut(parent_path)?;
        if !matches!(parent.children.get(last), Some(Node::Element(_))) {
            return None;
        }
        match parent.children.remove(last) {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Put `replacement` where the element at `path` is and return the old
    /// element.
    pub fn replace_at_path(&mut self, path: &[usize], replacement: Element) -> Option<Element> {
        let target = self.at_path_mut(path)?;
        Some(std::mem::replace(target, replacement))
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(_) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
