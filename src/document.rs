//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]. Child and
//! attribute links are owned indices; the parent link is a plain back-reference
//! used for navigation and diagnostics only. Nodes are appended in document
//! order, so comparing two ids compares their position in the document.

use std::cell::OnceCell;
use std::fmt;

use crate::error::{ParseError, ParseErrorKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use sxd_document::Package;

/// Index of a node inside its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    /// Attribute value or text content; `None` for elements.
    pub value: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, name: &str, value: Option<String>, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            name: name.to_string(),
            value,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// An immutable-after-load tree of named, text-bearing nodes.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// XPath mirror, built on first query; `None` inside when too deep.
    xpath: OnceCell<Option<Package>>,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Document {
            nodes: self.nodes.clone(),
            root: self.root,
            xpath: OnceCell::new(),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes)
            .field("root", &self.root)
            .finish()
    }
}

impl Document {
    /// Creates a document holding a single root element.
    pub fn new(root_name: &str) -> Self {
        Document {
            nodes: vec![Node::new(NodeKind::Element, root_name, None, None)],
            root: NodeId(0),
            xpath: OnceCell::new(),
        }
    }

    /// The document element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).attributes
    }

    /// Looks up an attribute value on an element by name.
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.attributes(element)
            .iter()
            .map(|&a| self.node(a))
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    /// Element children only, skipping text nodes.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == NodeKind::Element)
    }

    /// Text content of a node.
    ///
    /// Elements yield the concatenation of every descendant text node in
    /// document order; attributes and text nodes yield their own value.
    pub fn text_content(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.kind {
            NodeKind::Attribute | NodeKind::Text => node.value.clone().unwrap_or_default(),
            NodeKind::Element => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            let node = self.node(next);
            match node.kind {
                NodeKind::Text => out.push_str(node.value.as_deref().unwrap_or("")),
                NodeKind::Element => pending.extend(node.children.iter().rev().copied()),
                NodeKind::Attribute => {}
            }
        }
    }

    pub(crate) fn xpath_tree(&self) -> Option<&Package> {
        self.xpath
            .get_or_init(|| crate::query::build_tree(self))
            .as_ref()
    }

    /// True when a node appended under `parent` lands last in document order,
    /// i.e. `parent` is the last node or one of its ancestors.
    fn appends_in_order(&self, parent: NodeId) -> bool {
        let mut current = Some(NodeId(self.nodes.len() - 1));
        while let Some(id) = current {
            if id == parent {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Iterates over every node in document order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Appends an element as the last child of `parent`.
    ///
    /// Nodes must be appended in document order: `parent` has to be the most
    /// recently appended node or one of its ancestors.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        debug_assert!(
            self.appends_in_order(parent),
            "append_element out of document order"
        );
        let id = self.push(Node::new(NodeKind::Element, name, None, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        debug_assert!(
            self.appends_in_order(parent),
            "append_text out of document order"
        );
        let id = self.push(Node::new(
            NodeKind::Text,
            "#text",
            Some(text.to_string()),
            Some(parent),
        ));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Adds an attribute to `element`.
    ///
    /// Attributes must be appended before the element's children to keep
    /// document order, which is what the parser does.
    pub fn append_attribute(&mut self, element: NodeId, name: &str, value: &str) -> NodeId {
        debug_assert!(
            self.children(element).is_empty() && self.appends_in_order(element),
            "append_attribute after the element's children"
        );
        let id = self.push(Node::new(
            NodeKind::Attribute,
            name,
            Some(value.to_string()),
            Some(element),
        ));
        self.nodes[element.0].attributes.push(id);
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.xpath.take();
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

/// Parse an XML string into a [`Document`].
///
/// Text is kept as written, except that whitespace-only text nodes are
/// dropped. Comments, processing instructions, the declaration and the doctype
/// are skipped.
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Syntax, "empty input"));
    }

    let mut reader = Reader::from_str(input);

    let mut doc: Option<Document> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            ParseError::new(ParseErrorKind::Syntax, e.to_string())
                .at_offset(input, reader.error_position() as usize)
        })?;

        match event {
            Event::Start(start) => {
                let id = open_element(input, offset, &mut doc, &stack, &start)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                open_element(input, offset, &mut doc, &stack, &start)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| {
                    ParseError::new(ParseErrorKind::Syntax, e.to_string()).at_offset(input, offset)
                })?;
                append_text(input, offset, &mut doc, &stack, &text)?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                let text = String::from_utf8_lossy(&raw);
                append_text(input, offset, &mut doc, &stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(&open) = stack.last() {
        let name = doc.as_ref().map(|d| d.name(open).to_string()).unwrap_or_default();
        return Err(ParseError::new(
            ParseErrorKind::Structure,
            format!("unclosed element <{}>", name),
        )
        .at_offset(input, input.len()));
    }

    doc.ok_or_else(|| ParseError::new(ParseErrorKind::Structure, "document has no root element"))
}

fn open_element(
    input: &str,
    offset: usize,
    doc: &mut Option<Document>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId, ParseError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            ParseError::new(ParseErrorKind::Syntax, e.to_string()).at_offset(input, offset)
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| {
            ParseError::new(ParseErrorKind::Syntax, e.to_string()).at_offset(input, offset)
        })?;
        attributes.push((key, value.into_owned()));
    }

    if doc.is_some() && stack.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::Structure,
            format!("multiple root elements: unexpected <{}>", name),
        )
        .at_offset(input, offset));
    }
    let d = doc.get_or_insert_with(|| Document::new(&name));

    let id = match stack.last() {
        Some(&parent) => d.append_element(parent, &name),
        None => d.root(),
    };
    for (key, value) in &attributes {
        d.append_attribute(id, key, value);
    }

    Ok(id)
}

fn append_text(
    input: &str,
    offset: usize,
    doc: &mut Option<Document>,
    stack: &[NodeId],
    text: &str,
) -> Result<(), ParseError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match (doc.as_mut(), stack.last()) {
        (Some(d), Some(&parent)) => {
            d.append_text(parent, text);
            Ok(())
        }
        _ => Err(ParseError::new(
            ParseErrorKind::Structure,
            "text content outside the root element",
        )
        .at_offset(input, offset)),
    }
}
