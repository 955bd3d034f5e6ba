//! Query evaluation over a [`Document`].
//!
//! The traversal engine only needs "evaluate this expression from this node".
//! That capability is the [`QueryEvaluator`] trait; [`PathEvaluator`] is the
//! default implementation, an XPath 1.0 evaluator backed by `sxd-xpath`.
//!
//! ```text
//! book                      child elements named book
//! //book[@lang='en']        every English book in the document
//! self::*//computer         computer descendants of the context element
//! book/title/text()         text nodes
//! //ip | //netaddress       union, in document order
//! ```
//!
//! Expressions must select nodes; one that evaluates to a number, string or
//! boolean is an error.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use sxd_document::{Package, dom};
use sxd_xpath::nodeset::Node as XNode;
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::document::{Document, NodeId, NodeKind};
use crate::error::QueryError;

/// Deepest element nesting [`PathEvaluator`] evaluates against.
pub const MAX_QUERY_DEPTH: usize = 256;

/// Extension point for query evaluation.
pub trait QueryEvaluator {
    /// Evaluates `expression` with `context` as the context node.
    ///
    /// Returns the matching nodes in document order. An empty vec means the
    /// expression matched nothing, which is not an error.
    fn select(
        &self,
        doc: &Document,
        context: NodeId,
        expression: &str,
    ) -> Result<Vec<NodeId>, QueryError>;

    /// Checks an expression without evaluating it. Accepts everything by default.
    fn check(&self, _expression: &str) -> Result<(), QueryError> {
        Ok(())
    }
}

impl<F> QueryEvaluator for F
where
    F: Fn(&Document, NodeId, &str) -> Result<Vec<NodeId>, QueryError>,
{
    fn select(
        &self,
        doc: &Document,
        context: NodeId,
        expression: &str,
    ) -> Result<Vec<NodeId>, QueryError> {
        self(doc, context, expression)
    }
}

/// Default XPath evaluator. Compiled expressions are cached by their text.
#[derive(Default)]
pub struct PathEvaluator {
    compiled: RefCell<HashMap<String, Rc<Query>>>,
}

impl PathEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(&self, expression: &str) -> Result<Rc<Query>, QueryError> {
        if let Some(query) = self.compiled.borrow().get(expression) {
            return Ok(Rc::clone(query));
        }
        let query = Rc::new(Query::parse(expression)?);
        self.compiled
            .borrow_mut()
            .insert(expression.to_string(), Rc::clone(&query));
        Ok(query)
    }
}

impl fmt::Debug for PathEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathEvaluator")
            .field("compiled", &self.compiled.borrow().len())
            .finish()
    }
}

impl QueryEvaluator for PathEvaluator {
    fn select(
        &self,
        doc: &Document,
        context: NodeId,
        expression: &str,
    ) -> Result<Vec<NodeId>, QueryError> {
        self.compile(expression)?.select(doc, context)
    }

    /// Compiles the expression and evaluates it once against an empty
    /// document, so non-node results and unknown functions are caught early.
    fn check(&self, expression: &str) -> Result<(), QueryError> {
        let query = self.compile(expression)?;
        let package = Package::new();
        let empty = package.as_document();
        query.evaluate(empty.root().into()).map(|_| ())
    }
}

// ─── Compiled query ─────────────────────────────────────────────────────────

/// A compiled XPath expression.
pub struct Query {
    expression: String,
    xpath: XPath,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.expression).finish()
    }
}

impl Query {
    /// Compiles an expression.
    pub fn parse(expression: &str) -> Result<Query, QueryError> {
        if expression.trim().is_empty() {
            return Err(QueryError::new(expression, "empty expression"));
        }
        let xpath = Factory::new()
            .build(expression)
            .map_err(|e| QueryError::new(expression, e.to_string()))?
            .ok_or_else(|| QueryError::new(expression, "empty expression"))?;
        Ok(Query {
            expression: expression.to_string(),
            xpath,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluates the query from `context`, returning nodes in document order.
    ///
    /// Fails if the expression does not yield a node-set, or if the document
    /// nests elements deeper than [`MAX_QUERY_DEPTH`].
    pub fn select(&self, doc: &Document, context: NodeId) -> Result<Vec<NodeId>, QueryError> {
        let package = doc.xpath_tree().ok_or_else(|| {
            QueryError::new(
                &self.expression,
                format!("document nests elements deeper than {}", MAX_QUERY_DEPTH),
            )
        })?;
        let tree = package.as_document();
        let Some(start) = locate(doc, &tree, context) else {
            return Ok(Vec::new());
        };
        let nodes = self.evaluate(start)?;
        Ok(nodes.into_iter().filter_map(|n| resolve(doc, n)).collect())
    }

    fn evaluate<'d>(&self, start: XNode<'d>) -> Result<Vec<XNode<'d>>, QueryError> {
        let context = Context::new();
        let value = self
            .xpath
            .evaluate(&context, start)
            .map_err(|e| QueryError::new(&self.expression, e.to_string()))?;
        match value {
            Value::Nodeset(nodes) => Ok(nodes.document_order()),
            Value::Boolean(_) => Err(self.not_a_node_set("boolean")),
            Value::Number(_) => Err(self.not_a_node_set("number")),
            Value::String(_) => Err(self.not_a_node_set("string")),
        }
    }

    fn not_a_node_set(&self, kind: &str) -> QueryError {
        QueryError::new(
            &self.expression,
            format!("expression yields a {} instead of nodes", kind),
        )
    }
}

// ─── Tree mirror ────────────────────────────────────────────────────────────

/// Mirrors `doc` into an XPath tree, or `None` when it is too deep to query.
///
/// Siblings are created in arena order, so a node's index among its parent's
/// children is the same in both trees.
pub(crate) fn build_tree(doc: &Document) -> Option<Package> {
    let mut depth = vec![0usize; doc.len()];
    for id in doc.iter() {
        if let Some(parent) = doc.parent(id) {
            depth[id.index()] = depth[parent.index()] + 1;
            if depth[id.index()] > MAX_QUERY_DEPTH {
                return None;
            }
        }
    }

    let package = Package::new();
    {
        let tree = package.as_document();
        let mut elements: Vec<Option<dom::Element<'_>>> = vec![None; doc.len()];
        for id in doc.iter() {
            let owner = doc.parent(id).and_then(|p| elements[p.index()]);
            let node = doc.node(id);
            match (node.kind, owner) {
                (NodeKind::Element, None) => {
                    let element = tree.create_element(node.name.as_str());
                    tree.root().append_child(element);
                    elements[id.index()] = Some(element);
                }
                (NodeKind::Element, Some(owner)) => {
                    let element = tree.create_element(node.name.as_str());
                    owner.append_child(element);
                    elements[id.index()] = Some(element);
                }
                (NodeKind::Attribute, Some(owner)) => {
                    let value = node.value.as_deref().unwrap_or("");
                    owner.set_attribute_value(node.name.as_str(), value);
                }
                (NodeKind::Text, Some(owner)) => {
                    owner.append_child(tree.create_text(node.value.as_deref().unwrap_or("")));
                }
                _ => {}
            }
        }
    }
    Some(package)
}

/// Finds the mirror of `id` by replaying its child positions from the root.
fn locate<'d>(doc: &Document, tree: &dom::Document<'d>, id: NodeId) -> Option<XNode<'d>> {
    let mut chain = Vec::new();
    let mut current = id;
    while let Some(parent) = doc.parent(current) {
        chain.push(current);
        current = parent;
    }

    let mut element = tree.root().children().into_iter().find_map(|c| match c {
        dom::ChildOfRoot::Element(e) => Some(e),
        _ => None,
    })?;

    while let Some(next) = chain.pop() {
        let parent = doc.parent(next)?;
        if doc.kind(next) == NodeKind::Attribute {
            return element.attribute(doc.name(next)).map(XNode::Attribute);
        }
        let index = doc.children(parent).iter().position(|&c| c == next)?;
        match element.children().get(index)? {
            dom::ChildOfElement::Element(e) => element = *e,
            dom::ChildOfElement::Text(t) => return Some(XNode::Text(*t)),
            _ => return None,
        }
    }
    Some(XNode::Element(element))
}

/// Maps an XPath result back to its [`NodeId`]. The document node and node
/// kinds the arena does not hold map to `None`.
fn resolve(doc: &Document, node: XNode<'_>) -> Option<NodeId> {
    match node {
        XNode::Element(e) => element_id(doc, e),
        XNode::Attribute(a) => {
            let owner = element_id(doc, a.parent()?)?;
            let name = a.name().local_part();
            doc.attributes(owner)
                .iter()
                .copied()
                .find(|&id| doc.name(id) == name)
        }
        XNode::Text(t) => {
            let parent = t.parent()?;
            let index = parent
                .children()
                .iter()
                .position(|c| matches!(c, dom::ChildOfElement::Text(x) if *x == t))?;
            let owner = element_id(doc, parent)?;
            doc.children(owner).get(index).copied()
        }
        _ => None,
    }
}

fn element_id(doc: &Document, element: dom::Element<'_>) -> Option<NodeId> {
    // Child positions, innermost first.
    let mut positions = Vec::new();
    let mut current = element;
    while let dom::ParentOfChild::Element(parent) = current.parent()? {
        let index = parent
            .children()
            .iter()
            .position(|c| matches!(c, dom::ChildOfElement::Element(x) if *x == current))?;
        positions.push(index);
        current = parent;
    }

    let mut id = doc.root();
    while let Some(index) = positions.pop() {
        id = *doc.children(id).get(index)?;
    }
    Some(id)
}
