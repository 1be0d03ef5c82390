//! Element adapter interface and arena document tree.
//!
//! The cascade engine and selector matcher never see a concrete DOM type;
//! they depend only on the [`Element`] capability trait defined here. Any
//! HTML/XML parser the host uses can implement it over its own node type.
//!
//! # Design
//!
//! [`DocTree`] is the reference implementation: an arena with [`NodeId`]
//! indices for all relationships, providing O(1) access and traversal
//! without borrow checker issues. It is what the style resolver walks and
//! what the test suites build their documents from.

use std::collections::HashMap;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// Capability interface over the host's document tree.
///
/// Implementations are cheap handles (tree reference + index); `Clone`
/// must be O(1). All navigation returns fresh handles, so selector
/// matching can walk ancestors and siblings without touching the
/// concrete tree type.
pub trait Element: Sized + Clone {
    /// The element's local tag name, lowercase.
    fn tag_name(&self) -> &str;

    /// The element's namespace, if the document declares one.
    fn namespace(&self) -> Option<&str>;

    /// The value of an attribute, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// The space-separated class tokens of the `class` attribute.
    fn class_list(&self) -> Vec<&str>;

    /// The `id` attribute value, if present.
    fn id(&self) -> Option<&str>;

    /// The nearest ancestor element, if any.
    fn parent(&self) -> Option<Self>;

    /// The nearest preceding sibling element (text nodes skipped).
    fn prev_sibling(&self) -> Option<Self>;

    /// The nearest following sibling element (text nodes skipped).
    fn next_sibling(&self) -> Option<Self>;

    /// Raw text of the `style` attribute, if present. The cascade engine
    /// parses it into declarations when the inline rulesets are built.
    fn inline_style(&self) -> Option<&str>;

    /// Whether a pseudo-state (`link`, `first-child`, ...) currently
    /// holds for this element. `params` carries the raw text inside the
    /// parentheses of functional pseudo-classes, empty otherwise.
    fn pseudo_state(&self, name: &str, params: &str) -> bool;

    /// A value unique to this element within its document, stable for
    /// the lifetime of one conversion run. Used to key the per-run
    /// matched-selector cache.
    fn identity(&self) -> usize;
}

/// A type-safe index into the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the arena tree.
///
/// Stores indices for parent/child/sibling relationships, enabling O(1)
/// traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// What kind of node this is.
    pub node_type: NodeType,
    /// Parent node, `None` only for the document root.
    pub parent: Option<NodeId>,
    /// Child nodes in document order.
    pub children: Vec<NodeId>,
    /// Next sibling in the parent's child list.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling in the parent's child list.
    pub prev_sibling: Option<NodeId>,
}

/// The kind of a tree node.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// The document root.
    Document,
    /// An element with tag name and attributes.
    Element(ElementData),
    /// A text run.
    Text(String),
}

/// Element-specific data: local name, optional namespace, attributes.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's local name, lowercase.
    pub tag_name: String,
    /// The element's namespace, if any.
    pub namespace: Option<String>,
    /// The element's attribute list.
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Create element data with no namespace and no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            namespace: None,
            attrs: AttributesMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        let _ = self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Builder-style namespace assignment.
    #[must_use]
    pub fn with_namespace(mut self, ns: &str) -> Self {
        self.namespace = Some(ns.to_string());
        self
    }
}

/// Arena-based document tree with O(1) node access and traversal.
#[derive(Debug, Clone, Default)]
pub struct DocTree {
    nodes: Vec<Node>,
}

impl DocTree {
    /// Create a new tree containing only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
                next_sibling: None,
                prev_sibling: None,
            }],
        }
    }

    /// The document root id.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Allocate a detached node and return its id.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Append `child` as the last child of `parent`, fixing up sibling
    /// links.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            self.nodes[last.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(last);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Convenience: allocate an element and append it in one step.
    pub fn append_element(&mut self, parent: NodeId, data: ElementData) -> NodeId {
        let id = self.alloc(NodeType::Element(data));
        self.append_child(parent, id);
        id
    }

    /// Convenience: allocate a text node and append it in one step.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.alloc(NodeType::Text(text.to_string()));
        self.append_child(parent, id);
        id
    }

    /// Get a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Children of a node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map_or(&[][..], |n| n.children.as_slice())
    }

    /// The element data of a node, if it is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id.0).map(|n| &n.node_type) {
            Some(NodeType::Element(data)) => Some(data),
            _ => None,
        }
    }

    /// An adapter handle for a node, if it is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.as_element(id).map(|_| ElementRef { tree: self, id })
    }
}

/// Cheap element handle implementing the [`Element`] adapter over a
/// [`DocTree`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a DocTree,
    /// The node this handle points at.
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    fn data(&self) -> &'a ElementData {
        match &self.tree.nodes[self.id.0].node_type {
            NodeType::Element(data) => data,
            // `element()` is the only constructor and it checks the kind.
            _ => unreachable!("ElementRef over non-element node"),
        }
    }

    fn sibling(&self, forward: bool) -> Option<Self> {
        let mut cursor = self.id;
        loop {
            let node = &self.tree.nodes[cursor.0];
            let next = if forward {
                node.next_sibling
            } else {
                node.prev_sibling
            };
            cursor = next?;
            if self.tree.as_element(cursor).is_some() {
                return Some(Self {
                    tree: self.tree,
                    id: cursor,
                });
            }
        }
    }
}

impl Element for ElementRef<'_> {
    fn tag_name(&self) -> &str {
        &self.data().tag_name
    }

    fn namespace(&self) -> Option<&str> {
        self.data().namespace.as_deref()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.data().attrs.get(name).map(String::as_str)
    }

    fn class_list(&self) -> Vec<&str> {
        self.data()
            .attrs
            .get("class")
            .map_or_else(Vec::new, |c| c.split_ascii_whitespace().collect())
    }

    fn id(&self) -> Option<&str> {
        self.data().attrs.get("id").map(String::as_str)
    }

    fn parent(&self) -> Option<Self> {
        let parent = self.tree.nodes[self.id.0].parent?;
        self.tree.element(parent)
    }

    fn prev_sibling(&self) -> Option<Self> {
        self.sibling(false)
    }

    fn next_sibling(&self) -> Option<Self> {
        self.sibling(true)
    }

    fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    fn pseudo_state(&self, name: &str, _params: &str) -> bool {
        // Static documents: only states derivable from the tree hold.
        match name {
            "first-child" => self.prev_sibling().is_none(),
            "last-child" => self.next_sibling().is_none(),
            "link" => {
                (self.tag_name() == "a" || self.tag_name() == "area")
                    && self.attr("href").is_some()
            }
            "disabled" => self.attr("disabled").is_some(),
            "enabled" => self.attr("disabled").is_none(),
            _ => false,
        }
    }

    fn identity(&self) -> usize {
        self.id.0
    }
}
