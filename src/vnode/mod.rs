//! Virtual Node Model - Immutable descriptions of what the surface should show.
//!
//! A [`VNode`] is either a text leaf or an element carrying a type, an
//! attribute mapping, ordered children, an optional reconciliation key and an
//! optional SVG namespace hint. An element with an empty type is an anonymous
//! fragment: it has no live node of its own and its children land directly in
//! the parent.
//!
//! Trees are built once per render pass and never mutated afterwards. The
//! engine consumes them by value when it records what it materialized.
//!
//! # Example
//!
//! ```
//! use spark_dom::vnode::{el, fragment, h};
//! use spark_dom::attrs;
//!
//! let list = h("ul", attrs! { "class" => "todo" }, [
//!     el("li").key("a").text("first"),
//!     el("li").key("b").text("second"),
//! ]);
//! assert_eq!(list.text_content(), "firstsecond");
//!
//! let numbers = fragment(["#1", "#2", "#3"]);
//! assert!(numbers.is_fragment());
//! ```

mod builder;
mod source;
mod validate;

pub use builder::{ElementBuilder, el, fragment, h, text};
pub use source::{Context, Source};

use crate::types::{AttrValue, Attributes, Namespace};

// =============================================================================
// VNode
// =============================================================================

/// A virtual node: one text leaf or one element description.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Text(String),
    Element(VElement),
}

impl VNode {
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text(_))
    }

    /// Whether this is an element with an empty type.
    #[inline]
    pub fn is_fragment(&self) -> bool {
        matches!(self, VNode::Element(e) if e.is_fragment())
    }

    /// Element type, `None` for text leaves.
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(e) => Some(&e.tag),
        }
    }

    /// Reconciliation key. Text leaves never carry one.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(e) => e.key.as_deref(),
        }
    }

    /// Concatenation of every text leaf in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VNode::Text(value) => out.push_str(value),
            VNode::Element(e) => {
                for child in &e.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Number of nodes in this tree, fragments included.
    pub fn node_count(&self) -> usize {
        match self {
            VNode::Text(_) => 1,
            VNode::Element(e) => 1 + e.children.iter().map(VNode::node_count).sum::<usize>(),
        }
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::Text(value.to_string())
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::Text(value)
    }
}

impl From<&String> for VNode {
    fn from(value: &String) -> Self {
        VNode::Text(value.clone())
    }
}

impl From<VElement> for VNode {
    fn from(value: VElement) -> Self {
        VNode::Element(value)
    }
}

// =============================================================================
// VElement
// =============================================================================

/// Element description. Build one with [`h`] or [`el`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VElement {
    pub(crate) tag: String,
    pub(crate) attrs: Attributes,
    pub(crate) children: Vec<VNode>,
    pub(crate) key: Option<String>,
    pub(crate) namespace: Option<Namespace>,
}

impl VElement {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Namespace hint set by the author (`None` means inherit).
    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
