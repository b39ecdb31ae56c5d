//! Materialized trees - the record of what the engine put on the surface.
//!
//! Every materialized node pairs a snapshot of the virtual node it was built
//! from with the handle of the live node it owns. Fragments own no live node;
//! their children's live nodes sit directly in the enclosing parent.

use crate::types::{Attributes, Namespace};

bitflags::bitflags! {
    /// State flags of a [`Materialized`] tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TreeFlags: u8 {
        /// Went through `remove`; cannot be updated any more.
        const DISPOSED = 1 << 0;
        /// Built in SVG context (the container is an `svg` element).
        const IN_SVG = 1 << 1;
        /// An `update` failed midway; only `remove` is accepted.
        const POISONED = 1 << 2;
    }
}

/// Snapshot of the virtual node a materialized node was built from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Text(String),
    Element {
        tag: String,
        attrs: Attributes,
        key: Option<String>,
        namespace: Namespace,
    },
    Fragment {
        key: Option<String>,
    },
}

// =============================================================================
// MaterializedNode
// =============================================================================

/// One virtual node paired with its live counterpart.
#[derive(Debug, Clone)]
pub struct MaterializedNode<N> {
    pub(crate) shape: Shape,
    pub(crate) live: Option<N>,
    pub(crate) children: Vec<MaterializedNode<N>>,
}

impl<N: Copy> MaterializedNode<N> {
    pub(crate) fn new(shape: Shape, live: Option<N>) -> Self {
        Self {
            shape,
            live,
            children: Vec::new(),
        }
    }

    /// Live node owned by this node. `None` for fragments.
    pub fn live(&self) -> Option<N> {
        self.live
    }

    pub fn children(&self) -> &[MaterializedNode<N>] {
        &self.children
    }

    pub fn key(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text(_) => None,
            Shape::Element { key, .. } | Shape::Fragment { key } => key.as_deref(),
        }
    }

    /// Element type; empty for fragments, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text(_) => None,
            Shape::Element { tag, .. } => Some(tag),
            Shape::Fragment { .. } => Some(""),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attributes> {
        match &self.shape {
            Shape::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match &self.shape {
            Shape::Element { namespace, .. } => Some(*namespace),
            _ => None,
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.shape, Shape::Text(_))
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        matches!(self.shape, Shape::Fragment { .. })
    }

    pub fn child_by_key(&self, key: &str) -> Option<&MaterializedNode<N>> {
        self.children.iter().find(|child| child.key() == Some(key))
    }

    /// First live node this subtree contributes to its parent.
    pub(crate) fn first_live(&self) -> Option<N> {
        self.live
            .or_else(|| self.children.iter().find_map(MaterializedNode::first_live))
    }

    /// Last live node this subtree contributes to its parent.
    pub(crate) fn last_live(&self) -> Option<N> {
        self.live
            .or_else(|| self.children.iter().rev().find_map(MaterializedNode::last_live))
    }

    /// Live nodes this subtree places directly in its parent, in order.
    pub fn top_level_live(&self) -> Vec<N> {
        let mut out = Vec::new();
        self.collect_top_level(&mut out);
        out
    }

    fn collect_top_level(&self, out: &mut Vec<N>) {
        match self.live {
            Some(live) => out.push(live),
            None => {
                for child in &self.children {
                    child.collect_top_level(out);
                }
            }
        }
    }

    /// Every live node in this subtree.
    pub fn live_count(&self) -> usize {
        usize::from(self.live.is_some())
            + self
                .children
                .iter()
                .map(MaterializedNode::live_count)
                .sum::<usize>()
    }
}

// =============================================================================
// Materialized
// =============================================================================

/// A tree materialized under a container.
///
/// Returned by `create`, patched in place by `update` and emptied by
/// `remove`. A disposed tree keeps its container but no longer owns any
/// live node.
///
/// When an `update` fails partway through, the tree is poisoned: it forgets
/// its virtual snapshot but remembers which container children it still
/// owns, so `remove` can release them.
#[derive(Debug, Clone)]
pub struct Materialized<N> {
    pub(crate) root: Option<MaterializedNode<N>>,
    pub(crate) container: N,
    pub(crate) flags: TreeFlags,
    /// Container child right after the content while the root places no
    /// live node. `None` means the end of the container.
    pub(crate) anchor: Option<N>,
    /// Container children owned by a poisoned tree.
    pub(crate) orphans: Vec<N>,
}

impl<N: Copy> Materialized<N> {
    pub(crate) fn new(root: MaterializedNode<N>, container: N, in_svg: bool) -> Self {
        let mut flags = TreeFlags::empty();
        flags.set(TreeFlags::IN_SVG, in_svg);
        Self {
            root: Some(root),
            container,
            flags,
            anchor: None,
            orphans: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<&MaterializedNode<N>> {
        self.root.as_ref()
    }

    pub fn container(&self) -> N {
        self.container
    }

    pub fn flags(&self) -> TreeFlags {
        self.flags
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.flags.contains(TreeFlags::DISPOSED)
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.flags.contains(TreeFlags::POISONED)
    }

    #[inline]
    pub fn in_svg(&self) -> bool {
        self.flags.contains(TreeFlags::IN_SVG)
    }

    /// Live nodes attached directly under the container.
    pub fn top_level_live(&self) -> Vec<N> {
        self.root
            .as_ref()
            .map(MaterializedNode::top_level_live)
            .unwrap_or_default()
    }

    pub fn live_count(&self) -> usize {
        self.root.as_ref().map_or(0, MaterializedNode::live_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str, live: u32) -> MaterializedNode<u32> {
        MaterializedNode::new(Shape::Text(value.to_string()), Some(live))
    }

    fn fragment(children: Vec<MaterializedNode<u32>>) -> MaterializedNode<u32> {
        MaterializedNode {
            shape: Shape::Fragment { key: None },
            live: None,
            children,
        }
    }

    #[test]
    fn test_fragment_live_range() {
        let node = fragment(vec![
            fragment(vec![]),
            text("a", 1),
            fragment(vec![text("b", 2), text("c", 3)]),
            fragment(vec![]),
        ]);
        assert_eq!(node.first_live(), Some(1));
        assert_eq!(node.last_live(), Some(3));
        assert_eq!(node.top_level_live(), vec![1, 2, 3]);
        assert_eq!(node.live_count(), 3);
        assert_eq!(node.tag(), Some(""));
        assert!(node.is_fragment());
    }

    #[test]
    fn test_empty_fragment_has_no_range() {
        let node = fragment(vec![fragment(vec![])]);
        assert_eq!(node.first_live(), None);
        assert_eq!(node.last_live(), None);
        assert!(node.top_level_live().is_empty());
    }

    #[test]
    fn test_element_accessors() {
        let mut attrs = Attributes::new();
        attrs.insert("id".into(), "x".into());
        let mut node = MaterializedNode::new(
            Shape::Element {
                tag: "ul".into(),
                attrs,
                key: Some("list".into()),
                namespace: Namespace::Html,
            },
            Some(7),
        );
        node.children.push(MaterializedNode::new(
            Shape::Fragment { key: Some("f".into()) },
            None,
        ));

        assert_eq!(node.tag(), Some("ul"));
        assert_eq!(node.key(), Some("list"));
        assert_eq!(node.namespace(), Some(Namespace::Html));
        assert_eq!(node.attrs().map(|a| a.len()), Some(1));
        assert!(node.child_by_key("f").is_some());
        assert!(node.child_by_key("g").is_none());
        assert_eq!(node.top_level_live(), vec![7]);
    }

    #[test]
    fn test_tree_flags() {
        let tree = Materialized::new(text("a", 1), 0u32, true);
        assert!(tree.in_svg());
        assert!(!tree.is_disposed());
        assert_eq!(tree.container(), 0);
        assert_eq!(tree.top_level_live(), vec![1]);
    }
}
