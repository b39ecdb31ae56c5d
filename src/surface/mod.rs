//! Live presentation surface.
//!
//! The engine never owns live nodes directly. It talks to a [`Surface`]
//! through opaque, copyable handles and only ever touches the subtree it was
//! given. [`Document`] is the in-memory surface shipped with the crate; a
//! browser or native backend implements the same trait.
//!
//! # Contract
//!
//! - `insert_before` moves the child when it is already attached somewhere.
//! - `release` frees a node and every node below it; the handles become
//!   stale afterwards.
//! - Read accessors return `None` / empty for stale handles instead of
//!   failing.

mod document;
mod mutation;
pub mod selector;

pub use document::{Document, NodeFlags, NodeId};
pub use mutation::{Mutation, MutationMask};
pub use selector::{Selector, Target, resolve};

use std::fmt;
use std::hash::Hash;

use crate::error::SurfaceError;
use crate::types::Namespace;

/// Operations the reconciliation engine needs from a live surface.
pub trait Surface {
    /// Handle to one live node.
    type Node: Copy + Eq + Hash + fmt::Debug + fmt::Display;

    /// Top of the surface; everything attached descends from it.
    fn root(&self) -> Self::Node;

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    fn create_text(&mut self, value: &str) -> Self::Node;

    fn create_element(&mut self, tag: &str, namespace: Namespace) -> Self::Node;

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    fn set_text(&mut self, node: Self::Node, value: &str) -> Result<(), SurfaceError>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str) -> Result<(), SurfaceError>;

    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<(), SurfaceError>;

    /// Insert `child` under `parent` before `reference`, or last when
    /// `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        reference: Option<Self::Node>,
    ) -> Result<(), SurfaceError>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), SurfaceError> {
        self.insert_before(parent, child, None)
    }

    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), SurfaceError>;

    /// Free `node` and its whole subtree, detaching it first if needed.
    fn release(&mut self, node: Self::Node);

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Whether the handle still refers to a live node.
    fn contains(&self, node: Self::Node) -> bool;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn last_child(&self, node: Self::Node) -> Option<Self::Node> {
        self.children(node).last().copied()
    }

    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        let siblings = self.children(self.parent(node)?);
        let position = siblings.iter().position(|&c| c == node)?;
        siblings[..position].last().copied()
    }

    /// Element type, `None` for text nodes.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Whether `node` is reachable from [`Surface::root`].
    fn is_attached(&self, node: Self::Node) -> bool {
        if !self.contains(node) {
            return false;
        }
        self.is_inclusive_ancestor(self.root(), node)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}
