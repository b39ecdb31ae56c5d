//! Mutation log for the in-memory surface.
//!
//! Every write the engine performs on a [`Document`](super::Document) is
//! recorded here, which is how tests prove an update was minimal.

use super::document::NodeId;
use crate::types::Namespace;

bitflags::bitflags! {
    /// Mutation categories, combinable for counting.
    ///
    /// `MutationMask::SET_ATTRIBUTE | MutationMask::REMOVE_ATTRIBUTE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MutationMask: u16 {
        const CREATE_TEXT = 1 << 0;
        const CREATE_ELEMENT = 1 << 1;
        const SET_TEXT = 1 << 2;
        const SET_ATTRIBUTE = 1 << 3;
        const REMOVE_ATTRIBUTE = 1 << 4;
        const INSERT = 1 << 5;
        const REMOVE = 1 << 6;
        const RELEASE = 1 << 7;

        const CREATE = Self::CREATE_TEXT.bits() | Self::CREATE_ELEMENT.bits();
        const ATTRIBUTES = Self::SET_ATTRIBUTE.bits() | Self::REMOVE_ATTRIBUTE.bits();
        const STRUCTURE = Self::INSERT.bits() | Self::REMOVE.bits();
    }
}

/// One recorded surface write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateText { node: NodeId, value: String },
    CreateElement { node: NodeId, tag: String, namespace: Namespace },
    SetText { node: NodeId, value: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    Insert { parent: NodeId, node: NodeId, before: Option<NodeId> },
    Remove { parent: NodeId, node: NodeId },
    Release { node: NodeId },
}

impl Mutation {
    pub fn mask(&self) -> MutationMask {
        match self {
            Mutation::CreateText { .. } => MutationMask::CREATE_TEXT,
            Mutation::CreateElement { .. } => MutationMask::CREATE_ELEMENT,
            Mutation::SetText { .. } => MutationMask::SET_TEXT,
            Mutation::SetAttribute { .. } => MutationMask::SET_ATTRIBUTE,
            Mutation::RemoveAttribute { .. } => MutationMask::REMOVE_ATTRIBUTE,
            Mutation::Insert { .. } => MutationMask::INSERT,
            Mutation::Remove { .. } => MutationMask::REMOVE,
            Mutation::Release { .. } => MutationMask::RELEASE,
        }
    }

    /// Node the mutation applies to.
    pub fn node(&self) -> NodeId {
        match self {
            Mutation::CreateText { node, .. }
            | Mutation::CreateElement { node, .. }
            | Mutation::SetText { node, .. }
            | Mutation::SetAttribute { node, .. }
            | Mutation::RemoveAttribute { node, .. }
            | Mutation::Insert { node, .. }
            | Mutation::Remove { node, .. }
            | Mutation::Release { node } => *node,
        }
    }
}
