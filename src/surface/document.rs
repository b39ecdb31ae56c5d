//! In-memory surface.
//!
//! Nodes live in a [`SlotMap`]. A [`NodeId`] is a slot key carrying a
//! version: removing a node bumps the version of its slot, so old handles
//! turn stale instead of silently pointing at somebody else's node.
//!
//! The document root is a `body` element. Every write is appended to a
//! [`Mutation`] log that tests read back.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use slotmap::{Key, SlotMap};

use super::Surface;
use super::mutation::{Mutation, MutationMask};
use crate::error::SurfaceError;
use crate::types::Namespace;

// =============================================================================
// Handles and Flags
// =============================================================================

slotmap::new_key_type! {
    /// Handle to a node of a [`Document`].
    pub struct NodeId;
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{:?}", self.data())
    }
}

bitflags::bitflags! {
    /// Node kind and namespace bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const ELEMENT = 1 << 0;
        const TEXT = 1 << 1;
        const SVG = 1 << 2;
        const ROOT = 1 << 3;
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug)]
struct NodeData {
    flags: NodeFlags,
    tag: String,
    text: String,
    attrs: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn element(tag: &str, namespace: Namespace) -> Self {
        let mut flags = NodeFlags::ELEMENT;
        if namespace.is_svg() {
            flags |= NodeFlags::SVG;
        }
        Self {
            flags,
            tag: tag.to_string(),
            text: String::new(),
            attrs: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn text(value: &str) -> Self {
        Self {
            flags: NodeFlags::TEXT,
            tag: String::new(),
            text: value.to_string(),
            attrs: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-backed document implementing [`Surface`].
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    log: Vec<Mutation>,
    recording: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its `body` root.
    pub fn new() -> Self {
        let mut root = NodeData::element("body", Namespace::Html);
        root.flags |= NodeFlags::ROOT;
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            nodes,
            root,
            log: Vec::new(),
            recording: true,
        }
    }

    /// The root element.
    pub fn body(&self) -> NodeId {
        self.root
    }

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, SurfaceError> {
        self.get(id).ok_or_else(|| SurfaceError::StaleNode(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, SurfaceError> {
        self.get_mut(id)
            .ok_or_else(|| SurfaceError::StaleNode(id.to_string()))
    }

    fn record(&mut self, mutation: Mutation) {
        if self.recording {
            self.log.push(mutation);
        }
    }

    /// Remove `child` from its parent's child list. No-op when detached.
    fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.get_mut(child)?.parent.take()?;
        if let Some(parent_data) = self.get_mut(parent) {
            parent_data.children.retain(|&c| c != child);
        }
        Some(parent)
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(id) {
                stack.extend(data.children);
            }
        }
    }

    // =========================================================================
    // Convenience
    // =========================================================================

    /// Create an element with attributes and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId, SurfaceError> {
        let namespace = if tag.eq_ignore_ascii_case("svg") {
            Namespace::Svg
        } else {
            Namespace::Html
        };
        let node = self.create_element(tag, namespace);
        for (name, value) in attrs {
            self.set_attribute(node, name, value)?;
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Value of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.get(node)
            .filter(|data| data.flags.contains(NodeFlags::TEXT))
            .map(|data| data.text.as_str())
    }

    /// Namespace of an element.
    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        let data = self.get(node)?;
        if !data.flags.contains(NodeFlags::ELEMENT) {
            return None;
        }
        Some(if data.flags.contains(NodeFlags::SVG) {
            Namespace::Svg
        } else {
            Namespace::Html
        })
    }

    pub fn flags(&self, node: NodeId) -> NodeFlags {
        self.get(node).map(|data| data.flags).unwrap_or_default()
    }

    /// All attributes of an element, in name order.
    pub fn attributes(&self, node: NodeId) -> Vec<(&str, &str)> {
        self.get(node)
            .map(|data| {
                data.attrs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else { return };
        if data.flags.contains(NodeFlags::TEXT) {
            out.push_str(&data.text);
        }
        for &child in &data.children {
            self.collect_text(child, out);
        }
    }

    /// Serialized children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(data) = self.get(node) {
            for &child in &data.children {
                self.write_html(child, &mut out);
            }
        }
        out
    }

    /// Serialized `node` including itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else { return };
        if data.flags.contains(NodeFlags::TEXT) {
            escape_into(&data.text, false, out);
            return;
        }
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attrs {
            if value.is_empty() {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(out, " {name}=\"");
                escape_into(value, true, out);
                out.push('"');
            }
        }
        out.push('>');
        for &child in &data.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }

    /// Number of live nodes, root included.
    pub fn live_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes strictly below `node`.
    pub fn descendant_count(&self, node: NodeId) -> usize {
        self.get(node)
            .map(|data| {
                data.children
                    .iter()
                    .map(|&child| 1 + self.descendant_count(child))
                    .sum()
            })
            .unwrap_or(0)
    }

    // =========================================================================
    // Mutation Log
    // =========================================================================

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Drain the log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    /// Count logged mutations matching any bit of `mask`.
    pub fn count(&self, mask: MutationMask) -> usize {
        self.log.iter().filter(|m| mask.intersects(m.mask())).count()
    }

    /// Turn recording on or off. On by default.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }
}

fn escape_into(value: &str, in_attribute: bool, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

// =============================================================================
// Surface
// =============================================================================

impl Surface for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn create_text(&mut self, value: &str) -> NodeId {
        let node = self.nodes.insert(NodeData::text(value));
        self.record(Mutation::CreateText {
            node,
            value: value.to_string(),
        });
        node
    }

    fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        let node = self.nodes.insert(NodeData::element(tag, namespace));
        self.record(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
            namespace,
        });
        node
    }

    fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), SurfaceError> {
        let data = self.node_mut(node)?;
        if !data.flags.contains(NodeFlags::TEXT) {
            return Err(SurfaceError::NotAText(node.to_string()));
        }
        data.text.clear();
        data.text.push_str(value);
        self.record(Mutation::SetText {
            node,
            value: value.to_string(),
        });
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), SurfaceError> {
        let data = self.node_mut(node)?;
        if !data.flags.contains(NodeFlags::ELEMENT) {
            return Err(SurfaceError::NotAnElement(node.to_string()));
        }
        data.attrs.insert(name.to_string(), value.to_string());
        self.record(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), SurfaceError> {
        let data = self.node_mut(node)?;
        if !data.flags.contains(NodeFlags::ELEMENT) {
            return Err(SurfaceError::NotAnElement(node.to_string()));
        }
        if data.attrs.remove(name).is_some() {
            self.record(Mutation::RemoveAttribute {
                node,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), SurfaceError> {
        if !self.node(parent)?.flags.contains(NodeFlags::ELEMENT) {
            return Err(SurfaceError::NotAnElement(parent.to_string()));
        }
        self.node(child)?;
        if child == self.root || self.is_inclusive_ancestor(child, parent) {
            return Err(SurfaceError::HierarchyRequest {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(SurfaceError::NotAChild {
                    parent: parent.to_string(),
                    child: reference.to_string(),
                });
            }
        }

        self.unlink(child);

        let parent_data = self.node_mut(parent)?;
        let position = reference
            .and_then(|r| parent_data.children.iter().position(|&c| c == r))
            .unwrap_or(parent_data.children.len());
        parent_data.children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);

        self.record(Mutation::Insert {
            parent,
            node: child,
            before: reference,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(SurfaceError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.unlink(child);
        self.record(Mutation::Remove { parent, node: child });
        Ok(())
    }

    fn release(&mut self, node: NodeId) {
        if node == self.root || self.get(node).is_none() {
            return;
        }
        if let Some(parent) = self.unlink(node) {
            self.record(Mutation::Remove { parent, node });
        }
        self.free_subtree(node);
        self.record(Mutation::Release { node });
    }

    fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.children.first().copied()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.get(node)?.parent?;
        let siblings = &self.get(parent)?.children;
        let position = siblings.iter().position(|&c| c == node)?;
        siblings.get(position + 1).copied()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.get(node)
            .filter(|data| data.flags.contains(NodeFlags::ELEMENT))
            .map(|data| data.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)?.attrs.get(name).map(String::as_str)
    }
}

// =============================================================================
// Tests
// =============================================================================
