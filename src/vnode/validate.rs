//! Shape checks run before a tree touches the surface.

use std::collections::HashSet;

use super::{VElement, VNode};
use crate::error::{Error, Result};

impl VNode {
    /// Check that this tree can be materialized.
    ///
    /// Rejects invalid element or attribute names, fragments carrying
    /// attributes, duplicate keys among siblings and trees deeper than
    /// `depth_limit`. `create` and `update` call this before their first
    /// surface mutation.
    pub fn validate(&self, depth_limit: usize) -> Result<()> {
        validate_node(self, 1, depth_limit)
    }
}

fn validate_node(node: &VNode, depth: usize, depth_limit: usize) -> Result<()> {
    if depth > depth_limit {
        return Err(Error::MalformedNode(format!(
            "tree exceeds the depth limit of {depth_limit}"
        )));
    }
    match node {
        VNode::Text(_) => Ok(()),
        VNode::Element(element) => {
            validate_element(element)?;
            for child in &element.children {
                validate_node(child, depth + 1, depth_limit)?;
            }
            Ok(())
        }
    }
}

fn validate_element(element: &VElement) -> Result<()> {
    if element.is_fragment() {
        if !element.attrs.is_empty() {
            return Err(Error::MalformedNode(
                "a fragment cannot carry attributes".to_string(),
            ));
        }
    } else if !is_valid_tag(&element.tag) {
        return Err(Error::MalformedNode(format!(
            "`{}` is not a valid element type",
            element.tag
        )));
    }

    if let Some(name) = element.attrs.keys().find(|name| !is_valid_attr_name(name)) {
        return Err(Error::MalformedNode(format!(
            "`{name}` is not a valid attribute name on <{}>",
            element.tag
        )));
    }

    let mut seen = HashSet::new();
    for key in element.children.iter().filter_map(VNode::key) {
        if !seen.insert(key) {
            return Err(Error::MalformedNode(format!(
                "duplicate key `{key}` among children of <{}>",
                element.tag
            )));
        }
    }
    Ok(())
}

/// Element type names: an ASCII letter followed by letters, digits, `-`,
/// `_`, `.` or `:`.
pub(crate) fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        }
        _ => false,
    }
}

pub(crate) fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}
