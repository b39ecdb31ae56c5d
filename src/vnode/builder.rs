//! Builders for virtual nodes.
//!
//! [`h`] is the compact form used in most code; [`el`] returns an
//! [`ElementBuilder`] for trees that need keys or namespace hints.

use super::{VElement, VNode};
use crate::types::{AttrValue, Attributes, Namespace};

/// Build an element from a type, an attribute map and children.
///
/// Children are anything convertible into a [`VNode`]; raw strings become
/// text leaves. An empty `tag` builds a fragment.
pub fn h<C>(tag: &str, attrs: Attributes, children: impl IntoIterator<Item = C>) -> VNode
where
    C: Into<VNode>,
{
    VNode::Element(VElement {
        tag: tag.to_string(),
        attrs,
        children: children.into_iter().map(Into::into).collect(),
        key: None,
        namespace: None,
    })
}

/// Anonymous wrapper whose children are placed directly in the parent.
pub fn fragment<C>(children: impl IntoIterator<Item = C>) -> VNode
where
    C: Into<VNode>,
{
    h("", Attributes::new(), children)
}

/// Text leaf.
pub fn text(value: impl Into<String>) -> VNode {
    VNode::Text(value.into())
}

/// Start building an element of the given type.
pub fn el(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder {
        element: VElement {
            tag: tag.into(),
            ..VElement::default()
        },
    }
}

// =============================================================================
// ElementBuilder
// =============================================================================

/// Fluent builder for a [`VElement`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ElementBuilder {
    element: VElement,
}

impl ElementBuilder {
    /// Set one attribute, replacing any previous value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.element.attrs.insert(name.into(), value.into());
        self
    }

    /// Set several attributes.
    pub fn attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        self.element
            .attrs
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Reconciliation key, unique among siblings.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.element.key = Some(key.into());
        self
    }

    /// Create this element (and its subtree) in the SVG namespace.
    pub fn svg(mut self) -> Self {
        self.element.namespace = Some(Namespace::Svg);
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.element.children.push(child.into());
        self
    }

    pub fn children<C>(mut self, children: impl IntoIterator<Item = C>) -> Self
    where
        C: Into<VNode>,
    {
        self.element
            .children
            .extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text leaf.
    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(VNode::Text(value.into()))
    }

    pub fn build(self) -> VNode {
        VNode::Element(self.element)
    }
}

impl From<ElementBuilder> for VNode {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Build an [`Attributes`] map.
///
/// ```
/// use spark_dom::attrs;
/// use spark_dom::AttrValue;
///
/// let attrs = attrs! { "id" => "main", "tabindex" => 0, "hidden" => false };
/// assert_eq!(attrs.get("id"), Some(&AttrValue::from("main")));
/// assert_eq!(attrs.len(), 3);
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::types::Attributes::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::Attributes::new();
        $(
            map.insert(::std::string::String::from($name), $crate::types::AttrValue::from($value));
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h_coerces_children() {
        let node = h("p", Attributes::new(), ["a", "b"]);
        let VNode::Element(element) = node else {
            panic!("expected element");
        };
        assert_eq!(element.children, vec![VNode::from("a"), VNode::from("b")]);
    }

    #[test]
    fn test_builder_collects_everything() {
        let node = el("circle")
            .svg()
            .key("c")
            .attr("r", 4)
            .attrs([("cx", "1"), ("cy", "2")])
            .build();
        let VNode::Element(element) = node else {
            panic!("expected element");
        };
        assert_eq!(element.namespace, Some(Namespace::Svg));
        assert_eq!(element.key.as_deref(), Some("c"));
        assert_eq!(element.attrs.len(), 3);
        assert_eq!(element.attrs.get("r"), Some(&AttrValue::Int(4)));
    }

    #[test]
    fn test_attr_replaces_previous_value() {
        let node = el("div").attr("class", "a").attr("class", "b").build();
        let VNode::Element(element) = node else {
            panic!("expected element");
        };
        assert_eq!(element.attrs.get("class"), Some(&AttrValue::from("b")));
    }

    #[test]
    fn test_attrs_macro() {
        let empty = attrs! {};
        assert!(empty.is_empty());

        let map = attrs! { "a" => 1, "b" => true, };
        assert_eq!(map.get("a"), Some(&AttrValue::Int(1)));
        assert_eq!(map.get("b"), Some(&AttrValue::Bool(true)));
    }
}
