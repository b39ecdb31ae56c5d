//! Materialization: virtual node -> fresh live nodes.

use super::materialized::{MaterializedNode, Shape};
use super::{Patcher, children_namespace, element_namespace};
use crate::error::Result;
use crate::surface::Surface;
use crate::types::Namespace;
use crate::vnode::{VElement, VNode};

impl<S: Surface> Patcher<'_, S> {
    /// Build live nodes for `vnode` without attaching its top level.
    ///
    /// Element children are appended under their element. A fragment's
    /// children are left detached for the caller to [`place`](Self::place).
    pub(super) fn build(
        &mut self,
        vnode: &VNode,
        namespace: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        match vnode {
            VNode::Text(value) => {
                let live = self.surface.create_text(value);
                self.stats.created += 1;
                Ok(MaterializedNode::new(Shape::Text(value.clone()), Some(live)))
            }
            VNode::Element(element) if element.is_fragment() => {
                let mut node = MaterializedNode::new(
                    Shape::Fragment {
                        key: element.key.clone(),
                    },
                    None,
                );
                for child in &element.children {
                    node.children.push(self.build(child, namespace)?);
                }
                Ok(node)
            }
            VNode::Element(element) => self.build_element(element, namespace),
        }
    }

    fn build_element(
        &mut self,
        element: &VElement,
        inherited: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        let namespace = element_namespace(element, inherited);
        let live = self.surface.create_element(&element.tag, namespace);
        self.stats.created += 1;

        for (name, value) in &element.attrs {
            if let Some(rendered) = value.to_surface() {
                self.surface.set_attribute(live, name, &rendered)?;
                self.stats.attrs_set += 1;
            }
        }

        let mut node = MaterializedNode::new(
            Shape::Element {
                tag: element.tag.clone(),
                attrs: element.attrs.clone(),
                key: element.key.clone(),
                namespace,
            },
            Some(live),
        );

        let child_namespace = children_namespace(element, namespace);
        for child in &element.children {
            let built = self.build(child, child_namespace)?;
            for top in built.top_level_live() {
                self.surface.append_child(live, top)?;
            }
            node.children.push(built);
        }
        Ok(node)
    }

    /// Insert the top-level live nodes of `node` into `parent` before
    /// `reference` (last when `None`).
    pub(super) fn place(
        &mut self,
        parent: S::Node,
        node: &MaterializedNode<S::Node>,
        reference: Option<S::Node>,
    ) -> Result<()> {
        for live in node.top_level_live() {
            self.surface.insert_before(parent, live, reference)?;
            self.stats.inserted += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::attrs;
    use crate::engine::create;
    use crate::surface::{Document, MutationMask, Surface};
    use crate::vnode::{Context, Source, el, fragment, h};

    #[test]
    fn test_false_attributes_are_never_written() {
        let mut doc = Document::new();
        let body = doc.body();
        let tree = h("input", attrs! { "disabled" => true, "hidden" => false, "size" => 3 }, Vec::<&str>::new());
        create(&mut doc, body, &Source::from(tree), &Context::none()).unwrap();
        assert_eq!(doc.inner_html(body), "<input disabled size=\"3\"></input>");
        assert_eq!(doc.count(MutationMask::SET_ATTRIBUTE), 2);
    }

    #[test]
    fn test_nested_fragments_flatten_into_parent() {
        let mut doc = Document::new();
        let body = doc.body();
        let tree = el("p")
            .child(fragment([fragment(["a"]), fragment(Vec::<&str>::new()), fragment(["b", "c"])]))
            .text("d")
            .build();
        let materialized = create(&mut doc, body, &Source::from(tree), &Context::none()).unwrap();
        assert_eq!(doc.inner_html(body), "<p>abcd</p>");

        let p = materialized.top_level_live()[0];
        assert_eq!(doc.children(p).len(), 4);
    }

    #[test]
    fn test_create_counts_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.clear_mutations();
        let tree = el("ul").child(el("li").text("a")).child(el("li").text("b")).build();
        create(&mut doc, body, &Source::from(tree), &Context::none()).unwrap();
        assert_eq!(doc.count(MutationMask::CREATE), 5);
        assert_eq!(doc.count(MutationMask::INSERT), 5);
    }
}
