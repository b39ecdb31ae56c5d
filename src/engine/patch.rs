//! Node patching: reuse, patch in place, or replace.

use tracing::trace;

use super::materialized::{MaterializedNode, Shape};
use super::{Patcher, children_namespace, element_namespace};
use crate::error::Result;
use crate::surface::Surface;
use crate::types::{Attributes, Namespace};
use crate::vnode::{VElement, VNode};

/// What to do with one old/new pair.
enum Plan<N> {
    Text(N),
    Element(N),
    Fragment,
    Replace,
}

impl<S: Surface> Patcher<'_, S> {
    /// Bring `old` in line with `new` and return the patched node.
    ///
    /// `cursor` is the last live node placed before this one in `parent`
    /// (`None` at the start of the parent) and is advanced past whatever
    /// this node ends up contributing.
    pub(super) fn patch(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        old: MaterializedNode<S::Node>,
        new: &VNode,
        namespace: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        let plan = match (&old.shape, new, old.live) {
            (Shape::Text(_), VNode::Text(_), Some(live)) => Plan::Text(live),
            (Shape::Fragment { .. }, VNode::Element(element), _) if element.is_fragment() => {
                Plan::Fragment
            }
            (Shape::Element { tag, namespace: current, .. }, VNode::Element(element), Some(live))
                if !element.is_fragment()
                    && *tag == element.tag
                    && *current == element_namespace(element, namespace) =>
            {
                Plan::Element(live)
            }
            _ => Plan::Replace,
        };

        match (plan, new) {
            (Plan::Text(live), VNode::Text(value)) => {
                let mut old = old;
                if let Shape::Text(current) = &mut old.shape {
                    if current != value {
                        self.surface.set_text(live, value)?;
                        self.stats.text_updates += 1;
                        *current = value.clone();
                    }
                }
                *cursor = Some(live);
                Ok(old)
            }
            (Plan::Element(live), VNode::Element(element)) => {
                let node = self.patch_element(live, old, element, namespace)?;
                *cursor = Some(live);
                Ok(node)
            }
            (Plan::Fragment, VNode::Element(element)) => {
                let mut old = old;
                let previous = std::mem::take(&mut old.children);
                old.children = self.reconcile_children(parent, cursor, previous, &element.children, namespace)?;
                old.shape = Shape::Fragment {
                    key: element.key.clone(),
                };
                Ok(old)
            }
            _ => self.replace(parent, cursor, old, new, namespace),
        }
    }

    fn patch_element(
        &mut self,
        live: S::Node,
        mut old: MaterializedNode<S::Node>,
        element: &VElement,
        inherited: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        if let Shape::Element { attrs, key, .. } = &mut old.shape {
            self.patch_attributes(live, attrs, &element.attrs)?;
            *attrs = element.attrs.clone();
            key.clone_from(&element.key);
        }

        let namespace = element_namespace(element, inherited);
        let child_namespace = children_namespace(element, namespace);
        let previous = std::mem::take(&mut old.children);
        let mut child_cursor = None;
        old.children =
            self.reconcile_children(live, &mut child_cursor, previous, &element.children, child_namespace)?;
        Ok(old)
    }

    /// Remove attributes that are gone, set the ones that are new or
    /// changed. Values are compared as rendered on the surface.
    fn patch_attributes(&mut self, live: S::Node, old: &Attributes, new: &Attributes) -> Result<()> {
        for (name, value) in old {
            let was_rendered = value.is_present();
            let still_rendered = new.get(name).is_some_and(|v| v.is_present());
            if was_rendered && !still_rendered {
                self.surface.remove_attribute(live, name)?;
                self.stats.attrs_removed += 1;
            }
        }
        for (name, value) in new {
            let Some(rendered) = value.to_surface() else {
                continue;
            };
            let current = old.get(name).and_then(|v| v.to_surface());
            if current.as_deref() != Some(rendered.as_str()) {
                self.surface.set_attribute(live, name, &rendered)?;
                self.stats.attrs_set += 1;
            }
        }
        Ok(())
    }

    /// Build `new` at the position of `old`, then dispose `old`.
    fn replace(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        old: MaterializedNode<S::Node>,
        new: &VNode,
        namespace: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        trace!(old = ?old.tag(), new = ?new.tag(), "replace");
        let built = self.build(new, namespace)?;
        let reference = match old.first_live() {
            Some(first) => Some(first),
            None => self.after(parent, *cursor),
        };
        self.place(parent, &built, reference)?;
        self.dispose(old);
        self.stats.replaced += 1;
        if let Some(last) = built.last_live() {
            *cursor = Some(last);
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use crate::attrs;
    use crate::engine::{create, update};
    use crate::surface::{Document, MutationMask, Surface};
    use crate::types::Namespace;
    use crate::vnode::{Context, Source, VNode, el, fragment, h, text};

    fn setup(tree: VNode) -> (Document, crate::engine::Materialized<crate::surface::NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let materialized = create(&mut doc, body, &Source::from(tree), &Context::none()).unwrap();
        doc.clear_mutations();
        (doc, materialized)
    }

    fn apply(doc: &mut Document, tree: &mut crate::engine::Materialized<crate::surface::NodeId>, next: VNode) {
        let body = doc.body();
        update(doc, body, tree, &Source::from(next), &Context::none(), false).unwrap();
    }

    #[test]
    fn test_text_patch_keeps_identity() {
        let (mut doc, mut tree) = setup(el("p").text("old").build());
        let p = tree.top_level_live()[0];
        let t = doc.first_child(p).unwrap();

        apply(&mut doc, &mut tree, el("p").text("new").build());
        assert_eq!(doc.text(t), Some("new"));
        assert_eq!(doc.first_child(p), Some(t));
        assert_eq!(doc.count(MutationMask::all()), 1);
        assert_eq!(doc.count(MutationMask::SET_TEXT), 1);
    }

    #[test]
    fn test_attribute_patch_is_minimal() {
        let (mut doc, mut tree) = setup(h(
            "div",
            attrs! { "id" => "x", "class" => "a", "title" => "t", "hidden" => true },
            Vec::<&str>::new(),
        ));
        let div = tree.top_level_live()[0];

        apply(
            &mut doc,
            &mut tree,
            h("div", attrs! { "id" => "x", "class" => "b", "hidden" => false, "lang" => "en" }, Vec::<&str>::new()),
        );
        assert_eq!(doc.attribute(div, "id"), Some("x"));
        assert_eq!(doc.attribute(div, "class"), Some("b"));
        assert_eq!(doc.attribute(div, "title"), None);
        assert_eq!(doc.attribute(div, "hidden"), None);
        assert_eq!(doc.attribute(div, "lang"), Some("en"));
        assert_eq!(doc.count(MutationMask::SET_ATTRIBUTE), 2);
        assert_eq!(doc.count(MutationMask::REMOVE_ATTRIBUTE), 2);
        assert_eq!(doc.count(MutationMask::STRUCTURE | MutationMask::CREATE), 0);
    }

    #[test]
    fn test_equal_rendered_values_are_not_rewritten() {
        let (mut doc, mut tree) = setup(h("td", attrs! { "colspan" => "2" }, Vec::<&str>::new()));
        apply(&mut doc, &mut tree, h("td", attrs! { "colspan" => 2 }, Vec::<&str>::new()));
        assert_eq!(doc.count(MutationMask::all()), 0);
    }

    #[test]
    fn test_type_change_replaces_in_position() {
        let (mut doc, mut tree) = setup(
            el("div")
                .text("before")
                .child(el("span").attr("data-sentinel", "old"))
                .text("after")
                .build(),
        );
        let div = tree.top_level_live()[0];

        apply(
            &mut doc,
            &mut tree,
            el("div").text("before").child(el("em")).text("after").build(),
        );
        assert_eq!(doc.inner_html(div), "before<em></em>after");
        assert!(!doc.inner_html(div).contains("data-sentinel"));
        assert_eq!(doc.count(MutationMask::RELEASE), 1);
    }

    #[test]
    fn test_kind_change_replaces() {
        let (mut doc, mut tree) = setup(el("p").child(el("b").text("x")).build());
        let p = tree.top_level_live()[0];
        apply(&mut doc, &mut tree, el("p").text("x").build());
        assert_eq!(doc.inner_html(p), "x");

        apply(&mut doc, &mut tree, el("p").child(fragment(["y", "z"])).build());
        assert_eq!(doc.inner_html(p), "yz");
    }

    #[test]
    fn test_root_replacement() {
        let (mut doc, mut tree) = setup(el("section").text("a").build());
        apply(&mut doc, &mut tree, text("plain"));
        assert_eq!(doc.inner_html(doc.body()), "plain");
        apply(&mut doc, &mut tree, fragment(["1", "2"]));
        assert_eq!(doc.inner_html(doc.body()), "12");
        assert_eq!(tree.top_level_live().len(), 2);
    }

    #[test]
    fn test_empty_fragment_replacement_uses_cursor() {
        let (mut doc, mut tree) = setup(
            el("p")
                .text("a")
                .child(fragment(Vec::<&str>::new()))
                .text("c")
                .build(),
        );
        let p = tree.top_level_live()[0];
        apply(&mut doc, &mut tree, el("p").text("a").child(el("b")).text("c").build());
        assert_eq!(doc.inner_html(p), "a<b></b>c");
    }

    #[test]
    fn test_namespace_change_replaces() {
        let (mut doc, mut tree) = setup(el("a").build());
        let before = tree.top_level_live()[0];
        apply(&mut doc, &mut tree, el("a").svg().build());
        let after = tree.top_level_live()[0];
        assert_ne!(before, after);
        assert_eq!(doc.namespace(after), Some(Namespace::Svg));
    }
}
