//! Reconciliation Engine - Materialize, patch and dispose virtual trees.
//!
//! The engine keeps a live surface in sync with successive virtual trees:
//! - `create`: materialize a tree under a container
//! - `update`: patch the previous materialization to match a new tree
//! - `remove`: detach and release everything a materialization owns
//!
//! # Architecture
//!
//! A [`Materialized`] tree mirrors the virtual tree it was built from. Each
//! node holds a handle into the surface, never a reference:
//!
//! ```text
//! VNode                Materialized          Surface
//! <ul>            ->   Element(ul)   -> n1   <ul>
//!   <li key=a>    ->     Element(li) -> n2     <li>
//!   <>            ->     Fragment    -> -      (children land in <ul>)
//!     "x"         ->       Text      -> n3     "x"
//! ```
//!
//! Updates run top-down. Nodes of the same kind and type are patched in
//! place; anything else is rebuilt at the same position. Child lists are
//! matched by key when every sibling has one, by position otherwise.
//!
//! # Example
//!
//! ```
//! use spark_dom::{Document, Engine, Config, Context, Source, h, attrs};
//! use spark_dom::surface::MutationMask;
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let engine = Engine::new(Config::default());
//!
//! let first = Source::from(h("p", attrs! { "class" => "a" }, ["hello"]));
//! let mut tree = engine.create(&mut doc, body, &first, &Context::none()).unwrap();
//! assert_eq!(doc.inner_html(body), "<p class=\"a\">hello</p>");
//!
//! doc.clear_mutations();
//! let second = Source::from(h("p", attrs! { "class" => "a" }, ["world"]));
//! engine.update(&mut doc, body, &mut tree, &second, &Context::none(), false).unwrap();
//! assert_eq!(doc.inner_html(body), "<p class=\"a\">world</p>");
//! assert_eq!(doc.count(MutationMask::all()), 1);
//!
//! engine.remove(&mut doc, &mut tree);
//! assert_eq!(doc.inner_html(body), "");
//! ```

mod children;
mod dispose;
mod materialize;
mod materialized;
mod patch;

pub use materialized::{Materialized, MaterializedNode, TreeFlags};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::types::Namespace;
use crate::vnode::{Context, Source, VElement};

// =============================================================================
// PatchStats
// =============================================================================

/// What one engine operation did to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Live nodes created.
    pub created: usize,
    /// Nodes rebuilt because their kind or type changed.
    pub replaced: usize,
    pub text_updates: usize,
    pub attrs_set: usize,
    pub attrs_removed: usize,
    /// Existing live nodes moved to a new position.
    pub moved: usize,
    /// Freshly built top-level live nodes inserted.
    pub inserted: usize,
    /// Top-level live nodes detached and released.
    pub disposed: usize,
}

impl PatchStats {
    /// Whether the operation left the surface untouched.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Reconciliation engine carrying a [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Materialize the tree produced by `source` under `container`.
    ///
    /// The container must be attached to the surface. Its own type being
    /// `svg` puts the whole tree in SVG context. Nothing is mutated when the
    /// tree fails validation.
    pub fn create<S: Surface>(
        &self,
        surface: &mut S,
        container: S::Node,
        source: &Source,
        context: &Context,
    ) -> Result<Materialized<S::Node>> {
        check_container(surface, container)?;
        let tree = source.resolve(context);
        tree.validate(self.config.depth_limit())?;

        let in_svg = surface
            .tag_name(container)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("svg"));

        let mut patcher = Patcher::new(surface, &self.config);
        let root = patcher.build(&tree, context_namespace(in_svg))?;
        patcher.place(container, &root, None)?;

        debug!(container = %container, stats = ?patcher.stats, "create");
        Ok(Materialized::new(root, container, in_svg))
    }

    /// Patch `previous` so the surface matches the tree produced by `source`.
    ///
    /// `previous` is updated in place and stays usable for the next call.
    /// Fails without touching anything when `previous` was disposed or
    /// poisoned, when `container` is not the container it was created in, or
    /// when the new tree is malformed. A surface error midway poisons
    /// `previous`.
    pub fn update<S: Surface>(
        &self,
        surface: &mut S,
        container: S::Node,
        previous: &mut Materialized<S::Node>,
        source: &Source,
        context: &Context,
        in_svg: bool,
    ) -> Result<PatchStats> {
        if previous.is_disposed() {
            return Err(Error::DisposedTree);
        }
        if previous.is_poisoned() {
            return Err(Error::PoisonedTree);
        }
        if container != previous.container() {
            return Err(Error::InvalidContainer(format!(
                "{container} is not the container {} the tree was created in",
                previous.container()
            )));
        }
        check_container(surface, container)?;
        let tree = source.resolve(context);
        tree.validate(self.config.depth_limit())?;

        let owned = previous.top_level_live();
        let foreign: Vec<S::Node> = surface
            .children(container)
            .into_iter()
            .filter(|node| !owned.contains(node))
            .collect();
        let mut cursor = leading_cursor(surface, previous);

        let mut patcher = Patcher::new(surface, &self.config);
        let namespace = context_namespace(in_svg);
        let patched = match previous.root.take() {
            Some(old) => patcher.patch(container, &mut cursor, old, &tree, namespace),
            None => patcher.build(&tree, namespace).and_then(|root| {
                let reference = patcher.after(container, cursor);
                patcher.place(container, &root, reference)?;
                Ok(root)
            }),
        };
        let root = match patched {
            Ok(root) => root,
            Err(err) => {
                let stats = patcher.stats;
                previous.orphans = surface
                    .children(container)
                    .into_iter()
                    .filter(|node| !foreign.contains(node))
                    .collect();
                previous.flags.insert(TreeFlags::POISONED);
                warn!(container = %container, ?stats, error = %err, "update failed, tree poisoned");
                return Err(err);
            }
        };

        previous.anchor = match root.first_live() {
            Some(_) => None,
            None => patcher.after(container, cursor),
        };
        previous.root = Some(root);
        previous.flags.set(TreeFlags::IN_SVG, in_svg);

        debug!(container = %container, stats = ?patcher.stats, "update");
        Ok(patcher.stats)
    }

    /// Detach and release every live node `materialized` owns.
    ///
    /// Idempotent: a disposed tree is left alone.
    pub fn remove<S: Surface>(
        &self,
        surface: &mut S,
        materialized: &mut Materialized<S::Node>,
    ) -> PatchStats {
        if materialized.is_disposed() {
            return PatchStats::default();
        }
        let container = materialized.container();
        let mut patcher = Patcher::new(surface, &self.config);
        if let Some(root) = materialized.root.take() {
            patcher.dispose(root);
        }
        for orphan in std::mem::take(&mut materialized.orphans) {
            if patcher.surface.parent(orphan) == Some(container) {
                patcher.surface.release(orphan);
                patcher.stats.disposed += 1;
            }
        }
        materialized.anchor = None;
        materialized.flags.remove(TreeFlags::POISONED);
        materialized.flags.insert(TreeFlags::DISPOSED);

        debug!(container = %container, stats = ?patcher.stats, "remove");
        patcher.stats
    }
}

/// [`Engine::create`] with the default [`Config`].
pub fn create<S: Surface>(
    surface: &mut S,
    container: S::Node,
    source: &Source,
    context: &Context,
) -> Result<Materialized<S::Node>> {
    Engine::default().create(surface, container, source, context)
}

/// [`Engine::update`] with the default [`Config`].
pub fn update<S: Surface>(
    surface: &mut S,
    container: S::Node,
    previous: &mut Materialized<S::Node>,
    source: &Source,
    context: &Context,
    in_svg: bool,
) -> Result<PatchStats> {
    Engine::default().update(surface, container, previous, source, context, in_svg)
}

/// [`Engine::remove`] with the default [`Config`].
pub fn remove<S: Surface>(surface: &mut S, materialized: &mut Materialized<S::Node>) -> PatchStats {
    Engine::default().remove(surface, materialized)
}

fn check_container<S: Surface>(surface: &S, container: S::Node) -> Result<()> {
    if !surface.is_attached(container) {
        return Err(Error::InvalidContainer(format!(
            "{container} is not attached to the surface"
        )));
    }
    if surface.tag_name(container).is_none() {
        return Err(Error::InvalidContainer(format!(
            "{container} is not an element"
        )));
    }
    Ok(())
}

/// Last container child before the tree's content, `None` when the content
/// starts the container.
fn leading_cursor<S: Surface>(surface: &S, tree: &Materialized<S::Node>) -> Option<S::Node> {
    let container = tree.container();
    if let Some(first) = tree.root().and_then(MaterializedNode::first_live) {
        return surface.previous_sibling(first);
    }
    match tree.anchor.filter(|&anchor| surface.parent(anchor) == Some(container)) {
        Some(anchor) => surface.previous_sibling(anchor),
        None => surface.last_child(container),
    }
}

// =============================================================================
// Namespaces
// =============================================================================

fn context_namespace(in_svg: bool) -> Namespace {
    if in_svg { Namespace::Svg } else { Namespace::Html }
}

/// Namespace an element is created in, given the one it inherits.
pub(crate) fn element_namespace(element: &VElement, inherited: Namespace) -> Namespace {
    match element.namespace {
        Some(hint) => hint,
        None if element.tag.eq_ignore_ascii_case("svg") => Namespace::Svg,
        None => inherited,
    }
}

/// Namespace the children of an element inherit.
pub(crate) fn children_namespace(element: &VElement, own: Namespace) -> Namespace {
    if own.is_svg() && element.tag.eq_ignore_ascii_case("foreignObject") {
        Namespace::Html
    } else {
        own
    }
}

// =============================================================================
// Patcher
// =============================================================================

/// Working state of one engine operation.
pub(crate) struct Patcher<'a, S: Surface> {
    surface: &'a mut S,
    config: &'a Config,
    stats: PatchStats,
}

impl<'a, S: Surface> Patcher<'a, S> {
    fn new(surface: &'a mut S, config: &'a Config) -> Self {
        Self {
            surface,
            config,
            stats: PatchStats::default(),
        }
    }

    /// Reference node for inserting right after `cursor` in `parent`.
    fn after(&self, parent: S::Node, cursor: Option<S::Node>) -> Option<S::Node> {
        match cursor {
            Some(node) => self.surface.next_sibling(node),
            None => self.surface.first_child(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Document, MutationMask};
    use crate::vnode::{el, fragment, h, text};
    use crate::attrs;

    fn render(tree: crate::vnode::VNode) -> (Document, Materialized<crate::surface::NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let tree = create(&mut doc, body, &Source::from(tree), &Context::none()).unwrap();
        (doc, tree)
    }

    #[test]
    fn test_create_materializes_in_order() {
        let (doc, tree) = render(h("div", attrs! { "id" => "app" }, [
            text("a"),
            h("span", attrs! {}, ["b"]),
            fragment(["c", "d"]),
        ]));
        assert_eq!(
            doc.inner_html(doc.body()),
            "<div id=\"app\">a<span>b</span>cd</div>"
        );
        assert_eq!(tree.live_count(), 6);
        assert_eq!(tree.top_level_live().len(), 1);
    }

    #[test]
    fn test_create_fragment_root_places_every_child() {
        let (doc, tree) = render(fragment(["#1", "#2", "#3"]));
        assert_eq!(doc.inner_html(doc.body()), "#1#2#3");
        assert_eq!(tree.top_level_live().len(), 3);
        assert!(tree.root().is_some_and(MaterializedNode::is_fragment));
    }

    #[test]
    fn test_create_rejects_detached_container() {
        let mut doc = Document::new();
        let loose = doc.create_element("div", Namespace::Html);
        doc.clear_mutations();
        let err = create(&mut doc, loose, &Source::from(text("x")), &Context::none()).unwrap_err();
        assert!(matches!(err, Error::InvalidContainer(_)));
        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn test_create_rejects_malformed_tree_without_mutation() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.clear_mutations();
        let bad = el("ul").child(el("li").key("a")).child(el("li").key("a")).build();
        let err = create(&mut doc, body, &Source::from(bad), &Context::none()).unwrap_err();
        assert!(matches!(err, Error::MalformedNode(_)));
        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn test_depth_limit_from_config() {
        let mut doc = Document::new();
        let body = doc.body();
        let engine = Engine::new(Config::new().with_depth_limit(2));
        let deep = el("a").child(el("b").child(el("c"))).build();
        assert!(engine.create(&mut doc, body, &Source::from(deep), &Context::none()).is_err());
        let shallow = el("a").child(el("b")).build();
        assert!(engine.create(&mut doc, body, &Source::from(shallow), &Context::none()).is_ok());
    }

    #[test]
    fn test_create_and_update_at_default_depth_limit() {
        let limit = Config::default().depth_limit();
        let chain = |leaf: &str| (1..limit).fold(text(leaf), |inner, _| el("div").child(inner).build());

        let mut doc = Document::new();
        let body = doc.body();
        let mut tree = create(&mut doc, body, &Source::from(chain("a")), &Context::none()).unwrap();
        assert_eq!(tree.live_count(), limit);
        doc.clear_mutations();

        update(&mut doc, body, &mut tree, &Source::from(chain("b")), &Context::none(), false).unwrap();
        assert_eq!(doc.text_content(body), "b");
        assert_eq!(doc.count(MutationMask::all()), 1);

        let too_deep = el("div").child(chain("c")).build();
        let err = update(&mut doc, body, &mut tree, &Source::from(too_deep), &Context::none(), false)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedNode(_)));
        assert!(!tree.is_poisoned());
        assert_eq!(doc.text_content(body), "b");
    }

    #[test]
    fn test_refilled_root_fragment_stays_after_foreign_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        let header = doc.append_element(body, "header", &[]).unwrap();
        let mut tree = create(&mut doc, body, &Source::from(fragment(["a"])), &Context::none()).unwrap();

        update(&mut doc, body, &mut tree, &Source::from(fragment(Vec::<&str>::new())), &Context::none(), false)
            .unwrap();
        assert_eq!(doc.children(body), vec![header]);

        update(&mut doc, body, &mut tree, &Source::from(fragment(["b", "c"])), &Context::none(), false)
            .unwrap();
        assert_eq!(doc.inner_html(body), "<header></header>bc");
        assert_eq!(doc.children(body)[0], header);
    }

    #[test]
    fn test_refilled_root_fragment_stays_before_later_foreign_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        let mut tree = create(&mut doc, body, &Source::from(fragment(["a"])), &Context::none()).unwrap();
        let footer = doc.append_element(body, "footer", &[]).unwrap();

        update(&mut doc, body, &mut tree, &Source::from(fragment(Vec::<&str>::new())), &Context::none(), false)
            .unwrap();
        update(&mut doc, body, &mut tree, &Source::from(fragment(["b"])), &Context::none(), false)
            .unwrap();
        assert_eq!(doc.inner_html(body), "b<footer></footer>");
        assert_eq!(doc.last_child(body), Some(footer));
    }

    #[test]
    fn test_nested_empty_fragment_at_root_start_respects_foreign_nodes() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_element(body, "header", &[]).unwrap();
        let first = fragment([fragment(Vec::<&str>::new()), text("x")]);
        let mut tree = create(&mut doc, body, &Source::from(first), &Context::none()).unwrap();

        let second = fragment([fragment(["w"]), text("x")]);
        update(&mut doc, body, &mut tree, &Source::from(second), &Context::none(), false).unwrap();
        assert_eq!(doc.inner_html(body), "<header></header>wx");
    }

    #[test]
    fn test_failed_update_poisons_tree() {
        let mut doc = Document::new();
        let body = doc.body();
        let header = doc.append_element(body, "header", &[]).unwrap();
        let first = fragment([el("p").text("q"), el("p").text("x")]);
        let mut tree = create(&mut doc, body, &Source::from(first), &Context::none()).unwrap();

        // Pull a node out from under the tree
        let second_p = tree.top_level_live()[1];
        let stale = doc.first_child(second_p).unwrap();
        doc.release(stale);

        let next = Source::from(fragment([el("em"), el("p").text("y")]));
        let err = update(&mut doc, body, &mut tree, &next, &Context::none(), false).unwrap_err();
        assert!(matches!(err, Error::Surface(crate::error::SurfaceError::StaleNode(_))));
        assert!(tree.is_poisoned());
        assert_eq!(doc.inner_html(body), "<header></header><em></em><p></p>");

        doc.clear_mutations();
        let again = update(&mut doc, body, &mut tree, &next, &Context::none(), false).unwrap_err();
        assert_eq!(again, Error::PoisonedTree);
        assert!(doc.mutations().is_empty());

        let stats = remove(&mut doc, &mut tree);
        assert_eq!(stats.disposed, 2);
        assert!(tree.is_disposed());
        assert!(!tree.is_poisoned());
        assert_eq!(doc.children(body), vec![header]);
        assert_eq!(doc.live_count(), 2);
    }

    #[test]
    fn test_svg_namespace_rules() {
        let (doc, tree) = render(
            el("div")
                .child(
                    el("svg")
                        .child(el("g").child(el("foreignObject").child(el("p"))))
                        .build(),
                )
                .build(),
        );
        let root = tree.root().unwrap();
        let svg = &root.children()[0];
        let g = &svg.children()[0];
        let foreign = &g.children()[0];
        let p = &foreign.children()[0];

        assert_eq!(root.namespace(), Some(Namespace::Html));
        assert_eq!(svg.namespace(), Some(Namespace::Svg));
        assert_eq!(g.namespace(), Some(Namespace::Svg));
        assert_eq!(foreign.namespace(), Some(Namespace::Svg));
        assert_eq!(p.namespace(), Some(Namespace::Html));
        assert_eq!(doc.namespace(p.live().unwrap()), Some(Namespace::Html));
        assert_eq!(doc.namespace(g.live().unwrap()), Some(Namespace::Svg));
    }

    #[test]
    fn test_svg_container_puts_tree_in_svg_context() {
        let mut doc = Document::new();
        let body = doc.body();
        let svg = doc.append_element(body, "svg", &[]).unwrap();
        let tree = create(&mut doc, svg, &Source::from(el("circle").build()), &Context::none()).unwrap();
        assert!(tree.in_svg());
        let circle = tree.root().and_then(MaterializedNode::live).unwrap();
        assert_eq!(doc.namespace(circle), Some(Namespace::Svg));
    }

    #[test]
    fn test_update_identical_tree_is_noop() {
        let source = Source::from(h("ul", attrs! { "class" => "list" }, [
            el("li").key("a").text("A"),
            el("li").key("b").text("B"),
        ]));
        let mut doc = Document::new();
        let body = doc.body();
        let mut tree = create(&mut doc, body, &source, &Context::none()).unwrap();
        doc.clear_mutations();

        let stats = update(&mut doc, body, &mut tree, &source, &Context::none(), false).unwrap();
        assert!(stats.is_noop());
        assert_eq!(doc.count(MutationMask::all()), 0);
    }

    #[test]
    fn test_update_disposed_tree_fails() {
        let (mut doc, mut tree) = render(text("x"));
        let body = doc.body();
        remove(&mut doc, &mut tree);
        let err = update(&mut doc, body, &mut tree, &Source::from(text("y")), &Context::none(), false)
            .unwrap_err();
        assert_eq!(err, Error::DisposedTree);
    }

    #[test]
    fn test_update_wrong_container_fails() {
        let (mut doc, mut tree) = render(text("x"));
        let body = doc.body();
        let other = doc.append_element(body, "div", &[]).unwrap();
        doc.clear_mutations();
        let err = update(&mut doc, other, &mut tree, &Source::from(text("y")), &Context::none(), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidContainer(_)));
        assert!(doc.mutations().is_empty());
        assert_eq!(doc.text_content(body), "x");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut doc, mut tree) = render(fragment(["a", "b"]));
        let first = remove(&mut doc, &mut tree);
        assert_eq!(first.disposed, 2);
        assert!(tree.is_disposed());
        assert_eq!(doc.inner_html(doc.body()), "");
        assert_eq!(doc.live_count(), 1);

        let second = remove(&mut doc, &mut tree);
        assert!(second.is_noop());
    }
}
