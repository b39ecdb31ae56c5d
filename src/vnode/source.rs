//! Render sources and mount context.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::VNode;

// =============================================================================
// Context
// =============================================================================

/// Opaque value threaded through `create`/`update`.
///
/// The engine never looks inside. It is handed to [`Source::Contextual`]
/// factories, which is how a mount keeps component-local state.
#[derive(Clone, Default)]
pub struct Context(Option<Rc<dyn Any>>);

impl Context {
    /// Empty context.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    /// Borrow the value if it has type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Context(..)"),
            None => f.write_str("Context(None)"),
        }
    }
}

// =============================================================================
// Source
// =============================================================================

/// Where a render pass gets its tree from.
#[derive(Clone)]
pub enum Source {
    /// A fixed tree, cloned on every pass.
    Static(Rc<VNode>),
    /// Zero-argument factory invoked on every pass.
    Factory(Rc<dyn Fn() -> VNode>),
    /// Factory that receives the mount context.
    Contextual(Rc<dyn Fn(&Context) -> VNode>),
}

impl Source {
    pub fn factory(f: impl Fn() -> VNode + 'static) -> Self {
        Source::Factory(Rc::new(f))
    }

    pub fn contextual(f: impl Fn(&Context) -> VNode + 'static) -> Self {
        Source::Contextual(Rc::new(f))
    }

    /// Produce the tree for one render pass.
    pub fn resolve(&self, context: &Context) -> VNode {
        match self {
            Source::Static(tree) => VNode::clone(tree),
            Source::Factory(f) => f(),
            Source::Contextual(f) => f(context),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Source::Static(_))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Static(tree) => f.debug_tuple("Static").field(tree).finish(),
            Source::Factory(_) => f.write_str("Factory(..)"),
            Source::Contextual(_) => f.write_str("Contextual(..)"),
        }
    }
}

impl From<VNode> for Source {
    fn from(tree: VNode) -> Self {
        Source::Static(Rc::new(tree))
    }
}

impl From<Rc<VNode>> for Source {
    fn from(tree: Rc<VNode>) -> Self {
        Source::Static(tree)
    }
}

impl From<super::ElementBuilder> for Source {
    fn from(builder: super::ElementBuilder) -> Self {
        Source::from(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_static_source_clones_tree() {
        let source = Source::from(VNode::from("x"));
        assert!(source.is_static());
        assert_eq!(source.resolve(&Context::none()), VNode::from("x"));
        assert_eq!(source.resolve(&Context::none()), VNode::from("x"));
    }

    #[test]
    fn test_factory_invoked_each_pass() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        let source = Source::factory(move || {
            calls_clone.set(calls_clone.get() + 1);
            VNode::from(format!("{}", calls_clone.get()))
        });

        assert_eq!(source.resolve(&Context::none()), VNode::from("1"));
        assert_eq!(source.resolve(&Context::none()), VNode::from("2"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_contextual_factory_reads_context() {
        let source = Source::contextual(|ctx| {
            let label = ctx.get::<&'static str>().copied().unwrap_or("none");
            VNode::from(label)
        });
        assert_eq!(source.resolve(&Context::new("custom")), VNode::from("custom"));
        assert_eq!(source.resolve(&Context::none()), VNode::from("none"));
    }

    #[test]
    fn test_context_downcast_mismatch() {
        let ctx = Context::new(5_u32);
        assert!(!ctx.is_empty());
        assert_eq!(ctx.get::<u32>(), Some(&5));
        assert_eq!(ctx.get::<String>(), None);
        assert!(Context::default().is_empty());
    }
}
