//! Error types.
//!
//! Every error is synchronous and propagates straight to the caller. The
//! engine validates before it mutates, so an `Err` from `create` or `update`
//! means either nothing was touched or a surface call failed midway. In the
//! latter case `update` poisons the tree: further updates fail with
//! [`Error::PoisonedTree`] and `remove` releases what the tree still owns.

use thiserror::Error;

/// Errors raised by a [`Surface`](crate::surface::Surface) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The handle refers to a node that was released (or never existed).
    #[error("stale node handle {0}")]
    StaleNode(String),
    /// `remove_child` was called with a node that is not a child of `parent`.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },
    /// Inserting the node would make it its own ancestor.
    #[error("cannot insert {child} under {parent}: would create a cycle")]
    HierarchyRequest { parent: String, child: String },
    /// An element-only operation was applied to a text node.
    #[error("node {0} is not an element")]
    NotAnElement(String),
    /// A text-only operation was applied to an element.
    #[error("node {0} is not a text node")]
    NotAText(String),
}

/// Errors raised by the reconciliation engine and the mount registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The virtual tree has the wrong shape.
    #[error("malformed virtual node: {0}")]
    MalformedNode(String),

    /// A selector matched more than one node where exactly one is required.
    #[error("The selector must identify an unique DOM element (`{selector}` matched {count})")]
    AmbiguousTarget { selector: String, count: usize },

    /// A selector or handle matched nothing.
    #[error("no element matches `{0}`")]
    TargetNotFound(String),

    /// The selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The container is missing, detached, or not the one the tree lives in.
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// `update` was called with a tree that went through `remove`.
    #[error("materialized tree was disposed and cannot be updated")]
    DisposedTree,

    /// `update` was called with a tree left behind by a failed update.
    #[error("materialized tree was left inconsistent by a failed update; remove it and create a new one")]
    PoisonedTree,

    /// The container lies inside (or contains) another mount's container.
    #[error("container overlaps mount `{0}`")]
    OverlappingMount(String),

    /// Low level surface failure.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
