//! # spark-dom
//!
//! Virtual node reconciliation engine for Rust.
//!
//! Describe what a surface should show as a tree of immutable virtual nodes,
//! materialize it once, then hand the engine each new tree: it computes and
//! applies the minimal set of mutations to bring the live nodes in line.
//!
//! ## Architecture
//!
//! ```text
//! Source -> VNode tree -> Engine (create / update / remove) -> Surface
//!                              |
//!                         Materialized (virtual <-> live handle pairing)
//! ```
//!
//! The engine never owns live nodes. It drives any [`Surface`] through
//! copyable handles; [`Document`] is the in-memory arena surface shipped with
//! the crate and records every mutation it receives.
//!
//! ## Modules
//!
//! - [`vnode`] - Virtual nodes, builders, sources and validation
//! - [`engine`] - Materializer, reconciler and disposer
//! - [`surface`] - The `Surface` trait, the `Document` arena, selectors
//! - [`mount`] - Registry of trees mounted on containers
//! - [`config`] - Engine limits and switches
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use spark_dom::{Context, Document, Source, create, el, remove, update};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//!
//! let list = |keys: &[&str]| {
//!     el("ul")
//!         .children(keys.iter().map(|k| el("li").key(*k).text(*k)))
//!         .build()
//! };
//!
//! let mut tree = create(&mut doc, body, &Source::from(list(&["a", "b", "c"])), &Context::none()).unwrap();
//! update(&mut doc, body, &mut tree, &Source::from(list(&["c", "b", "a"])), &Context::none(), false).unwrap();
//! assert_eq!(doc.inner_html(body), "<ul><li>c</li><li>b</li><li>a</li></ul>");
//!
//! remove(&mut doc, &mut tree);
//! assert_eq!(doc.inner_html(body), "");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod mount;
pub mod surface;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use config::Config;
pub use error::{Error, Result, SurfaceError};
pub use types::{AttrValue, Attributes, Namespace};

pub use vnode::{Context, ElementBuilder, Source, VElement, VNode, el, fragment, h, text};

pub use surface::{Document, Mutation, MutationMask, NodeId, Surface, Target};

pub use engine::{Engine, Materialized, MaterializedNode, PatchStats, create, remove, update};

pub use mount::{MountEntry, MountId, MountRegistry};
