//! Mount API - Attach trees to containers and re-render them on demand.
//!
//! A [`MountRegistry`] owns every tree mounted on a surface. Mounting
//! resolves a target (selector or node handle) to a container, materializes
//! the source under it and hands back a [`MountId`]. Later calls re-render a
//! mount from its source, or tear it down.
//!
//! The registry is a plain value owned by the caller; there is no global
//! state.
//!
//! # Example
//!
//! ```
//! use spark_dom::{Context, Document, MountRegistry, Source, el, fragment};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let app = doc.append_element(body, "div", &[("id", "app")]).unwrap();
//!
//! let mut registry = MountRegistry::new();
//! let id = registry
//!     .mount(&mut doc, "#app", Source::factory(|| fragment(["#1", "#2", "#3"])), Context::none())
//!     .unwrap();
//! assert_eq!(id.to_string(), "1");
//! assert_eq!(doc.inner_html(app), "#1#2#3");
//!
//! // Same container: the first mount is replaced
//! registry.mount(&mut doc, app, el("p").text("hello"), Context::none()).unwrap();
//! assert_eq!(registry.len(), 1);
//! assert_eq!(doc.inner_html(app), "<p>hello</p>");
//!
//! registry.unmount(&mut doc, "#app").unwrap();
//! assert_eq!(doc.inner_html(app), "");
//! ```

mod registry;

pub use registry::{MountEntry, MountId, MountRegistry};
