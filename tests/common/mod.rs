//! Shared helpers for integration tests.

use spark_dom::{Context, Document, Materialized, NodeId, Source, VNode, create};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test output. Set `RUST_LOG=spark_dom=trace` to
/// see every keyed decision.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh document with `tree` materialized under the body and the mutation
/// log cleared.
#[allow(dead_code)]
pub fn rendered(tree: VNode) -> (Document, Materialized<NodeId>) {
    init_tracing();
    let mut doc = Document::new();
    let body = doc.body();
    let materialized = create(&mut doc, body, &Source::from(tree), &Context::none())
        .expect("initial render");
    doc.clear_mutations();
    (doc, materialized)
}
