//! Disposal: detach and release a materialized subtree.

use tracing::trace;

use super::Patcher;
use super::materialized::MaterializedNode;
use crate::surface::Surface;

impl<S: Surface> Patcher<'_, S> {
    /// Release every live node `node` owns.
    ///
    /// Only the top-level live nodes are handed to the surface; releasing a
    /// node frees its whole subtree and detaches it from its parent.
    pub(super) fn dispose(&mut self, node: MaterializedNode<S::Node>) {
        for live in node.top_level_live() {
            trace!(node = %live, "dispose");
            self.surface.release(live);
            self.stats.disposed += 1;
        }
    }
}
