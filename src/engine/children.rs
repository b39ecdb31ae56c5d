//! Child list reconciliation.
//!
//! Two strategies, picked per list:
//! - **Keyed**: every old and every new child carries a key. Children are
//!   matched by key wherever they moved; only out-of-order ones are moved.
//! - **Positional**: otherwise. `old[i]` is paired with `new[i]`, the tail
//!   is appended or disposed.
//!
//! # Move minimization
//!
//! The keyed pass walks the new list once, remembering the highest old index
//! placed so far. A match whose old index is at least that high is already
//! in order and stays where it is; a lower one is moved right after the
//! previously placed sibling.
//!
//! ```text
//! old: A B C D        new: D A B C
//!
//! D (old 3)  stays    last placed = 3
//! A (old 0)  moves    after D
//! B (old 1)  moves    after A
//! C (old 2)  moves    after B
//! ```
//!
//! Insert positions always come from the cursor (the last live node placed),
//! so children of fragments land between their siblings correctly.

use std::collections::HashMap;

use tracing::trace;

use super::Patcher;
use super::materialized::MaterializedNode;
use crate::error::Result;
use crate::surface::Surface;
use crate::types::Namespace;
use crate::vnode::VNode;

impl<S: Surface> Patcher<'_, S> {
    /// Reconcile `old` against `new` under `parent`, starting after `cursor`.
    pub(super) fn reconcile_children(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        old: Vec<MaterializedNode<S::Node>>,
        new: &[VNode],
        namespace: Namespace,
    ) -> Result<Vec<MaterializedNode<S::Node>>> {
        if old.is_empty() && new.is_empty() {
            return Ok(old);
        }
        let keyed = old.iter().all(|child| child.key().is_some())
            && new.iter().all(|child| child.key().is_some());
        if keyed {
            self.reconcile_keyed(parent, cursor, old, new, namespace)
        } else {
            self.reconcile_positional(parent, cursor, old, new, namespace)
        }
    }

    fn reconcile_positional(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        old: Vec<MaterializedNode<S::Node>>,
        new: &[VNode],
        namespace: Namespace,
    ) -> Result<Vec<MaterializedNode<S::Node>>> {
        let mut patched = Vec::with_capacity(new.len());
        let mut old = old.into_iter();

        for vnode in new {
            match old.next() {
                Some(previous) => patched.push(self.patch(parent, cursor, previous, vnode, namespace)?),
                None => patched.push(self.insert_new(parent, cursor, vnode, namespace)?),
            }
        }
        for stale in old {
            self.dispose(stale);
        }
        Ok(patched)
    }

    fn reconcile_keyed(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        old: Vec<MaterializedNode<S::Node>>,
        new: &[VNode],
        namespace: Namespace,
    ) -> Result<Vec<MaterializedNode<S::Node>>> {
        let index: HashMap<String, usize> = old
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.key().map(|key| (key.to_string(), i)))
            .collect();
        let mut slots: Vec<Option<MaterializedNode<S::Node>>> = old.into_iter().map(Some).collect();
        let mut patched = Vec::with_capacity(new.len());
        let mut last_placed = 0;

        for vnode in new {
            let matched = vnode
                .key()
                .and_then(|key| index.get(key).copied())
                .and_then(|i| slots[i].take().map(|child| (i, child)));

            let Some((old_index, previous)) = matched else {
                trace!(key = ?vnode.key(), "keyed insert");
                patched.push(self.insert_new(parent, cursor, vnode, namespace)?);
                continue;
            };

            if self.config.keyed_moves() && old_index >= last_placed {
                last_placed = old_index;
            } else {
                trace!(key = ?vnode.key(), from = old_index, "keyed move");
                self.move_after(parent, *cursor, &previous)?;
            }
            patched.push(self.patch(parent, cursor, previous, vnode, namespace)?);
        }

        for stale in slots.into_iter().flatten() {
            trace!(key = ?stale.key(), "keyed dispose");
            self.dispose(stale);
        }
        Ok(patched)
    }

    /// Materialize `vnode` right after `cursor`.
    fn insert_new(
        &mut self,
        parent: S::Node,
        cursor: &mut Option<S::Node>,
        vnode: &VNode,
        namespace: Namespace,
    ) -> Result<MaterializedNode<S::Node>> {
        let built = self.build(vnode, namespace)?;
        let reference = self.after(parent, *cursor);
        self.place(parent, &built, reference)?;
        if let Some(last) = built.last_live() {
            *cursor = Some(last);
        }
        Ok(built)
    }

    /// Move the top-level live nodes of `node` right after `cursor`.
    fn move_after(
        &mut self,
        parent: S::Node,
        cursor: Option<S::Node>,
        node: &MaterializedNode<S::Node>,
    ) -> Result<()> {
        let mut reference = self.after(parent, cursor);
        for live in node.top_level_live() {
            if reference == Some(live) {
                reference = self.surface.next_sibling(live);
                continue;
            }
            self.surface.insert_before(parent, live, reference)?;
            self.stats.moved += 1;
        }
        Ok(())
    }
}
