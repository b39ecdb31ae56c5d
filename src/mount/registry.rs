//! Mount registry - caller-owned table of mounted trees.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::{Engine, Materialized, PatchStats};
use crate::error::{Error, Result};
use crate::surface::{Surface, Target, resolve};
use crate::vnode::{Context, Source};

// =============================================================================
// MountId
// =============================================================================

/// Identifier of one mount. Rendered as a decimal string, the first one
/// handed out by a registry is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(u64);

impl MountId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MountId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(MountId)
    }
}

// =============================================================================
// MountEntry
// =============================================================================

/// One mounted tree and everything needed to re-render it.
#[derive(Debug)]
pub struct MountEntry<N> {
    id: MountId,
    container: N,
    source: Source,
    materialized: Materialized<N>,
    in_svg: bool,
    data: Context,
}

impl<N: Copy> MountEntry<N> {
    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn container(&self) -> N {
        self.container
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn materialized(&self) -> &Materialized<N> {
        &self.materialized
    }

    pub fn in_svg(&self) -> bool {
        self.in_svg
    }

    /// Mount-local data handed to contextual sources.
    pub fn data(&self) -> &Context {
        &self.data
    }
}

// =============================================================================
// MountRegistry
// =============================================================================

/// Table of mounted trees, keyed by [`MountId`] and by container.
///
/// No two mounts share a container, and no mount's container lies inside
/// another's.
pub struct MountRegistry<S: Surface> {
    engine: Engine,
    next_id: u64,
    mounts: BTreeMap<MountId, MountEntry<S::Node>>,
    containers: HashMap<S::Node, MountId>,
}

impl<S: Surface> Default for MountRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Surface> MountRegistry<S> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            engine: Engine::new(config),
            next_id: 1,
            mounts: BTreeMap::new(),
            containers: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    // -------------------------------------------------------------------------
    // Mounting
    // -------------------------------------------------------------------------

    /// Mount `source` into the single container `target` identifies.
    ///
    /// A tree already mounted on that container is unmounted first. Fails
    /// with [`Error::TargetNotFound`] when nothing matches and
    /// [`Error::AmbiguousTarget`] when more than one node does.
    pub fn mount(
        &mut self,
        surface: &mut S,
        target: impl Into<Target<S::Node>>,
        source: impl Into<Source>,
        data: Context,
    ) -> Result<MountId> {
        let target = target.into();
        let matches = resolve(surface, &target)?;
        let container = match matches.as_slice() {
            [] => return Err(Error::TargetNotFound(target.to_string())),
            [container] => *container,
            many => {
                return Err(Error::AmbiguousTarget {
                    selector: target.to_string(),
                    count: many.len(),
                });
            }
        };
        self.mount_container(surface, container, source.into(), data)
    }

    /// Mount `source` into every container `target` identifies, in document
    /// order. Each mount shares the source and the data.
    pub fn mount_all(
        &mut self,
        surface: &mut S,
        target: impl Into<Target<S::Node>>,
        source: impl Into<Source>,
        data: Context,
    ) -> Result<Vec<MountId>> {
        let target = target.into();
        let matches = resolve(surface, &target)?;
        if matches.is_empty() {
            return Err(Error::TargetNotFound(target.to_string()));
        }
        let source = source.into();
        matches
            .into_iter()
            .map(|container| self.mount_container(surface, container, source.clone(), data.clone()))
            .collect()
    }

    fn mount_container(
        &mut self,
        surface: &mut S,
        container: S::Node,
        source: Source,
        data: Context,
    ) -> Result<MountId> {
        self.check_overlap(surface, container)?;
        if let Some(existing) = self.containers.get(&container).copied() {
            self.unmount_id(surface, existing);
        }

        let materialized = self.engine.create(surface, container, &source, &data)?;
        let id = MountId(self.next_id);
        self.next_id += 1;

        let in_svg = materialized.in_svg();
        self.containers.insert(container, id);
        self.mounts.insert(
            id,
            MountEntry {
                id,
                container,
                source,
                materialized,
                in_svg,
                data,
            },
        );
        debug!(%id, container = %container, in_svg, "mounted");
        Ok(id)
    }

    fn check_overlap(&self, surface: &S, container: S::Node) -> Result<()> {
        let clash = self.containers.iter().find(|(other, _)| {
            **other != container
                && (surface.is_inclusive_ancestor(**other, container)
                    || surface.is_inclusive_ancestor(container, **other))
        });
        match clash {
            Some((_, id)) => Err(Error::OverlappingMount(id.to_string())),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Unmounting
    // -------------------------------------------------------------------------

    /// Unmount every mount whose container `target` identifies.
    ///
    /// Returns how many mounts were removed. Matches without a mount are
    /// skipped.
    pub fn unmount(&mut self, surface: &mut S, target: impl Into<Target<S::Node>>) -> Result<usize> {
        let target = target.into();
        let mut removed = 0;
        for container in resolve(surface, &target)? {
            if let Some(id) = self.containers.get(&container).copied() {
                if self.unmount_id(surface, id) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Unmount one mount. Unknown ids are ignored.
    pub fn unmount_id(&mut self, surface: &mut S, id: MountId) -> bool {
        let Some(mut entry) = self.mounts.remove(&id) else {
            warn!(%id, "unmount ignored: unknown mount id");
            return false;
        };
        self.containers.remove(&entry.container);
        self.engine.remove(surface, &mut entry.materialized);
        debug!(%id, container = %entry.container, "unmounted");
        true
    }

    // -------------------------------------------------------------------------
    // Updating
    // -------------------------------------------------------------------------

    /// Re-render one mount from its source and data.
    ///
    /// Returns `Ok(false)` when the id is unknown.
    pub fn update(&mut self, surface: &mut S, id: MountId) -> Result<bool> {
        Ok(self.update_with_stats(surface, id)?.is_some())
    }

    /// Like [`update`](Self::update) but reports what changed.
    pub fn update_with_stats(&mut self, surface: &mut S, id: MountId) -> Result<Option<PatchStats>> {
        let Some(entry) = self.mounts.get_mut(&id) else {
            warn!(%id, "update ignored: unknown mount id");
            return Ok(None);
        };
        let stats = self.engine.update(
            surface,
            entry.container,
            &mut entry.materialized,
            &entry.source,
            &entry.data,
            entry.in_svg,
        )?;
        Ok(Some(stats))
    }

    /// Re-render every mount in id order. Returns how many were updated.
    pub fn update_all(&mut self, surface: &mut S) -> Result<usize> {
        let ids: Vec<MountId> = self.mounts.keys().copied().collect();
        let mut updated = 0;
        for id in ids {
            if self.update(surface, id)? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn mounted(&self, id: MountId) -> Option<&MountEntry<S::Node>> {
        self.mounts.get(&id)
    }

    /// Every mount in id order.
    pub fn mounts(&self) -> impl Iterator<Item = &MountEntry<S::Node>> {
        self.mounts.values()
    }

    pub fn mount_id_of(&self, container: S::Node) -> Option<MountId> {
        self.containers.get(&container).copied()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl<S: Surface> fmt::Debug for MountRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountRegistry")
            .field("config", self.engine.config())
            .field("next_id", &self.next_id)
            .field("mounts", &self.mounts.keys().collect::<Vec<_>>())
            .finish()
    }
}
