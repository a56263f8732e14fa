//! Incremental model → view mapping cache.
//!
//! For every tracked view container the cache keeps a sparse list of anchors: view positions
//! together with the model offset (relative to the container) they correspond to. The list is
//! sorted by model offset, which for a forward walk is also document order, so lookups are a
//! binary search and invalidation is a truncation.
//!
//! Layout of a container cache:
//!
//! ```text
//! anchors:         [ (container,0)=0 | (p,1)=1 | (strong,2)=4 | (p,3)=6 ]
//! by_node_before:  {  img -> 1,  "cd" -> 2,  strong -> 3 }
//! ```
//!
//! The seed anchor `(container, 0) = 0` is never dropped while the container is tracked.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::view::{ViewNodeId, ViewPosition, ViewTree};

/// A cached `(view position, model offset)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Position in the view.
    pub view_position: ViewPosition,
    /// Model offset of that position, relative to the tracked container.
    pub model_offset: usize,
}

impl Anchor {
    /// The trivial anchor at the start of `container`.
    pub fn seed(container: ViewNodeId) -> Self {
        Self {
            view_position: ViewPosition::new(container, 0),
            model_offset: 0,
        }
    }
}

/// Cache counters, reset only by [`MappingCache::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered by an anchor past the container start.
    pub hits: u64,
    /// Lookups that had to start from the container start.
    pub misses: u64,
    /// View nodes measured by forward walks.
    pub measured_nodes: u64,
    /// Anchors dropped by invalidation.
    pub invalidated_anchors: u64,
}

#[derive(Debug)]
struct ContainerCache {
    anchors: Vec<Anchor>,
    /// Node right before an anchor's position -> index of that anchor.
    by_node_before: FxHashMap<ViewNodeId, usize>,
}

impl ContainerCache {
    fn new(container: ViewNodeId) -> Self {
        Self {
            anchors: vec![Anchor::seed(container)],
            by_node_before: FxHashMap::default(),
        }
    }

    /// Keep the first `len` anchors (never fewer than the seed). Returns how many were dropped.
    fn truncate(&mut self, len: usize) -> usize {
        let len = len.max(1);
        if len >= self.anchors.len() {
            return 0;
        }
        let dropped = self.anchors.len() - len;
        self.anchors.truncate(len);
        self.by_node_before.retain(|_, index| *index < len);
        dropped
    }
}

/// Per-container anchor lists.
#[derive(Debug, Default)]
pub struct MappingCache {
    containers: FxHashMap<ViewNodeId, ContainerCache>,
    stats: CacheStats,
}

impl MappingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `container` is tracked.
    pub fn is_tracking(&self, container: ViewNodeId) -> bool {
        self.containers.contains_key(&container)
    }

    /// Number of tracked containers.
    pub fn tracked_count(&self) -> usize {
        self.containers.len()
    }

    /// Anchors of `container`, if tracked.
    pub fn anchors(&self, container: ViewNodeId) -> Option<&[Anchor]> {
        self.containers
            .get(&container)
            .map(|cache| cache.anchors.as_slice())
    }

    /// Start tracking `container` (no-op if already tracked).
    pub fn start_tracking(&mut self, container: ViewNodeId) {
        self.containers
            .entry(container)
            .or_insert_with(|| ContainerCache::new(container));
    }

    /// Anchor with the greatest model offset not above `model_offset`.
    ///
    /// Starts tracking `container` if needed, in which case the seed anchor is returned.
    pub fn get_closest(&mut self, container: ViewNodeId, model_offset: usize) -> Anchor {
        let Some(cache) = self.containers.get(&container) else {
            self.start_tracking(container);
            self.stats.misses += 1;
            return Anchor::seed(container);
        };

        let index = cache
            .anchors
            .partition_point(|anchor| anchor.model_offset <= model_offset)
            .saturating_sub(1);
        let anchor = cache.anchors[index];
        if index == 0 {
            self.stats.misses += 1;
        } else {
            self.stats.hits += 1;
        }
        anchor
    }

    /// Record that `(view_parent, view_offset)` sits at `model_offset` inside `container`.
    ///
    /// Positions at offset 0 are never stored. When an anchor with the same model offset
    /// exists, the one whose parent is closer to the container is kept.
    pub fn save(
        &mut self,
        view: &ViewTree,
        view_parent: ViewNodeId,
        view_offset: usize,
        container: ViewNodeId,
        model_offset: usize,
    ) {
        if view_offset == 0 {
            return;
        }
        let Some(cache) = self.containers.get_mut(&container) else {
            return;
        };
        let Some(node_before) = view.child(view_parent, view_offset - 1) else {
            return;
        };
        let position = ViewPosition::new(view_parent, view_offset);

        let last_offset = cache.anchors.last().map_or(0, |anchor| anchor.model_offset);
        if model_offset > last_offset {
            cache.anchors.push(Anchor {
                view_position: position,
                model_offset,
            });
            cache
                .by_node_before
                .insert(node_before, cache.anchors.len() - 1);
            tracing::trace!(?container, model_offset, ?position, "cached anchor");
            return;
        }

        let Ok(index) = cache
            .anchors
            .binary_search_by_key(&model_offset, |anchor| anchor.model_offset)
        else {
            return;
        };
        let existing = cache.anchors[index];
        if existing.view_position == position
            || view.depth(view_parent) >= view.depth(existing.view_position.parent)
        {
            return;
        }

        if let Some(old_before) = view.node_before(existing.view_position) {
            cache.by_node_before.remove(&old_before);
        }
        cache.anchors[index].view_position = position;
        cache.by_node_before.insert(node_before, index);
        tracing::trace!(?container, model_offset, ?position, "hoisted anchor");
    }

    /// Drop every anchor of `container` at or after `point` in document order. The seed
    /// anchor always stays.
    ///
    /// Must run before the change at `point` is applied to `view`.
    pub fn invalidate_after(&mut self, view: &ViewTree, container: ViewNodeId, point: ViewPosition) {
        let Some(cache) = self.containers.get_mut(&container) else {
            return;
        };

        let indexed = view
            .node_before(point)
            .and_then(|node| cache.by_node_before.get(&node).copied())
            .filter(|&index| {
                cache.anchors.get(index).map(|anchor| anchor.view_position) == Some(point)
            });

        let keep = match indexed {
            Some(index) => index,
            None => cache.anchors.partition_point(|anchor| {
                view.compare_positions(anchor.view_position, point) == Some(Ordering::Less)
            }),
        };

        let dropped = cache.truncate(keep);
        if dropped > 0 {
            self.stats.invalidated_anchors += dropped as u64;
            tracing::trace!(?container, ?point, dropped, "invalidated anchors");
        }
    }

    /// Drop everything cached for `container` and stop tracking it.
    pub fn stop_tracking(&mut self, container: ViewNodeId) {
        if self.containers.remove(&container).is_some() {
            tracing::trace!(?container, "stopped tracking container");
        }
    }

    /// Stop tracking every container.
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Zero the counters.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub(crate) fn record_measured(&mut self, nodes: u64) {
        self.stats.measured_nodes += nodes;
    }
}
