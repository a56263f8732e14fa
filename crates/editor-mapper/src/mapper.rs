//! Model ↔ view mapping.
//!
//! [`Mapper`] ties the correspondence table, the marker index, the length resolver, the
//! override hooks and the mapping cache together and exposes position translation in both
//! directions.
//!
//! # Model → view
//!
//! 1. Hooks run first; a hook that fills the output skips the default algorithm.
//! 2. The default algorithm climbs from the model position's parent to the closest bound
//!    model element, converting the offset into that element's flattened coordinates
//!    (unbound model elements contribute the length of their content).
//! 3. The bound view counterpart (the *container*) is walked forward from the closest cached
//!    anchor until the requested offset is reached, caching anchors on the way.
//! 4. The result is moved onto an adjacent text node when there is one.
//!
//! # View → model
//!
//! Hooks run first, then the default algorithm climbs to the closest bound view element and
//! sums the model lengths of everything before the position. This direction is not cached.

use std::cell::RefCell;

use indexmap::IndexSet;

use crate::bindings::CorrespondenceTable;
use crate::cache::{Anchor, CacheStats, MappingCache};
use crate::error::MappingError;
use crate::hooks::{
    HookList, ModelToViewHandler, ModelToViewPositionData, Priority, ResolveContext,
    ViewToModelHandler, ViewToModelPositionData,
};
use crate::length::LengthResolver;
use crate::markers::MarkerIndex;
use crate::model::{ModelNodeId, ModelPosition, ModelRange, ModelTree};
use crate::view::{ViewChange, ViewElementKind, ViewNodeId, ViewPosition, ViewRange, ViewTree};

/// Mapper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperOptions {
    /// Cache model → view lookups per container.
    pub cache_enabled: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
        }
    }
}

/// Options of [`Mapper::unbind_view_element`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnbindOptions {
    /// Postpone the removal until [`Mapper::flush_deferred_bindings`], and skip it there if
    /// the element was re-attached in the meantime.
    pub defer: bool,
}

/// Options of [`Mapper::to_view_position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToViewOptions {
    /// The position may point past content that is already gone from the model (e.g. the end
    /// of a removed range). Bounds checks are skipped and the result is clamped to the end of
    /// the mapped view content.
    pub is_phantom: bool,
}

/// Model ↔ view mapping for one editing session.
///
/// The mapper never owns tree nodes; it stores handles only. Single-threaded: the cache sits
/// behind a [`RefCell`] so that lookups (and hooks calling back into the mapper) work through
/// a shared reference.
pub struct Mapper {
    bindings: CorrespondenceTable,
    markers: MarkerIndex,
    lengths: LengthResolver,
    cache: RefCell<MappingCache>,
    model_to_view_hooks: HookList<ModelToViewHandler>,
    view_to_model_hooks: HookList<ViewToModelHandler>,
    options: MapperOptions,
}

impl Mapper {
    /// Create a mapper with default options.
    pub fn new() -> Self {
        Self::with_options(MapperOptions::default())
    }

    /// Create a mapper with the given options.
    pub fn with_options(options: MapperOptions) -> Self {
        Self {
            bindings: CorrespondenceTable::new(),
            markers: MarkerIndex::new(),
            lengths: LengthResolver::new(),
            cache: RefCell::new(MappingCache::new()),
            model_to_view_hooks: HookList::new(),
            view_to_model_hooks: HookList::new(),
            options,
        }
    }

    /// Current options.
    pub fn options(&self) -> MapperOptions {
        self.options
    }

    /// Turn the mapping cache on or off. Turning it off drops every cached anchor.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.options.cache_enabled = enabled;
        if !enabled {
            self.cache.get_mut().clear();
        }
    }

    /// Read access to the correspondence table.
    pub fn bindings(&self) -> &CorrespondenceTable {
        &self.bindings
    }

    // ---------------------------------------------------------------------------------------
    // Bindings
    // ---------------------------------------------------------------------------------------

    /// Bind a model element (or root) to a view element (or root).
    ///
    /// Bind view elements before inserting them into the view. To bind an element that is
    /// already inside a tracked container, use
    /// [`ViewWriter::bind_elements`](crate::ViewWriter::bind_elements) so the container's
    /// cache is invalidated.
    pub fn bind_elements(&mut self, model: ModelNodeId, view: ViewNodeId) {
        tracing::debug!(?model, ?view, "bind elements");
        self.bindings.bind(model, view);
    }

    /// Unbind a view element.
    ///
    /// Marker names associated with the element are recorded for
    /// [`flush_unbound_marker_names`](Self::flush_unbound_marker_names). With
    /// `defer`, the removal waits for [`flush_deferred_bindings`](Self::flush_deferred_bindings).
    /// Unbinding an unbound element is a no-op.
    pub fn unbind_view_element(
        &mut self,
        view: &ViewTree,
        element: ViewNodeId,
        options: UnbindOptions,
    ) {
        self.markers.mark_element_unbound(element);

        if options.defer {
            tracing::debug!(?element, "defer view element unbinding");
            self.bindings.defer_unbind(element, view.root_of(element));
            return;
        }
        self.unbind_view_now(view, element);
    }

    fn unbind_view_now(&mut self, view: &ViewTree, element: ViewNodeId) {
        if !self.bindings.is_view_bound(element) {
            return;
        }
        if let Some(point) = view.position_before(element) {
            self.invalidate_at(view, point);
        }
        if let Some(model) = self.bindings.unbind_view(element) {
            tracing::debug!(?model, ?element, "unbind view element");
            self.cache.get_mut().stop_tracking(element);
        }
    }

    /// Unbind a model element.
    ///
    /// The reverse entry of its view element is removed only if it still points back at
    /// `model`.
    pub fn unbind_model_element(&mut self, view: &ViewTree, model: ModelNodeId) {
        let Some(element) = self.bindings.to_view(model) else {
            return;
        };
        if self.bindings.to_model(element) == Some(model)
            && let Some(point) = view.position_before(element)
        {
            self.invalidate_at(view, point);
        }
        if let Some(element) = self.bindings.unbind_model(model) {
            tracing::debug!(?model, ?element, "unbind model element");
            self.cache.get_mut().stop_tracking(element);
        }
    }

    /// Finish deferred unbindings.
    ///
    /// An element keeps its binding only if it was re-attached under a root other than the
    /// one recorded when the unbinding was requested. Elements that no longer exist, are
    /// detached, or still sit under the recorded root are unbound. Their marker names were
    /// already recorded when the unbinding was requested.
    pub fn flush_deferred_bindings(&mut self, view: &ViewTree) {
        let deferred = self.bindings.take_deferred();
        if deferred.is_empty() {
            return;
        }
        tracing::debug!(count = deferred.len(), "flush deferred bindings");

        for (element, root) in deferred {
            let detached = !view.contains(element) || view.parent(element).is_none();
            if detached || view.root_of(element) == root {
                self.unbind_view_now(view, element);
            }
        }
    }

    /// Number of deferred unbindings waiting for a flush.
    pub fn deferred_binding_count(&self) -> usize {
        self.bindings.deferred_len()
    }

    /// Drop all bindings, marker associations and cached anchors.
    pub fn clear_bindings(&mut self) {
        tracing::debug!("clear bindings");
        self.bindings.clear();
        self.markers.clear();
        self.cache.get_mut().clear();
    }

    /// Model element bound to `view`.
    pub fn to_model_element(&self, view: ViewNodeId) -> Option<ModelNodeId> {
        self.bindings.to_model(view)
    }

    /// View element bound to `model`.
    pub fn to_view_element(&self, model: ModelNodeId) -> Option<ViewNodeId> {
        self.bindings.to_view(model)
    }

    // ---------------------------------------------------------------------------------------
    // Markers
    // ---------------------------------------------------------------------------------------

    /// Associate a view element with a marker name.
    pub fn bind_element_to_marker(&mut self, element: ViewNodeId, name: &str) {
        self.markers.bind(element, name);
    }

    /// Remove the association between a view element and a marker name.
    pub fn unbind_element_from_marker_name(&mut self, element: ViewNodeId, name: &str) {
        self.markers.unbind(element, name);
    }

    /// View elements associated with the marker `name`.
    pub fn marker_name_to_elements(&self, name: &str) -> Option<&IndexSet<ViewNodeId>> {
        self.markers.elements(name)
    }

    /// Marker names a view element is associated with.
    pub fn marker_names_for_element(&self, element: ViewNodeId) -> Option<&IndexSet<String>> {
        self.markers.names(element)
    }

    /// Marker names whose elements were unbound since the last call.
    pub fn flush_unbound_marker_names(&mut self) -> Vec<String> {
        self.markers.flush_unbound_names()
    }

    // ---------------------------------------------------------------------------------------
    // Lengths
    // ---------------------------------------------------------------------------------------

    /// Register a custom model length for view elements named `name`.
    ///
    /// Lengths computed by callbacks cannot be kept in sync through change notifications, so
    /// the mapping cache is dropped and bypassed while any callback is registered.
    pub fn register_view_to_model_length<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&ViewTree, ViewNodeId) -> usize + Send + 'static,
    {
        self.lengths.register(name, Box::new(callback));
        self.cache.get_mut().clear();
    }

    /// Model length of a view node.
    pub fn view_to_model_length(&self, view: &ViewTree, node: ViewNodeId) -> usize {
        self.lengths.length(view, &self.bindings, node)
    }

    /// Length of a model node in the flattened coordinates of its closest bound ancestor.
    ///
    /// Text measures its `char`s, bound elements measure 1, unbound elements the sum of
    /// their children.
    pub fn model_length(&self, model: &ModelTree, node: ModelNodeId) -> usize {
        let mut length = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(text) = model.text(current) {
                length += text.chars().count();
            } else if self.bindings.to_view(current).is_some() {
                length += 1;
            } else {
                stack.extend_from_slice(model.children(current));
            }
        }
        length
    }

    // ---------------------------------------------------------------------------------------
    // Hooks
    // ---------------------------------------------------------------------------------------

    /// Register a model → view override handler.
    pub fn on_model_to_view_position<F>(&mut self, priority: Priority, handler: F)
    where
        F: Fn(&ResolveContext<'_>, &mut ModelToViewPositionData) + Send + 'static,
    {
        self.model_to_view_hooks.push(priority, Box::new(handler));
    }

    /// Register a view → model override handler.
    pub fn on_view_to_model_position<F>(&mut self, priority: Priority, handler: F)
    where
        F: Fn(&ResolveContext<'_>, &mut ViewToModelPositionData) + Send + 'static,
    {
        self.view_to_model_hooks.push(priority, Box::new(handler));
    }

    // ---------------------------------------------------------------------------------------
    // Positions and ranges
    // ---------------------------------------------------------------------------------------

    /// Map a model position to the view.
    pub fn to_view_position(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        position: ModelPosition,
        options: ToViewOptions,
    ) -> Result<ViewPosition, MappingError> {
        let mut data = ModelToViewPositionData {
            model_position: position,
            view_position: None,
            is_phantom: options.is_phantom,
        };

        let context = ResolveContext {
            mapper: self,
            model,
            view,
        };
        for handler in self.model_to_view_hooks.iter() {
            handler(&context, &mut data);
            if data.view_position.is_some() {
                break;
            }
        }

        match data.view_position {
            Some(resolved) => Ok(resolved),
            None => self.default_to_view_position(model, view, data.model_position, data.is_phantom),
        }
    }

    /// Map a view position to the model.
    ///
    /// Unbound model elements have no view counterpart, so a view position only descends into
    /// one when it falls strictly inside its content. Positions at either edge of an unbound
    /// element resolve to its parent: `(span, 0)` comes back as the position right before the
    /// span and `(span, len)` as the position right after it. Round trips are exact for every
    /// other model position. A [`on_view_to_model_position`](Self::on_view_to_model_position)
    /// handler can pick the deeper position where a feature needs it.
    pub fn to_model_position(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        position: ViewPosition,
    ) -> Result<ModelPosition, MappingError> {
        let mut data = ViewToModelPositionData {
            view_position: position,
            model_position: None,
        };

        let context = ResolveContext {
            mapper: self,
            model,
            view,
        };
        for handler in self.view_to_model_hooks.iter() {
            handler(&context, &mut data);
            if data.model_position.is_some() {
                break;
            }
        }

        match data.model_position {
            Some(resolved) => Ok(resolved),
            None => self.default_to_model_position(model, view, data.view_position),
        }
    }

    /// Map a model range to the view (both ends mapped independently).
    pub fn to_view_range(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        range: ModelRange,
    ) -> Result<ViewRange, MappingError> {
        Ok(ViewRange::new(
            self.to_view_position(model, view, range.start, ToViewOptions::default())?,
            self.to_view_position(model, view, range.end, ToViewOptions::default())?,
        ))
    }

    /// Map a view range to the model (both ends mapped independently).
    pub fn to_model_range(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        range: ViewRange,
    ) -> Result<ModelRange, MappingError> {
        Ok(ModelRange::new(
            self.to_model_position(model, view, range.start)?,
            self.to_model_position(model, view, range.end)?,
        ))
    }

    /// Closest bound view element containing `position` (its parent included).
    pub fn find_mapped_view_ancestor(
        &self,
        view: &ViewTree,
        position: ViewPosition,
    ) -> Result<ViewNodeId, MappingError> {
        if !view.contains(position.parent) {
            return Err(MappingError::UnknownViewNode(position.parent));
        }
        let mut current = position.parent;
        while !self.bindings.is_view_bound(current) {
            current = view
                .parent(current)
                .ok_or(MappingError::NoMappedViewAncestor(position.parent))?;
        }
        Ok(current)
    }

    /// View position inside `container` that corresponds to `model_offset` in the container's
    /// model coordinates.
    ///
    /// This is the building block hooks use to resolve positions inside their own structures.
    pub fn find_position_in(
        &self,
        view: &ViewTree,
        container: ViewNodeId,
        model_offset: usize,
    ) -> Result<ViewPosition, MappingError> {
        self.find_position(view, container, model_offset, false)
    }

    // ---------------------------------------------------------------------------------------
    // Cache
    // ---------------------------------------------------------------------------------------

    /// Report a view change that is about to be applied.
    ///
    /// The innermost bound element enclosing the changed point drops every cached anchor
    /// at or after that point. Must be called before the change is applied;
    /// [`ViewWriter`](crate::ViewWriter) does this for every edit it performs.
    pub fn handle_view_change(&self, view: &ViewTree, change: ViewChange) {
        let point = match change {
            ViewChange::Children { parent, index } => ViewPosition::new(parent, index),
            ViewChange::Text { node } => match view.position_before(node) {
                Some(point) => point,
                None => return,
            },
        };
        self.invalidate_at(view, point);
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    /// Zero the cache counters.
    pub fn reset_cache_stats(&self) {
        self.cache.borrow_mut().reset_stats();
    }

    /// Anchors currently cached for `container`.
    pub fn cached_anchors(&self, container: ViewNodeId) -> Option<Vec<Anchor>> {
        self.cache.borrow().anchors(container).map(<[Anchor]>::to_vec)
    }

    /// Whether `container` is tracked by the cache.
    pub fn is_tracking(&self, container: ViewNodeId) -> bool {
        self.cache.borrow().is_tracking(container)
    }

    fn cache_active(&self) -> bool {
        self.options.cache_enabled && !self.lengths.has_callbacks()
    }

    fn invalidate_at(&self, view: &ViewTree, point: ViewPosition) {
        if self.cache.borrow().tracked_count() == 0 {
            return;
        }
        let mut current = Some(point.parent);
        while let Some(node) = current {
            if self.bindings.is_view_bound(node) {
                self.cache.borrow_mut().invalidate_after(view, node, point);
                return;
            }
            current = view.parent(node);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Default algorithms
    // ---------------------------------------------------------------------------------------

    fn default_to_view_position(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        position: ModelPosition,
        is_phantom: bool,
    ) -> Result<ViewPosition, MappingError> {
        if !model.contains(position.parent) {
            return Err(MappingError::UnknownModelNode(position.parent));
        }
        let max = model
            .max_offset(position.parent)
            .ok_or(MappingError::InvalidModelParent(position.parent))?;
        if !is_phantom && position.offset > max {
            return Err(MappingError::OffsetOutOfBounds {
                offset: position.offset,
                max,
            });
        }

        let (model_container, model_offset) = self.offset_in_mapped_model_ancestor(model, position)?;
        let container = self
            .bindings
            .to_view(model_container)
            .ok_or(MappingError::NoMappedModelAncestor(position.parent))?;
        self.find_position(view, container, model_offset, is_phantom)
    }

    /// Climb from the position's parent to the closest bound model element, returning it with
    /// the position's offset in that element's flattened coordinates.
    fn offset_in_mapped_model_ancestor(
        &self,
        model: &ModelTree,
        position: ModelPosition,
    ) -> Result<(ModelNodeId, usize), MappingError> {
        let mut node = position.parent;
        let mut offset = self.flattened_offset(model, node, position.offset);

        while self.bindings.to_view(node).is_none() {
            let parent = model
                .parent(node)
                .ok_or(MappingError::NoMappedModelAncestor(position.parent))?;
            offset += model
                .children(parent)
                .iter()
                .take_while(|&&child| child != node)
                .map(|&child| self.model_length(model, child))
                .sum::<usize>();
            node = parent;
        }

        Ok((node, offset))
    }

    /// Convert an offset-size offset inside `parent` to flattened units.
    fn flattened_offset(&self, model: &ModelTree, parent: ModelNodeId, offset: usize) -> usize {
        let mut remaining = offset;
        let mut flattened = 0;
        for &child in model.children(parent) {
            if remaining == 0 {
                break;
            }
            let size = model.offset_size(child);
            if size <= remaining {
                remaining -= size;
                flattened += self.model_length(model, child);
            } else {
                // Inside a text node.
                flattened += remaining;
                remaining = 0;
            }
        }
        // Phantom positions may point past the content.
        flattened + remaining
    }

    fn find_position(
        &self,
        view: &ViewTree,
        container: ViewNodeId,
        model_offset: usize,
        is_phantom: bool,
    ) -> Result<ViewPosition, MappingError> {
        if !view.contains(container) {
            return Err(MappingError::UnknownViewNode(container));
        }
        if model_offset == 0 {
            return Ok(self.move_to_text_node(view, ViewPosition::new(container, 0)));
        }

        let use_cache = self.cache_active();
        let start = if use_cache {
            self.cache.borrow_mut().get_closest(container, model_offset)
        } else {
            Anchor::seed(container)
        };

        let found = self.walk_forward(view, container, start, model_offset, use_cache, is_phantom)?;
        Ok(self.move_to_text_node(view, found))
    }

    /// Walk the view from `start` until `target` model units have been traversed.
    ///
    /// Every node boundary passed is offered to the cache. When the walk stops at a point
    /// inside a non-container element followed only by zero-length nodes, it steps out of
    /// that element, so a walk resumed from a deep anchor ends where a walk from the container
    /// start would.
    fn walk_forward(
        &self,
        view: &ViewTree,
        container: ViewNodeId,
        start: Anchor,
        target: usize,
        use_cache: bool,
        is_phantom: bool,
    ) -> Result<ViewPosition, MappingError> {
        let mut parent = start.view_position.parent;
        let mut offset = start.view_position.offset;
        let mut traversed = start.model_offset;
        let mut measured = 0u64;

        let found = loop {
            if traversed == target {
                if parent != container && self.only_empty_after(view, parent, offset, &mut measured) {
                    (parent, offset) = Self::step_out(view, parent)?;
                    self.save_anchor(view, use_cache, parent, offset, container, traversed);
                    continue;
                }
                break ViewPosition::new(parent, offset);
            }

            match view.child(parent, offset) {
                Some(child) => {
                    let length = self.lengths.length(view, &self.bindings, child);
                    measured += 1;
                    if traversed + length <= target {
                        traversed += length;
                        offset += 1;
                        self.save_anchor(view, use_cache, parent, offset, container, traversed);
                    } else if view.is_text(child) {
                        break ViewPosition::new(child, target - traversed);
                    } else {
                        parent = child;
                        offset = 0;
                    }
                }
                None if parent == container => {
                    if is_phantom {
                        break ViewPosition::new(parent, offset);
                    }
                    tracing::warn!(
                        ?container,
                        model_offset = target,
                        length = traversed,
                        "model offset past the end of mapped view content"
                    );
                    self.cache.borrow_mut().record_measured(measured);
                    return Err(MappingError::PositionPastContent {
                        model_offset: target,
                        length: traversed,
                    });
                }
                None => {
                    (parent, offset) = Self::step_out(view, parent)?;
                    self.save_anchor(view, use_cache, parent, offset, container, traversed);
                }
            }
        };

        self.cache.borrow_mut().record_measured(measured);
        Ok(found)
    }

    fn save_anchor(
        &self,
        view: &ViewTree,
        use_cache: bool,
        parent: ViewNodeId,
        offset: usize,
        container: ViewNodeId,
        model_offset: usize,
    ) {
        if use_cache {
            self.cache
                .borrow_mut()
                .save(view, parent, offset, container, model_offset);
        }
    }

    /// Position right after `node`.
    fn step_out(view: &ViewTree, node: ViewNodeId) -> Result<(ViewNodeId, usize), MappingError> {
        let position = view
            .position_after(node)
            .ok_or(MappingError::UnknownViewNode(node))?;
        Ok((position.parent, position.offset))
    }

    fn only_empty_after(
        &self,
        view: &ViewTree,
        parent: ViewNodeId,
        offset: usize,
        measured: &mut u64,
    ) -> bool {
        for &child in view.children(parent).iter().skip(offset) {
            *measured += 1;
            if self.lengths.length(view, &self.bindings, child) > 0 {
                return false;
            }
        }
        true
    }

    /// Prefer "end of the text before" over "start of the text after" over the position itself.
    fn move_to_text_node(&self, view: &ViewTree, position: ViewPosition) -> ViewPosition {
        if view.is_text(position.parent) {
            return position;
        }
        if let Some(before) = view.node_before(position)
            && let Some(length) = view.text_len(before)
        {
            return ViewPosition::new(before, length);
        }
        if let Some(after) = view.node_after(position)
            && view.is_text(after)
        {
            return ViewPosition::new(after, 0);
        }
        position
    }

    fn default_to_model_position(
        &self,
        model: &ModelTree,
        view: &ViewTree,
        position: ViewPosition,
    ) -> Result<ModelPosition, MappingError> {
        let container = self.find_mapped_view_ancestor(view, position)?;
        let model_parent = self
            .bindings
            .to_model(container)
            .ok_or(MappingError::NoMappedViewAncestor(position.parent))?;
        if !model.contains(model_parent) {
            return Err(MappingError::UnknownModelNode(model_parent));
        }
        let model_offset = self.to_model_offset(view, position, container)?;
        self.model_position_at(model, model_parent, model_offset)
    }

    /// Model offset of `position` relative to `container`.
    fn to_model_offset(
        &self,
        view: &ViewTree,
        position: ViewPosition,
        container: ViewNodeId,
    ) -> Result<usize, MappingError> {
        let mut parent = position.parent;
        let mut offset = position.offset;
        let mut total = 0;

        loop {
            if view.is_text(parent) {
                total += offset;
            } else {
                total += view
                    .children(parent)
                    .iter()
                    .take(offset)
                    .map(|&child| self.lengths.length(view, &self.bindings, child))
                    .sum::<usize>();
            }
            // Positions inside UI elements collapse onto the element itself.
            if view.kind(parent) == Some(ViewElementKind::Ui) {
                total = 0;
            }
            if parent == container {
                return Ok(total);
            }
            let up = view
                .position_before(parent)
                .ok_or(MappingError::NoMappedViewAncestor(position.parent))?;
            parent = up.parent;
            offset = up.offset;
        }
    }

    /// Model position `flattened` units into `parent`, descending into unbound model
    /// elements that strictly contain it.
    fn model_position_at(
        &self,
        model: &ModelTree,
        parent: ModelNodeId,
        flattened: usize,
    ) -> Result<ModelPosition, MappingError> {
        let mut parent = parent;
        let mut remaining = flattened;

        'descend: loop {
            let mut offset = 0;
            for &child in model.children(parent) {
                if remaining == 0 {
                    break;
                }
                let length = self.model_length(model, child);
                if remaining < length
                    && model.is_element(child)
                    && self.bindings.to_view(child).is_none()
                {
                    parent = child;
                    continue 'descend;
                }
                if length <= remaining {
                    remaining -= length;
                    offset += model.offset_size(child);
                } else {
                    offset += remaining;
                    remaining = 0;
                }
            }

            if remaining > 0 {
                return Err(MappingError::PositionPastContent {
                    model_offset: flattened,
                    length: flattened - remaining,
                });
            }
            return Ok(ModelPosition::new(parent, offset));
        }
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("bindings", &self.bindings)
            .field("markers", &self.markers)
            .field("lengths", &self.lengths)
            .field("cache", &self.cache)
            .field("model_to_view_hooks", &self.model_to_view_hooks.len())
            .field("view_to_model_hooks", &self.view_to_model_hooks.len())
            .field("options", &self.options)
            .finish()
    }
}
