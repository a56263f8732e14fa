//! Bidirectional model ↔ view element table.
//!
//! The two directions are stored independently. Binding overwrites both directions for the
//! given pair but never clears the other side of a replaced pair, so a view element can be
//! re-bound to a new model element while the old model element keeps its own forward entry.

use rustc_hash::FxHashMap;

use crate::model::ModelNodeId;
use crate::view::ViewNodeId;

/// Model ↔ view correspondence entries plus pending deferred removals.
#[derive(Debug, Default)]
pub struct CorrespondenceTable {
    model_to_view: FxHashMap<ModelNodeId, ViewNodeId>,
    view_to_model: FxHashMap<ViewNodeId, ModelNodeId>,
    /// View elements scheduled for unbinding, with the root they had when scheduled.
    deferred_removals: FxHashMap<ViewNodeId, Option<ViewNodeId>>,
}

impl CorrespondenceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `model` and `view` in both directions (last write wins).
    pub fn bind(&mut self, model: ModelNodeId, view: ViewNodeId) {
        self.model_to_view.insert(model, view);
        self.view_to_model.insert(view, model);
    }

    /// Remove the reverse entry of `view`, and the forward entry of its model element if that
    /// entry still points at `view`.
    ///
    /// Returns the model element `view` was bound to, `None` if it was not bound.
    pub fn unbind_view(&mut self, view: ViewNodeId) -> Option<ModelNodeId> {
        let model = self.view_to_model.remove(&view)?;
        if self.model_to_view.get(&model) == Some(&view) {
            self.model_to_view.remove(&model);
        }
        Some(model)
    }

    /// Remove the forward entry of `model`, and the reverse entry of its view element if that
    /// entry still points back at `model`.
    ///
    /// Returns the view element whose reverse entry was removed.
    pub fn unbind_model(&mut self, model: ModelNodeId) -> Option<ViewNodeId> {
        let view = self.model_to_view.remove(&model)?;
        if self.view_to_model.get(&view) == Some(&model) {
            self.view_to_model.remove(&view);
            return Some(view);
        }
        None
    }

    /// Model element bound to `view`.
    pub fn to_model(&self, view: ViewNodeId) -> Option<ModelNodeId> {
        self.view_to_model.get(&view).copied()
    }

    /// View element bound to `model`.
    pub fn to_view(&self, model: ModelNodeId) -> Option<ViewNodeId> {
        self.model_to_view.get(&model).copied()
    }

    /// Whether `view` has a reverse entry.
    pub fn is_view_bound(&self, view: ViewNodeId) -> bool {
        self.view_to_model.contains_key(&view)
    }

    /// Schedule `view` for unbinding at the next flush, remembering its current root.
    pub fn defer_unbind(&mut self, view: ViewNodeId, root: Option<ViewNodeId>) {
        self.deferred_removals.insert(view, root);
    }

    /// Number of pending deferred removals.
    pub fn deferred_len(&self) -> usize {
        self.deferred_removals.len()
    }

    /// Drain the pending deferred removals.
    pub fn take_deferred(&mut self) -> Vec<(ViewNodeId, Option<ViewNodeId>)> {
        self.deferred_removals.drain().collect()
    }

    /// Number of view elements with a reverse entry.
    pub fn len(&self) -> usize {
        self.view_to_model.len()
    }

    /// Returns `true` if no view element is bound.
    pub fn is_empty(&self) -> bool {
        self.view_to_model.is_empty()
    }

    /// Bound view elements.
    pub fn view_elements(&self) -> impl Iterator<Item = ViewNodeId> + '_ {
        self.view_to_model.keys().copied()
    }

    /// Drop every entry, including pending deferred removals.
    pub fn clear(&mut self) {
        self.model_to_view.clear();
        self.view_to_model.clear();
        self.deferred_removals.clear();
    }
}
