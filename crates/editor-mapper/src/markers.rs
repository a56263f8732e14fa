//! Marker name ↔ view element index.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::view::ViewNodeId;

/// Many-to-many index between marker names and view elements, plus the changelog of marker
/// names whose elements were unbound since the last flush.
#[derive(Debug, Default)]
pub struct MarkerIndex {
    name_to_elements: FxHashMap<String, IndexSet<ViewNodeId>>,
    element_to_names: FxHashMap<ViewNodeId, IndexSet<String>>,
    unbound_names: IndexSet<String>,
}

impl MarkerIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `element` with the marker `name`.
    pub fn bind(&mut self, element: ViewNodeId, name: &str) {
        self.name_to_elements
            .entry(name.to_string())
            .or_default()
            .insert(element);
        self.element_to_names
            .entry(element)
            .or_default()
            .insert(name.to_string());
    }

    /// Remove the association between `element` and `name`. Unknown pairs are ignored.
    pub fn unbind(&mut self, element: ViewNodeId, name: &str) {
        if let Some(elements) = self.name_to_elements.get_mut(name) {
            elements.shift_remove(&element);
            if elements.is_empty() {
                self.name_to_elements.remove(name);
            }
        }
        if let Some(names) = self.element_to_names.get_mut(&element) {
            names.shift_remove(name);
            if names.is_empty() {
                self.element_to_names.remove(&element);
            }
        }
    }

    /// Elements associated with `name`; `None` once the last one is gone.
    pub fn elements(&self, name: &str) -> Option<&IndexSet<ViewNodeId>> {
        self.name_to_elements.get(name)
    }

    /// Marker names `element` is associated with.
    pub fn names(&self, element: ViewNodeId) -> Option<&IndexSet<String>> {
        self.element_to_names.get(&element)
    }

    /// Record every marker name of `element` in the changelog.
    pub fn mark_element_unbound(&mut self, element: ViewNodeId) {
        if let Some(names) = self.element_to_names.get(&element) {
            for name in names {
                self.unbound_names.insert(name.clone());
            }
        }
    }

    /// Drain the changelog, in first-touched order.
    pub fn flush_unbound_names(&mut self) -> Vec<String> {
        self.unbound_names.drain(..).collect()
    }

    /// Drop all associations and the changelog.
    pub fn clear(&mut self) {
        self.name_to_elements.clear();
        self.element_to_names.clear();
        self.unbound_names.clear();
    }
}
