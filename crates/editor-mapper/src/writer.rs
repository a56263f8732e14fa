//! View edits that keep the mapping cache consistent.
//!
//! [`ViewWriter`] borrows the view tree and the mapper together and reports every change to
//! the mapper right before applying it, while the old structure can still be compared in
//! document order.

use std::ops::Range;

use crate::error::TreeError;
use crate::mapper::{Mapper, UnbindOptions};
use crate::model::ModelNodeId;
use crate::text::char_to_byte;
use crate::view::{ViewChange, ViewNodeId, ViewTree};

/// Mutating access to a [`ViewTree`] that notifies a [`Mapper`].
#[derive(Debug)]
pub struct ViewWriter<'a> {
    view: &'a mut ViewTree,
    mapper: &'a mut Mapper,
}

impl<'a> ViewWriter<'a> {
    /// Borrow `view` and `mapper` for a batch of edits.
    pub fn new(view: &'a mut ViewTree, mapper: &'a mut Mapper) -> Self {
        Self { view, mapper }
    }

    /// The tree being edited.
    pub fn view(&self) -> &ViewTree {
        &*self.view
    }

    /// The notified mapper.
    pub fn mapper(&self) -> &Mapper {
        &*self.mapper
    }

    /// Insert a detached `node` as child number `index` of `parent`.
    pub fn insert(
        &mut self,
        parent: ViewNodeId,
        index: usize,
        node: ViewNodeId,
    ) -> Result<(), TreeError> {
        self.mapper
            .handle_view_change(self.view, ViewChange::Children { parent, index });
        self.view.insert(parent, index, node)
    }

    /// Append a detached `node` at the end of `parent`.
    pub fn append(&mut self, parent: ViewNodeId, node: ViewNodeId) -> Result<(), TreeError> {
        let index = self.view.child_count(parent);
        self.insert(parent, index, node)
    }

    /// Detach `node` from its parent.
    pub fn remove(&mut self, node: ViewNodeId) -> Result<Option<usize>, TreeError> {
        if let Some(parent) = self.view.parent(node)
            && let Some(index) = self.view.index_of(node)
        {
            self.mapper
                .handle_view_change(self.view, ViewChange::Children { parent, index });
        }
        self.view.remove(node)
    }

    /// Move `node` to child number `index` of `parent` (index in the tree after removal).
    pub fn move_node(
        &mut self,
        node: ViewNodeId,
        parent: ViewNodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        self.remove(node)?;
        self.insert(parent, index, node)
    }

    /// Detach `node` and free its subtree.
    pub fn destroy(&mut self, node: ViewNodeId) -> Result<(), TreeError> {
        self.remove(node)?;
        self.view.destroy(node)
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, node: ViewNodeId, data: impl Into<String>) -> Result<(), TreeError> {
        if !self.view.is_text(node) {
            return Err(if self.view.contains(node) {
                TreeError::NotText
            } else {
                TreeError::StaleNode
            });
        }
        self.mapper
            .handle_view_change(self.view, ViewChange::Text { node });
        self.view.set_text(node, data)
    }

    /// Insert `insertion` at `char` offset `offset` of a text node.
    pub fn insert_text(
        &mut self,
        node: ViewNodeId,
        offset: usize,
        insertion: &str,
    ) -> Result<(), TreeError> {
        let current = self.text_of(node)?;
        let byte = char_to_byte(current, offset).ok_or(TreeError::IndexOutOfBounds {
            index: offset,
            len: current.chars().count(),
        })?;

        let mut data = String::with_capacity(current.len() + insertion.len());
        data.push_str(&current[..byte]);
        data.push_str(insertion);
        data.push_str(&current[byte..]);
        self.set_text(node, data)
    }

    /// Remove the `char` range `range` of a text node.
    pub fn remove_text(&mut self, node: ViewNodeId, range: Range<usize>) -> Result<(), TreeError> {
        let current = self.text_of(node)?;
        let len = current.chars().count();
        let out_of_bounds = |index| TreeError::IndexOutOfBounds { index, len };
        if range.start > range.end {
            return Err(out_of_bounds(range.start));
        }
        let start = char_to_byte(current, range.start).ok_or(out_of_bounds(range.start))?;
        let end = char_to_byte(current, range.end).ok_or(out_of_bounds(range.end))?;

        let mut data = String::with_capacity(current.len() - (end - start));
        data.push_str(&current[..start]);
        data.push_str(&current[end..]);
        self.set_text(node, data)
    }

    /// Bind `model` to `view`, invalidating the enclosing container when `view` is already
    /// part of the tree.
    pub fn bind_elements(&mut self, model: ModelNodeId, view: ViewNodeId) {
        if let Some(parent) = self.view.parent(view)
            && let Some(index) = self.view.index_of(view)
        {
            self.mapper
                .handle_view_change(self.view, ViewChange::Children { parent, index });
        }
        self.mapper.bind_elements(model, view);
    }

    /// See [`Mapper::unbind_view_element`].
    pub fn unbind_view_element(&mut self, element: ViewNodeId, options: UnbindOptions) {
        self.mapper.unbind_view_element(self.view, element, options);
    }

    fn text_of(&self, node: ViewNodeId) -> Result<&str, TreeError> {
        match self.view.text(node) {
            Some(text) => Ok(text),
            None if self.view.contains(node) => Err(TreeError::NotText),
            None => Err(TreeError::StaleNode),
        }
    }
}
