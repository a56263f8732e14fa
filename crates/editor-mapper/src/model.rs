//! Model tree: the semantic side of the document.
//!
//! Offsets inside a model element are measured in *offset size*: a text node occupies one unit
//! per `char`, an element occupies exactly one unit. A model position is always anchored in an
//! element, never inside a text node.

use std::fmt;

use crate::arena::{Arena, RawId};
use crate::error::TreeError;

/// Stable handle of a node in a [`ModelTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelNodeId(RawId);

impl fmt::Debug for ModelNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelNodeId({:?})", self.0)
    }
}

/// A point in the model: an element plus an offset measured in offset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelPosition {
    /// Element the position is anchored in.
    pub parent: ModelNodeId,
    /// Offset inside `parent`.
    pub offset: usize,
}

impl ModelPosition {
    /// Create a position at `offset` inside `parent`.
    pub fn new(parent: ModelNodeId, offset: usize) -> Self {
        Self { parent, offset }
    }
}

/// A pair of model positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelRange {
    /// Range start.
    pub start: ModelPosition,
    /// Range end.
    pub end: ModelPosition,
}

impl ModelRange {
    /// Create a range from two positions.
    pub fn new(start: ModelPosition, end: ModelPosition) -> Self {
        Self { start, end }
    }

    /// Create a collapsed range at `position`.
    pub fn collapsed(position: ModelPosition) -> Self {
        Self::new(position, position)
    }
}

#[derive(Debug)]
enum ModelNodeData {
    Element {
        name: String,
        children: Vec<ModelNodeId>,
    },
    Text {
        data: String,
    },
}

#[derive(Debug)]
struct ModelNode {
    parent: Option<ModelNodeId>,
    data: ModelNodeData,
}

/// Arena-backed model tree.
///
/// Elements created without a parent act as roots. Removing a node only detaches it, so it can
/// be re-inserted elsewhere; [`destroy`](Self::destroy) frees a detached subtree for good.
pub struct ModelTree {
    nodes: Arena<ModelNode>,
}

impl ModelTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> ModelNodeId {
        ModelNodeId(self.nodes.insert(ModelNode {
            parent: None,
            data: ModelNodeData::Element {
                name: name.into(),
                children: Vec::new(),
            },
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: impl Into<String>) -> ModelNodeId {
        ModelNodeId(self.nodes.insert(ModelNode {
            parent: None,
            data: ModelNodeData::Text { data: data.into() },
        }))
    }

    /// Insert a detached `node` as child number `index` of `parent`.
    pub fn insert(
        &mut self,
        parent: ModelNodeId,
        index: usize,
        node: ModelNodeId,
    ) -> Result<(), TreeError> {
        let attached = self.nodes.get(node.0).ok_or(TreeError::StaleNode)?.parent;
        if attached.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        if self.is_ancestor_or_self(node, parent) {
            return Err(TreeError::WouldCreateCycle);
        }

        match &mut self.nodes.get_mut(parent.0).ok_or(TreeError::StaleNode)?.data {
            ModelNodeData::Element { children, .. } => {
                if index > children.len() {
                    return Err(TreeError::IndexOutOfBounds {
                        index,
                        len: children.len(),
                    });
                }
                children.insert(index, node);
            }
            ModelNodeData::Text { .. } => return Err(TreeError::NotAnElement),
        }

        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.parent = Some(parent);
        }
        Ok(())
    }

    /// Append a detached `node` at the end of `parent`.
    pub fn append(&mut self, parent: ModelNodeId, node: ModelNodeId) -> Result<(), TreeError> {
        let index = self.child_count(parent);
        self.insert(parent, index, node)
    }

    /// Detach `node` from its parent, returning the index it had there.
    ///
    /// Detaching a node without a parent is a no-op and returns `Ok(None)`.
    pub fn remove(&mut self, node: ModelNodeId) -> Result<Option<usize>, TreeError> {
        let parent = self.nodes.get(node.0).ok_or(TreeError::StaleNode)?.parent;
        let Some(parent) = parent else {
            return Ok(None);
        };

        let mut removed_at = None;
        if let Some(ModelNode {
            data: ModelNodeData::Element { children, .. },
            ..
        }) = self.nodes.get_mut(parent.0)
            && let Some(index) = children.iter().position(|&child| child == node)
        {
            children.remove(index);
            removed_at = Some(index);
        }

        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.parent = None;
        }
        Ok(removed_at)
    }

    /// Detach `node` and free it together with its whole subtree.
    pub fn destroy(&mut self, node: ModelNodeId) -> Result<(), TreeError> {
        self.remove(node)?;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(ModelNode {
                data: ModelNodeData::Element { children, .. },
                ..
            }) = self.nodes.remove(current.0)
            {
                stack.extend(children);
            }
        }
        Ok(())
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, node: ModelNodeId, data: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.nodes.get_mut(node.0).ok_or(TreeError::StaleNode)?.data {
            ModelNodeData::Text { data: current } => {
                *current = data.into();
                Ok(())
            }
            ModelNodeData::Element { .. } => Err(TreeError::NotText),
        }
    }

    /// Whether `node` refers to a live node of this tree.
    pub fn contains(&self, node: ModelNodeId) -> bool {
        self.nodes.contains(node.0)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parent of `node`, if attached.
    pub fn parent(&self, node: ModelNodeId) -> Option<ModelNodeId> {
        self.nodes.get(node.0)?.parent
    }

    /// Children of `node` (empty for text nodes and stale handles).
    pub fn children(&self, node: ModelNodeId) -> &[ModelNodeId] {
        match self.nodes.get(node.0).map(|entry| &entry.data) {
            Some(ModelNodeData::Element { children, .. }) => children,
            _ => &[],
        }
    }

    /// Number of children of `node`.
    pub fn child_count(&self, node: ModelNodeId) -> usize {
        self.children(node).len()
    }

    /// Index of `node` among its parent's children.
    pub fn index_of(&self, node: ModelNodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    /// Element name, `None` for text nodes.
    pub fn name(&self, node: ModelNodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            ModelNodeData::Element { name, .. } => Some(name),
            ModelNodeData::Text { .. } => None,
        }
    }

    /// Text data, `None` for elements.
    pub fn text(&self, node: ModelNodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            ModelNodeData::Text { data } => Some(data),
            ModelNodeData::Element { .. } => None,
        }
    }

    /// Whether `node` is a live text node.
    pub fn is_text(&self, node: ModelNodeId) -> bool {
        self.text(node).is_some()
    }

    /// Whether `node` is a live element.
    pub fn is_element(&self, node: ModelNodeId) -> bool {
        self.name(node).is_some()
    }

    /// Units `node` occupies inside its parent: `char` count for text, 1 for elements.
    pub fn offset_size(&self, node: ModelNodeId) -> usize {
        match self.nodes.get(node.0).map(|entry| &entry.data) {
            Some(ModelNodeData::Text { data }) => data.chars().count(),
            Some(ModelNodeData::Element { .. }) => 1,
            None => 0,
        }
    }

    /// Largest valid offset inside `element`.
    pub fn max_offset(&self, element: ModelNodeId) -> Option<usize> {
        if !self.is_element(element) {
            return None;
        }
        Some(
            self.children(element)
                .iter()
                .map(|&child| self.offset_size(child))
                .sum(),
        )
    }

    /// Offset at which `node` starts inside its parent.
    pub fn start_offset(&self, node: ModelNodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        let mut offset = 0;
        for &child in self.children(parent) {
            if child == node {
                return Some(offset);
            }
            offset += self.offset_size(child);
        }
        None
    }

    /// Position right before `node`.
    pub fn position_before(&self, node: ModelNodeId) -> Option<ModelPosition> {
        Some(ModelPosition::new(self.parent(node)?, self.start_offset(node)?))
    }

    /// Position right after `node`.
    pub fn position_after(&self, node: ModelNodeId) -> Option<ModelPosition> {
        let before = self.position_before(node)?;
        Some(ModelPosition::new(
            before.parent,
            before.offset + self.offset_size(node),
        ))
    }

    fn is_ancestor_or_self(&self, ancestor: ModelNodeId, node: ModelNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

impl fmt::Debug for ModelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTree").field("len", &self.len()).finish()
    }
}

impl Default for ModelTree {
    fn default() -> Self {
        Self::new()
    }
}
