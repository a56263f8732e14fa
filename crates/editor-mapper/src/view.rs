//! View tree: the rendering side of the document.
//!
//! A view position is `(parent, offset)` where the offset is a child index when `parent` is an
//! element and a `char` offset when `parent` is a text node.

use std::cmp::Ordering;
use std::fmt;

use crate::arena::{Arena, RawId};
use crate::error::TreeError;

/// Stable handle of a node in a [`ViewTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewNodeId(RawId);

impl fmt::Debug for ViewNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewNodeId({:?})", self.0)
    }
}

/// Rendering role of a view element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewElementKind {
    /// Block-level element (paragraph, list item, ...).
    Container,
    /// Formatting wrapper (`<strong>`, `<a>`, ...).
    Attribute,
    /// Element without children (inline image, line break).
    Empty,
    /// UI-only element that renders nothing in model terms.
    Ui,
    /// Editable root or detached document fragment.
    Root,
}

/// A point in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewPosition {
    /// Element or text node the position is anchored in.
    pub parent: ViewNodeId,
    /// Child index (element parent) or `char` offset (text parent).
    pub offset: usize,
}

impl ViewPosition {
    /// Create a position at `offset` inside `parent`.
    pub fn new(parent: ViewNodeId, offset: usize) -> Self {
        Self { parent, offset }
    }
}

/// A pair of view positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewRange {
    /// Range start.
    pub start: ViewPosition,
    /// Range end.
    pub end: ViewPosition,
}

impl ViewRange {
    /// Create a range from two positions.
    pub fn new(start: ViewPosition, end: ViewPosition) -> Self {
        Self { start, end }
    }
}

/// Structural change about to be applied to a [`ViewTree`].
///
/// Changes are reported to the mapper *before* they are applied; see
/// [`Mapper::handle_view_change`](crate::Mapper::handle_view_change).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    /// Children of `parent` change at `index` (insertion or removal).
    Children {
        /// Element whose children list changes.
        parent: ViewNodeId,
        /// First affected child index.
        index: usize,
    },
    /// Data of the text node `node` changes.
    Text {
        /// The text node.
        node: ViewNodeId,
    },
}

#[derive(Debug)]
enum ViewNodeData {
    Element {
        name: String,
        kind: ViewElementKind,
        children: Vec<ViewNodeId>,
    },
    Text {
        data: String,
    },
}

#[derive(Debug)]
struct ViewNode {
    parent: Option<ViewNodeId>,
    data: ViewNodeData,
}

/// Arena-backed view tree.
///
/// Like [`ModelTree`](crate::ModelTree), removal only detaches: a detached node is the root of
/// its own subtree until it is inserted again or destroyed.
pub struct ViewTree {
    nodes: Arena<ViewNode>,
}

impl ViewTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
        }
    }

    /// Create an editable root (or a document fragment).
    pub fn create_root(&mut self, name: impl Into<String>) -> ViewNodeId {
        self.create_element(name, ViewElementKind::Root)
    }

    /// Create a detached container element.
    pub fn create_container(&mut self, name: impl Into<String>) -> ViewNodeId {
        self.create_element(name, ViewElementKind::Container)
    }

    /// Create a detached attribute (formatting) element.
    pub fn create_attribute(&mut self, name: impl Into<String>) -> ViewNodeId {
        self.create_element(name, ViewElementKind::Attribute)
    }

    /// Create a detached empty element.
    pub fn create_empty(&mut self, name: impl Into<String>) -> ViewNodeId {
        self.create_element(name, ViewElementKind::Empty)
    }

    /// Create a detached UI element.
    pub fn create_ui(&mut self, name: impl Into<String>) -> ViewNodeId {
        self.create_element(name, ViewElementKind::Ui)
    }

    /// Create a detached element of the given kind.
    pub fn create_element(&mut self, name: impl Into<String>, kind: ViewElementKind) -> ViewNodeId {
        ViewNodeId(self.nodes.insert(ViewNode {
            parent: None,
            data: ViewNodeData::Element {
                name: name.into(),
                kind,
                children: Vec::new(),
            },
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: impl Into<String>) -> ViewNodeId {
        ViewNodeId(self.nodes.insert(ViewNode {
            parent: None,
            data: ViewNodeData::Text { data: data.into() },
        }))
    }

    /// Insert a detached `node` as child number `index` of `parent`.
    pub fn insert(
        &mut self,
        parent: ViewNodeId,
        index: usize,
        node: ViewNodeId,
    ) -> Result<(), TreeError> {
        let attached = self.nodes.get(node.0).ok_or(TreeError::StaleNode)?.parent;
        if attached.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        if self.is_ancestor_or_self(node, parent) {
            return Err(TreeError::WouldCreateCycle);
        }

        match &mut self.nodes.get_mut(parent.0).ok_or(TreeError::StaleNode)?.data {
            ViewNodeData::Element { children, .. } => {
                if index > children.len() {
                    return Err(TreeError::IndexOutOfBounds {
                        index,
                        len: children.len(),
                    });
                }
                children.insert(index, node);
            }
            ViewNodeData::Text { .. } => return Err(TreeError::NotAnElement),
        }

        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.parent = Some(parent);
        }
        Ok(())
    }

    /// Append a detached `node` at the end of `parent`.
    pub fn append(&mut self, parent: ViewNodeId, node: ViewNodeId) -> Result<(), TreeError> {
        let index = self.child_count(parent);
        self.insert(parent, index, node)
    }

    /// Detach `node` from its parent, returning the index it had there.
    pub fn remove(&mut self, node: ViewNodeId) -> Result<Option<usize>, TreeError> {
        let parent = self.nodes.get(node.0).ok_or(TreeError::StaleNode)?.parent;
        let Some(parent) = parent else {
            return Ok(None);
        };

        let mut removed_at = None;
        if let Some(ViewNode {
            data: ViewNodeData::Element { children, .. },
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
    pub fn destroy(&mut self, node: ViewNodeId) -> Result<(), TreeError> {
        self.remove(node)?;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(ViewNode {
                data: ViewNodeData::Element { children, .. },
                ..
            }) = self.nodes.remove(current.0)
            {
                stack.extend(children);
            }
        }
        Ok(())
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, node: ViewNodeId, data: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.nodes.get_mut(node.0).ok_or(TreeError::StaleNode)?.data {
            ViewNodeData::Text { data: current } => {
                *current = data.into();
                Ok(())
            }
            ViewNodeData::Element { .. } => Err(TreeError::NotText),
        }
    }

    /// Whether `node` refers to a live node of this tree.
    pub fn contains(&self, node: ViewNodeId) -> bool {
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
    pub fn parent(&self, node: ViewNodeId) -> Option<ViewNodeId> {
        self.nodes.get(node.0)?.parent
    }

    /// Children of `node` (empty for text nodes and stale handles).
    pub fn children(&self, node: ViewNodeId) -> &[ViewNodeId] {
        match self.nodes.get(node.0).map(|entry| &entry.data) {
            Some(ViewNodeData::Element { children, .. }) => children,
            _ => &[],
        }
    }

    /// Child number `index` of `node`.
    pub fn child(&self, node: ViewNodeId, index: usize) -> Option<ViewNodeId> {
        self.children(node).get(index).copied()
    }

    /// Number of children of `node`.
    pub fn child_count(&self, node: ViewNodeId) -> usize {
        self.children(node).len()
    }

    /// Index of `node` among its parent's children.
    pub fn index_of(&self, node: ViewNodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    /// Topmost ancestor of `node` (the node itself when detached).
    pub fn root_of(&self, node: ViewNodeId) -> Option<ViewNodeId> {
        if !self.contains(node) {
            return None;
        }
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        Some(current)
    }

    /// Number of ancestors of `node`.
    pub fn depth(&self, node: ViewNodeId) -> usize {
        let mut depth = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Element name, `None` for text nodes.
    pub fn name(&self, node: ViewNodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            ViewNodeData::Element { name, .. } => Some(name),
            ViewNodeData::Text { .. } => None,
        }
    }

    /// Element kind, `None` for text nodes.
    pub fn kind(&self, node: ViewNodeId) -> Option<ViewElementKind> {
        match &self.nodes.get(node.0)?.data {
            ViewNodeData::Element { kind, .. } => Some(*kind),
            ViewNodeData::Text { .. } => None,
        }
    }

    /// Text data, `None` for elements.
    pub fn text(&self, node: ViewNodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            ViewNodeData::Text { data } => Some(data),
            ViewNodeData::Element { .. } => None,
        }
    }

    /// Whether `node` is a live text node.
    pub fn is_text(&self, node: ViewNodeId) -> bool {
        self.text(node).is_some()
    }

    /// Length of a text node in `char`s, `None` for elements.
    pub fn text_len(&self, node: ViewNodeId) -> Option<usize> {
        self.text(node).map(|data| data.chars().count())
    }

    /// Node right before `position` (always `None` inside text).
    pub fn node_before(&self, position: ViewPosition) -> Option<ViewNodeId> {
        if position.offset == 0 {
            return None;
        }
        self.child(position.parent, position.offset - 1)
    }

    /// Node right after `position` (always `None` inside text).
    pub fn node_after(&self, position: ViewPosition) -> Option<ViewNodeId> {
        self.child(position.parent, position.offset)
    }

    /// Position right before `node`.
    pub fn position_before(&self, node: ViewNodeId) -> Option<ViewPosition> {
        Some(ViewPosition::new(self.parent(node)?, self.index_of(node)?))
    }

    /// Position right after `node`.
    pub fn position_after(&self, node: ViewNodeId) -> Option<ViewPosition> {
        Some(ViewPosition::new(self.parent(node)?, self.index_of(node)? + 1))
    }

    /// Document order of two positions.
    ///
    /// Returns `None` when either position references a stale node or the positions live in
    /// different roots.
    pub fn compare_positions(&self, a: ViewPosition, b: ViewPosition) -> Option<Ordering> {
        let (root_a, path_a) = self.position_path(a)?;
        let (root_b, path_b) = self.position_path(b)?;
        if root_a != root_b {
            return None;
        }
        Some(path_a.cmp(&path_b))
    }

    /// Child indices from the root down to `position`, ending with the position's own offset.
    fn position_path(&self, position: ViewPosition) -> Option<(ViewNodeId, Vec<usize>)> {
        if !self.contains(position.parent) {
            return None;
        }
        let mut path = vec![position.offset];
        let mut current = position.parent;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_of(current)?);
            current = parent;
        }
        path.reverse();
        Some((current, path))
    }

    fn is_ancestor_or_self(&self, ancestor: ViewNodeId, node: ViewNodeId) -> bool {
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

impl fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTree").field("len", &self.len()).finish()
    }
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ViewTree, ViewNodeId, ViewNodeId, ViewNodeId, ViewNodeId) {
        // <root><p>ab<strong>cd</strong></p></root>
        let mut view = ViewTree::new();
        let root = view.create_root("main");
        let p = view.create_container("p");
        let ab = view.create_text("ab");
        let strong = view.create_attribute("strong");
        let cd = view.create_text("cd");
        view.append(root, p).unwrap();
        view.append(p, ab).unwrap();
        view.append(p, strong).unwrap();
        view.append(strong, cd).unwrap();
        (view, root, p, strong, cd)
    }

    #[test]
    fn test_compare_positions_follows_document_order() {
        let (view, root, p, strong, cd) = sample();

        let inside_text = ViewPosition::new(cd, 1);
        let inside_strong = ViewPosition::new(strong, 1);
        let before_strong = ViewPosition::new(p, 1);
        let after_p = ViewPosition::new(root, 1);

        assert_eq!(
            view.compare_positions(before_strong, inside_text),
            Some(Ordering::Less)
        );
        assert_eq!(
            view.compare_positions(inside_text, inside_strong),
            Some(Ordering::Less)
        );
        assert_eq!(
            view.compare_positions(after_p, inside_strong),
            Some(Ordering::Greater)
        );
        assert_eq!(
            view.compare_positions(before_strong, before_strong),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_detached_node_is_its_own_root() {
        let (mut view, root, p, strong, _) = sample();
        assert_eq!(view.root_of(strong), Some(root));
        assert_eq!(view.depth(strong), 2);

        assert_eq!(view.remove(strong), Ok(Some(1)));
        assert_eq!(view.root_of(strong), Some(strong));
        assert_eq!(
            view.compare_positions(ViewPosition::new(strong, 0), ViewPosition::new(p, 0)),
            None
        );
    }

    #[test]
    fn test_set_text_rejects_elements() {
        let (mut view, _, p, _, cd) = sample();
        assert_eq!(view.set_text(p, "x"), Err(TreeError::NotText));
        view.set_text(cd, "cdé").unwrap();
        assert_eq!(view.text_len(cd), Some(3));
    }
}
