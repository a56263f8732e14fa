use thiserror::Error;

use crate::model::ModelNodeId;
use crate::view::ViewNodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while translating positions between the model and the view.
///
/// Every variant describes a bug in the calling converter (unbound ancestry, stale handles,
/// out-of-range offsets), not a data condition an end user can trigger.
pub enum MappingError {
    #[error("no mapped view ancestor for position in {0:?}")]
    /// Walking up from a view position never reached a bound view element.
    NoMappedViewAncestor(ViewNodeId),

    #[error("no mapped model ancestor for position in {0:?}")]
    /// Walking up from a model position never reached a bound model element.
    NoMappedModelAncestor(ModelNodeId),

    #[error("model position parent {0:?} is not an element")]
    /// Model positions must be anchored in elements.
    InvalidModelParent(ModelNodeId),

    #[error("model node {0:?} does not exist")]
    /// The model handle is stale or was never issued by this tree.
    UnknownModelNode(ModelNodeId),

    #[error("view node {0:?} does not exist")]
    /// The view handle is stale or was never issued by this tree.
    UnknownViewNode(ViewNodeId),

    #[error("offset {offset} is out of bounds (max {max})")]
    /// A position offset exceeds its parent's size.
    OffsetOutOfBounds {
        /// Requested offset.
        offset: usize,
        /// Largest valid offset in the parent.
        max: usize,
    },

    #[error("model offset {model_offset} is past the mapped content ({length})")]
    /// The container's content is shorter than the requested offset.
    PositionPastContent {
        /// Requested offset, in model units relative to the mapped container.
        model_offset: usize,
        /// Length the walk actually found.
        length: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by structural edits on [`ModelTree`](crate::ModelTree) and
/// [`ViewTree`](crate::ViewTree).
pub enum TreeError {
    #[error("stale node handle")]
    /// A handle refers to a destroyed node.
    StaleNode,

    #[error("node is not an element")]
    /// Children were requested from a text node.
    NotAnElement,

    #[error("node is not a text node")]
    /// Text data was set on an element.
    NotText,

    #[error("index {index} is out of bounds (len {len})")]
    /// Child index past the end of the children list.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Current number of children.
        len: usize,
    },

    #[error("node already has a parent")]
    /// Inserting a node that is still attached somewhere else.
    AlreadyAttached,

    #[error("insertion would create a cycle")]
    /// Inserting a node into its own subtree.
    WouldCreateCycle,
}
