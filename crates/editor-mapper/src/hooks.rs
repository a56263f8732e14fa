//! Override hooks for position resolution.
//!
//! Features with irregular model/view correspondence (widgets, lists rendered as nested
//! structures, placeholders) register handlers that may resolve a position on their own.
//! Handlers run from highest to lowest priority, in registration order within one priority.
//! The first handler that fills the output wins; the default algorithm only runs when no
//! handler did.

use crate::Mapper;
use crate::model::{ModelPosition, ModelTree};
use crate::view::{ViewPosition, ViewTree};

/// Handler priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs last.
    Lowest,
    /// Runs after `Normal`.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Runs before `Normal`.
    High,
    /// Runs first.
    Highest,
}

/// Everything a handler may consult while resolving a position.
pub struct ResolveContext<'a> {
    /// The mapper running the resolution.
    pub mapper: &'a Mapper,
    /// Model tree the position belongs to (or is mapped into).
    pub model: &'a ModelTree,
    /// View tree the position belongs to (or is mapped into).
    pub view: &'a ViewTree,
}

/// In/out data of a model → view resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelToViewPositionData {
    /// Position being mapped.
    pub model_position: ModelPosition,
    /// Result; setting it stops further handlers and the default algorithm.
    pub view_position: Option<ViewPosition>,
    /// The model position may point at content that is no longer in the model.
    pub is_phantom: bool,
}

/// In/out data of a view → model resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewToModelPositionData {
    /// Position being mapped.
    pub view_position: ViewPosition,
    /// Result; setting it stops further handlers and the default algorithm.
    pub model_position: Option<ModelPosition>,
}

/// Handler for model → view resolution.
pub type ModelToViewHandler =
    Box<dyn Fn(&ResolveContext<'_>, &mut ModelToViewPositionData) + Send>;

/// Handler for view → model resolution.
pub type ViewToModelHandler =
    Box<dyn Fn(&ResolveContext<'_>, &mut ViewToModelPositionData) + Send>;

/// Handlers ordered by priority, then registration.
pub(crate) struct HookList<H> {
    entries: Vec<(Priority, H)>,
}

impl<H> HookList<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, priority: Priority, handler: H) {
        // Insert after every entry of equal or higher priority to keep registration order.
        let index = self
            .entries
            .partition_point(|(existing, _)| *existing >= priority);
        self.entries.insert(index, (priority, handler));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &H> {
        self.entries.iter().map(|(_, handler)| handler)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
