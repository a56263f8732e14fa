//! Length of view nodes measured in model units.

use rustc_hash::FxHashMap;

use crate::bindings::CorrespondenceTable;
use crate::view::{ViewElementKind, ViewNodeId, ViewTree};

/// Custom model length of view elements with a given name.
pub type ViewToModelLengthCallback = Box<dyn Fn(&ViewTree, ViewNodeId) -> usize + Send>;

/// Computes how many model offset units a view node covers.
///
/// Resolution order:
/// 1. a callback registered for the element name;
/// 2. text nodes measure their `char` count;
/// 3. UI elements measure 0;
/// 4. bound elements measure 1;
/// 5. any other element measures the sum of its children.
#[derive(Default)]
pub struct LengthResolver {
    callbacks: FxHashMap<String, ViewToModelLengthCallback>,
}

impl LengthResolver {
    /// Create a resolver without callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the callback for elements named `name`.
    pub fn register(&mut self, name: impl Into<String>, callback: ViewToModelLengthCallback) {
        self.callbacks.insert(name.into(), callback);
    }

    /// Whether any callback is registered.
    pub fn has_callbacks(&self) -> bool {
        !self.callbacks.is_empty()
    }

    /// Model length of `node`.
    pub fn length(&self, view: &ViewTree, bindings: &CorrespondenceTable, node: ViewNodeId) -> usize {
        let mut length = 0;
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if let Some(callback) = self.callback_for(view, current) {
                length += callback(view, current);
            } else if let Some(text_len) = view.text_len(current) {
                length += text_len;
            } else if view.kind(current) == Some(ViewElementKind::Ui) {
                continue;
            } else if bindings.is_view_bound(current) {
                length += 1;
            } else {
                stack.extend_from_slice(view.children(current));
            }
        }

        length
    }

    fn callback_for(&self, view: &ViewTree, node: ViewNodeId) -> Option<&ViewToModelLengthCallback> {
        if self.callbacks.is_empty() {
            return None;
        }
        self.callbacks.get(view.name(node)?)
    }
}

impl std::fmt::Debug for LengthResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LengthResolver")
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}
