#![warn(missing_docs)]
//! Editor Mapper - Model/View Position Mapping for Rich-Document Editors
//!
//! # Overview
//!
//! `editor-mapper` keeps the correspondence between a rich-text **model** tree (the data) and its
//! **view** tree (the rendering structure) and translates positions and ranges between them.
//! It owns neither tree; conversion code builds both and registers bindings as it goes.
//!
//! # Core Features
//!
//! - **Bindings**: model element ↔ view element, with deferred unbinding for re-rendered content
//! - **Marker Index**: marker name ↔ view elements, plus a changelog of markers whose elements were unbound
//! - **Position Translation**: model ↔ view in both directions, with priority-ordered override hooks
//! - **Length Rules**: view nodes measured in model units (text, UI elements, bound elements, custom callbacks)
//! - **Mapping Cache**: per-container anchors make repeated model → view lookups O(log n + k)
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Mapper (translation + hooks)               │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  ViewWriter (edits + change notifications)  │  ← Cache Consistency
//! ├─────────────────────────────────────────────┤
//! │  MappingCache (anchors per container)       │  ← Incremental Lookup
//! ├─────────────────────────────────────────────┤
//! │  Bindings / Markers / Length Rules          │  ← Correspondence
//! ├─────────────────────────────────────────────┤
//! │  ModelTree / ViewTree (arena handles)       │  ← Host Trees
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_mapper::{
//!     Mapper, ModelPosition, ModelTree, ToViewOptions, ViewPosition, ViewTree, ViewWriter,
//! };
//!
//! let mut model = ModelTree::new();
//! let mut view = ViewTree::new();
//! let mut mapper = Mapper::new();
//!
//! // <paragraph>abc</paragraph>  ->  <p><strong>ab</strong>c</p>
//! let root = model.create_element("$root");
//! let paragraph = model.create_element("paragraph");
//! let abc = model.create_text("abc");
//! model.append(root, paragraph).unwrap();
//! model.append(paragraph, abc).unwrap();
//!
//! let view_root = view.create_root("div");
//! let p = view.create_container("p");
//! let strong = view.create_attribute("strong");
//! let ab = view.create_text("ab");
//! let c = view.create_text("c");
//! mapper.bind_elements(root, view_root);
//! mapper.bind_elements(paragraph, p);
//!
//! let mut writer = ViewWriter::new(&mut view, &mut mapper);
//! writer.append(view_root, p).unwrap();
//! writer.append(p, strong).unwrap();
//! writer.append(strong, ab).unwrap();
//! writer.append(p, c).unwrap();
//!
//! let position = mapper
//!     .to_view_position(&model, &view, ModelPosition::new(paragraph, 1), ToViewOptions::default())
//!     .unwrap();
//! assert_eq!(position, ViewPosition::new(ab, 1));
//!
//! let back = mapper.to_model_position(&model, &view, ViewPosition::new(c, 1)).unwrap();
//! assert_eq!(back, ModelPosition::new(paragraph, 3));
//! ```
//!
//! # Module Description
//!
//! - [`model`] - Model tree, positions and ranges
//! - [`view`] - View tree, element kinds and change notifications
//! - [`bindings`] - Model ↔ view element correspondence table
//! - [`markers`] - Marker name ↔ view element index
//! - [`length`] - View → model length rules
//! - [`cache`] - Incremental model → view mapping cache
//! - [`hooks`] - Override hooks for position resolution
//! - [`mapper`] - The [`Mapper`] facade
//! - [`writer`] - [`ViewWriter`], view edits that notify the mapper
//!
//! # Threading
//!
//! Everything is single-threaded. Handles are plain `Copy` values; the trees own the nodes.

mod arena;
pub mod bindings;
pub mod cache;
pub mod error;
pub mod hooks;
pub mod length;
pub mod mapper;
pub mod markers;
pub mod model;
mod text;
pub mod view;
pub mod writer;

pub use bindings::CorrespondenceTable;
pub use cache::{Anchor, CacheStats, MappingCache};
pub use error::{MappingError, TreeError};
pub use hooks::{
    ModelToViewHandler, ModelToViewPositionData, Priority, ResolveContext, ViewToModelHandler,
    ViewToModelPositionData,
};
pub use length::{LengthResolver, ViewToModelLengthCallback};
pub use mapper::{Mapper, MapperOptions, ToViewOptions, UnbindOptions};
pub use markers::MarkerIndex;
pub use model::{ModelNodeId, ModelPosition, ModelRange, ModelTree};
pub use view::{ViewChange, ViewElementKind, ViewNodeId, ViewPosition, ViewRange, ViewTree};
pub use writer::ViewWriter;
