//! # Easel Tree
//!
//! The live visual tree of the canvas and its value-typed snapshots.
//!
//! ```text
//! VisualTree ──serialize──▶ Snapshot ──submit──▶ host
//!     ▲                        │
//!     └──────rebuild_into──────┘   (rollback / startup recovery)
//! ```
//!
//! The live tree is the single source of truth while editing. Snapshots are
//! derived from it and never authoritative until the host acknowledges them.

mod content;
mod error;
mod id_generator;
mod node;
mod rebuild;
mod serializer;
mod snapshot;
mod tree;
pub mod visitor;

pub use content::ContentFilter;
pub use error::TreeError;
pub use id_generator::{session_suffix, IdGenerator};
pub use node::{ElementData, LayoutMode, NodeKey, NodeKind, VisualNode, VOID_ELEMENTS};
pub use rebuild::{build_subtree, rebuild_into};
pub use serializer::{Serializer, SerializerConfig};
pub use snapshot::{ElementSnapshot, Snapshot, TextSnapshot};
pub use tree::{MutationBatch, MutationKind, MutationRecord, NodeTrace, VisualTree};
pub use visitor::{walk, VisitControl, Visitor};
