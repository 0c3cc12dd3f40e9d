//! # Easel Drag
//!
//! Pointer-driven drag and drop on the visual tree.
//!
//! ```text
//! pointer down ─▶ classify ─▶ DragController ─▶ zones ─▶ score/rank ─▶ select
//!                                   │                                    │
//!                                   └──── release ─▶ execute(drop) ◀─────┘
//! ```
//!
//! Components never read a clock; each input carries `now` and timer needs
//! come back as effects.

mod classifier;
mod config;
mod errors;
mod executor;
mod feedback;
mod scoring;
mod session;
mod velocity;
mod zones;

pub use classifier::{
    classify, classify_source, source_for, Classification, DragMode, DragSource, Modifiers,
    PaletteItem, SourceKind,
};
pub use config::{DragConfig, ZoneConfig};
pub use errors::{DragError, DropError, InvalidReason};
pub use executor::{content_index, execute, DropCommit, DropPayload};
pub use feedback::{DragFeedback, IndicatorFeedback, NoFeedback};
pub use scoring::{
    container_score, directional_score, proximity, rank_zones, score_zones, select_zone,
    ZoneResolution,
};
pub use session::{CancelReason, DragController, DragEffect, DragSession, DragState, DropRequest};
pub use velocity::VelocityTracker;
pub use zones::{candidates, generate_zones, validate_target, Direction, DropZone, ZoneQuery, ZoneType};
