//! # Easel Editor
//!
//! The canvas orchestrator: one owner for the live tree, the change
//! detector, the sync transport, the drag controller and their timers.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ easel-tree: live tree, journal, snapshots   │
//! └─────────────────────────────────────────────┘
//!          ↓                         ↓
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ easel-sync           │  │ easel-drag           │
//! │  detect, submit,     │  │  session, zones,     │
//! │  retry, rollback     │  │  scoring, execute    │
//! └──────────────────────┘  └──────────────────────┘
//!          ↓                         ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Canvas + Scheduler<TimerKind>       │
//! │  - carries out sync actions / drag effects  │
//! │  - HostBridge, SnapshotStore, events        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use easel_editor::{Canvas, EditorConfig};
//!
//! let mut canvas = Canvas::builder(EditorConfig::load(".")?)
//!     .with_bridge(host)
//!     .build(now)?;
//!
//! canvas.edit(now, |tree| tree.set_attribute(node, "title", "Hi"))??;
//! canvas.advance(now + Duration::from_millis(150))?; // submits
//! canvas.ack_success(later)?;
//! ```

mod canvas;
mod config;
#[cfg(feature = "runtime")]
pub mod driver;
mod errors;
mod events;

pub use canvas::{Canvas, CanvasBuilder, TimerKind};
pub use config::{ConfigError, EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::EditorError;
pub use events::EditorEvent;

#[cfg(feature = "runtime")]
pub use driver::{run, CanvasCommand};
