//! Replay script format.
//!
//! ```json
//! {
//!   "canvas": { "tag": "main", "id": "root", "children": [ ... ] },
//!   "bounds": { "root": { "x": 0, "y": 0, "width": 800, "height": 600 } },
//!   "host": { "ackDelayMs": 50, "acks": ["timeout", "success"] },
//!   "steps": [
//!     { "at": 0, "action": "setAttribute", "target": "title", "name": "lang", "value": "en" },
//!     { "at": 400, "action": "pointerDown", "source": { "element": "card" }, "x": 10, "y": 10 }
//!   ]
//! }
//! ```
//!
//! Steps address elements by their id. `at` is milliseconds from the start
//! of the replay; steps run in order and must not go back in time.

use anyhow::{bail, Context, Result};
use easel_common::Rect;
use easel_drag::{Modifiers, PaletteItem};
use easel_editor::EditorConfig;
use easel_tree::Snapshot;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Overrides `easel.config.json` unless `--config` is given
    #[serde(default)]
    pub config: Option<EditorConfig>,

    /// Initial canvas; an empty `<main>` when absent
    #[serde(default)]
    pub canvas: Option<Snapshot>,

    /// Host-supplied geometry by element id
    #[serde(default)]
    pub bounds: BTreeMap<String, Rect>,

    /// Snapshot left unsynced by an earlier session
    #[serde(default)]
    pub pending: Option<Snapshot>,

    #[serde(default)]
    pub host: HostScript,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Keep the clock running this long after the last step
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_settle_ms() -> u64 {
    30_000
}

/// How the scripted host answers submissions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostScript {
    /// No bridge at all: sync stays disabled
    pub offline: bool,

    /// Delay between a submission and the host's answer
    pub ack_delay_ms: u64,

    /// Answers for successive submissions
    pub acks: Vec<AckReply>,

    /// Answer once `acks` is used up
    pub default_ack: AckReply,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            offline: false,
            ack_delay_ms: 50,
            acks: Vec::new(),
            default_ack: AckReply::Success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AckReply {
    Success,
    Failure,
    /// Never answer
    Timeout,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub at: u64,

    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptSource {
    Element(String),
    Palette(PaletteItem),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    SetAttribute {
        target: String,
        name: String,
        value: String,
    },
    RemoveAttribute {
        target: String,
        name: String,
    },
    AddClass {
        target: String,
        class: String,
    },
    RemoveClass {
        target: String,
        class: String,
    },
    SetStyle {
        target: String,
        property: String,
        value: String,
    },
    SetText {
        target: String,
        text: String,
    },
    AppendElement {
        parent: String,
        item: PaletteItem,
        #[serde(default)]
        id: Option<String>,
    },
    Remove {
        target: String,
    },
    SetBounds {
        target: String,
        bounds: Rect,
    },
    PointerDown {
        source: ScriptSource,
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    CancelDrag,
    RequestDrop {
        item: PaletteItem,
        x: f64,
        y: f64,
    },
    AckSuccess,
    AckFailure,
    Retrigger,
    /// Only move the clock
    Wait,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json).context("Malformed replay script")?;
        script.check()?;
        Ok(script)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Self::from_json(&content)
    }

    fn check(&self) -> Result<()> {
        let mut last = 0;
        for (i, step) in self.steps.iter().enumerate() {
            if step.at < last {
                bail!("Step {} at {}ms runs before the previous step ({}ms)", i + 1, step.at, last);
            }
            last = step.at;
        }
        if let Some(canvas) = &self.canvas {
            if canvas.as_element().is_none() {
                bail!("Canvas snapshot must be an element");
            }
        }
        Ok(())
    }

    /// Time of the last step
    pub fn duration_ms(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.at)
    }
}
