//! # Scripted Replay
//!
//! Drives a [`Canvas`] through a [`Script`] on a virtual clock, standing in
//! for the host: it records submissions and answers them after the
//! scripted delay.
//!
//! ```text
//!   steps ──┐
//!           ├─▶ earliest of (next step, next timer, next ack) ─▶ Canvas
//!   acks ───┤
//!  timers ──┘
//! ```
//!
//! Timers and acks due before a step run first, each at its own instant,
//! so event timestamps are exact.

use crate::script::{AckReply, Action, HostScript, Script, ScriptSource, Step};
use anyhow::{anyhow, Result};
use easel_common::Point;
use easel_drag::DragSource;
use easel_editor::{Canvas, EditorConfig, EditorEvent};
use easel_sync::{MemoryStore, RecordingBridge, SyncState};
use easel_tree::{rebuild_into, IdGenerator, NodeKey, Snapshot, VisualTree};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One line of replay output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: EditorEvent,
}

/// A step the canvas refused
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepError {
    pub at_ms: u64,
    pub step: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub events: Vec<TimedEvent>,
    pub errors: Vec<StepError>,
    pub submissions: usize,
    pub final_state: SyncState,
    pub final_snapshot: Snapshot,
    pub elapsed_ms: u64,
}

enum Next {
    Step,
    Timer(Instant),
    Ack(Instant, AckReply),
}

pub struct Replay {
    canvas: Canvas,
    bridge: Option<Rc<RefCell<RecordingBridge>>>,
    host: HostScript,
    start: Instant,
    acks: VecDeque<(Instant, AckReply)>,
    answered: usize,
    events: Vec<TimedEvent>,
    errors: Vec<StepError>,
}

impl Replay {
    pub fn new(script: &Script, config: EditorConfig) -> Result<Self> {
        let start = Instant::now();
        let tree = initial_tree(script)?;

        let mut store = MemoryStore::new();
        if let Some(pending) = &script.pending {
            store = MemoryStore::with_pending(pending.clone());
        }

        let mut builder = Canvas::builder(config)
            .with_tree(tree)
            .with_ids(IdGenerator::from_parts("el", "replay"))
            .with_store(store);
        let bridge = if script.host.offline {
            None
        } else {
            let bridge = Rc::new(RefCell::new(RecordingBridge::new()));
            builder = builder.with_bridge(bridge.clone());
            Some(bridge)
        };

        let canvas = builder.build(start)?;
        let mut replay = Self {
            canvas,
            bridge,
            host: script.host.clone(),
            start,
            acks: VecDeque::new(),
            answered: 0,
            events: Vec::new(),
            errors: Vec::new(),
        };
        replay.collect(start);
        Ok(replay)
    }

    pub fn run(mut self, script: &Script) -> Result<ReplayReport> {
        for (i, step) in script.steps.iter().enumerate() {
            let at = self.start + Duration::from_millis(step.at);
            self.run_until(at)?;
            if let Err(e) = self.apply(step, at) {
                warn!(step = i + 1, error = %e, "Replay step failed");
                self.errors.push(StepError {
                    at_ms: step.at,
                    step: i + 1,
                    message: e.to_string(),
                });
            }
            self.collect(at);
        }

        let end = self.start + Duration::from_millis(script.duration_ms() + script.settle_ms);
        self.run_until(end)?;

        let final_snapshot = self.canvas.serialize()?;
        let elapsed_ms = self.ms(self.last_activity().unwrap_or(self.start));
        Ok(ReplayReport {
            submissions: self.submissions(),
            final_state: self.canvas.sync_state(),
            final_snapshot,
            events: self.events,
            errors: self.errors,
            elapsed_ms,
        })
    }

    fn last_activity(&self) -> Option<Instant> {
        self.events
            .last()
            .map(|e| self.start + Duration::from_millis(e.at_ms))
    }

    fn ms(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.start).as_millis() as u64
    }

    fn submissions(&self) -> usize {
        self.bridge
            .as_ref()
            .map_or(0, |b| b.borrow().submitted.len())
    }

    /// Fire timers and host answers up to and including `until`
    fn run_until(&mut self, until: Instant) -> Result<()> {
        loop {
            let timer = self.canvas.next_deadline().filter(|at| *at <= until);
            let ack = self.acks.front().copied().filter(|(at, _)| *at <= until);

            let next = match (timer, ack) {
                (Some(t), Some((a, reply))) if a <= t => Next::Ack(a, reply),
                (Some(t), _) => Next::Timer(t),
                (None, Some((a, reply))) => Next::Ack(a, reply),
                (None, None) => Next::Step,
            };

            match next {
                Next::Step => break,
                Next::Timer(at) => {
                    self.canvas.advance(at)?;
                    self.collect(at);
                }
                Next::Ack(at, reply) => {
                    self.acks.pop_front();
                    debug!(at_ms = self.ms(at), ?reply, "Host answers");
                    match reply {
                        AckReply::Success => self.canvas.ack_success(at)?,
                        AckReply::Failure => self.canvas.ack_failure(at)?,
                        AckReply::Timeout => {}
                    }
                    self.collect(at);
                }
            }
        }
        self.canvas.advance(until)?;
        self.collect(until);
        Ok(())
    }

    /// Drain canvas events and queue answers for new submissions
    fn collect(&mut self, at: Instant) {
        let at_ms = self.ms(at);
        for event in self.canvas.take_events() {
            self.events.push(TimedEvent { at_ms, event });
        }

        let submitted = self.submissions();
        while self.answered < submitted {
            let reply = self
                .host
                .acks
                .get(self.answered)
                .copied()
                .unwrap_or(self.host.default_ack);
            self.answered += 1;
            if reply != AckReply::Timeout {
                let answer_at = at + Duration::from_millis(self.host.ack_delay_ms);
                self.acks.push_back((answer_at, reply));
            }
        }
    }

    fn key(&self, id: &str) -> Result<NodeKey> {
        self.canvas
            .tree()
            .find_by_id(id)
            .ok_or_else(|| anyhow!("No element with id '{}'", id))
    }

    fn apply(&mut self, step: &Step, at: Instant) -> Result<()> {
        match &step.action {
            Action::SetAttribute { target, name, value } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.set_attribute(key, name, value.clone()))??;
            }
            Action::RemoveAttribute { target, name } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.remove_attribute(key, name))??;
            }
            Action::AddClass { target, class } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.add_class(key, class))??;
            }
            Action::RemoveClass { target, class } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.remove_class(key, class))??;
            }
            Action::SetStyle { target, property, value } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.set_style(key, property, value.clone()))??;
            }
            Action::SetText { target, text } => {
                let key = self.key(target)?;
                self.canvas.edit(at, |tree| tree.set_text_content(key, text.clone()))??;
            }
            Action::AppendElement { parent, item, id } => {
                let parent = self.key(parent)?;
                let mut data = item.element_data();
                data.id = id.clone();
                let text = item.text.clone();
                self.canvas.edit(at, |tree| {
                    tree.batch(|tree| {
                        let node = tree.create_element_with(data);
                        if let Some(text) = text {
                            let text = tree.create_text(text);
                            tree.append_child(node, text)?;
                        }
                        tree.append_child(parent, node)
                    })
                })??;
            }
            Action::Remove { target } => {
                let key = self.key(target)?;
                self.canvas.remove_element(key, at)?;
            }
            Action::SetBounds { target, bounds } => {
                let key = self.key(target)?;
                self.canvas.tree_mut().set_bounds(key, *bounds)?;
            }
            Action::PointerDown {
                source,
                x,
                y,
                modifiers,
            } => {
                let source = match source {
                    ScriptSource::Element(id) => DragSource::Element(self.key(id)?),
                    ScriptSource::Palette(item) => DragSource::Palette(item.clone()),
                };
                self.canvas.pointer_down(source, *modifiers, Point::new(*x, *y), at)?;
            }
            Action::PointerMove { x, y } => self.canvas.pointer_move(Point::new(*x, *y), at)?,
            Action::PointerUp { x, y } => {
                self.canvas.pointer_up(Point::new(*x, *y), at)?;
            }
            Action::CancelDrag => self.canvas.cancel_drag(at)?,
            Action::RequestDrop { item, x, y } => {
                if !self
                    .canvas
                    .request_drop_at_point(item.clone(), Point::new(*x, *y), at)?
                {
                    debug!("Requested drop found no target");
                }
            }
            Action::AckSuccess => self.canvas.ack_success(at)?,
            Action::AckFailure => self.canvas.ack_failure(at)?,
            Action::Retrigger => self.canvas.retrigger_sync(at)?,
            Action::Wait => self.canvas.advance(at)?,
        }
        Ok(())
    }
}

fn initial_tree(script: &Script) -> Result<VisualTree> {
    let mut tree = VisualTree::new("main");
    if let Some(canvas) = &script.canvas {
        let root = tree.root();
        rebuild_into(&mut tree, root, canvas)?;
    }
    for (id, bounds) in &script.bounds {
        let key = tree
            .find_by_id(id)
            .ok_or_else(|| anyhow!("Bounds given for unknown element '{}'", id))?;
        tree.set_bounds(key, *bounds)?;
    }
    Ok(tree)
}

/// Parse and replay in one go
pub fn replay(script: &Script, config: EditorConfig) -> Result<ReplayReport> {
    Replay::new(script, config)?.run(script)
}
