//! # Drag Session State Machine
//!
//! ```text
//!          begin             displacement > threshold
//!   Idle ─────────▶ Ready ──────────────────────────▶ Dragging
//!    ▲               │ release (click)                  │ release
//!    │               ▼                                  ▼
//!    └──────────── Idle ◀────────── finish ───────── Dropping
//! ```
//!
//! Cancellation and the watchdog return to `Idle` from any state. The
//! controller owns no timers: it returns [`DragEffect`]s asking the caller
//! to arm or cancel the watchdog and frame timers, and to show or clear
//! feedback.
//!
//! Pointer samples arriving between frames overwrite each other; zones are
//! recomputed at most once per frame interval from the latest sample.

use crate::classifier::{classify_source, DragMode, DragSource, Modifiers};
use crate::config::{DragConfig, ZoneConfig};
use crate::errors::DragError;
use crate::scoring::score_zones;
use crate::velocity::VelocityTracker;
use crate::zones::{DropZone, ZoneQuery};
use easel_common::Point;
use easel_tree::{ContentFilter, NodeKey, VisualTree};
use tracing::{debug, info, warn};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Ready,
    Dragging,
    Dropping,
}

impl std::fmt::Display for DragState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragState::Idle => write!(f, "idle"),
            DragState::Ready => write!(f, "ready"),
            DragState::Dragging => write!(f, "dragging"),
            DragState::Dropping => write!(f, "dropping"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Cancel key or pointer-cancel
    User,
    /// No pointer activity within the watchdog interval
    Watchdog,
    /// Released with no valid target under the pointer
    NoTarget,
    /// The tree was rebuilt underneath the session
    Rollback,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::User => write!(f, "cancelled"),
            CancelReason::Watchdog => write!(f, "watchdog timeout"),
            CancelReason::NoTarget => write!(f, "no valid target"),
            CancelReason::Rollback => write!(f, "rollback"),
        }
    }
}

/// What a completed gesture asks the executor to do
#[derive(Debug, Clone, PartialEq)]
pub struct DropRequest {
    pub session_id: u64,
    pub source: DragSource,
    pub zone: DropZone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    ScheduleWatchdog(Instant),
    CancelWatchdog,
    ScheduleFrame(Instant),
    CancelFrame,
    Started { session_id: u64, mode: DragMode },
    ShowFeedback { zone: DropZone, auto_apply: bool },
    ClearFeedback,
    Drop(DropRequest),
    Cancelled { session_id: u64, reason: CancelReason },
}

#[derive(Debug, Clone)]
pub struct DragSession {
    pub id: u64,
    pub mode: DragMode,
    pub source: DragSource,
    pub start_point: Point,
    pub current_point: Point,
    pub state: DragState,
    /// Ranked zones of the last frame
    pub zone_candidates: Vec<DropZone>,
    pub selected_zone: Option<DropZone>,
    pub auto_apply: bool,
    pub start_time: Instant,
    pub last_activity: Instant,
}

impl DragSession {
    pub fn dragged_node(&self) -> Option<NodeKey> {
        match self.source {
            DragSource::Element(key) => Some(key),
            DragSource::Palette(_) => None,
        }
    }
}

pub struct DragController {
    config: DragConfig,
    zones: ZoneConfig,
    session: Option<DragSession>,
    velocity: VelocityTracker,
    next_session_id: u64,

    /// A sample arrived since the last zone computation
    pending_sample: bool,
    last_frame: Option<Instant>,
    frame_deadline: Option<Instant>,
}

impl DragController {
    pub fn new(config: DragConfig, zones: ZoneConfig) -> Self {
        let velocity = VelocityTracker::new(config.velocity_window());
        Self {
            config,
            zones,
            session: None,
            velocity,
            next_session_id: 1,
            pending_sample: false,
            last_frame: None,
            frame_deadline: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> DragState {
        self.session.as_ref().map_or(DragState::Idle, |s| s.state)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn watchdog_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .map(|s| s.last_activity + self.config.watchdog())
    }

    pub fn frame_deadline(&self) -> Option<Instant> {
        self.frame_deadline
    }

    /// Pointer down on a drag source
    pub fn begin(
        &mut self,
        tree: &VisualTree,
        filter: &ContentFilter,
        source: DragSource,
        modifiers: Modifiers,
        point: Point,
        now: Instant,
    ) -> Result<Vec<DragEffect>, DragError> {
        if self.session.is_some() {
            return Err(DragError::SessionActive);
        }

        let classification = classify_source(tree, filter, &source, modifiers);
        if classification.mode == DragMode::Disabled {
            debug!(?source, "Drag disabled for source");
            return Err(DragError::Disabled);
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        debug!(
            session = id,
            mode = %classification.mode,
            confidence = classification.confidence,
            "Drag session ready"
        );

        self.velocity.reset();
        self.velocity.push(now, point);
        self.pending_sample = false;
        self.last_frame = None;
        self.frame_deadline = None;
        self.session = Some(DragSession {
            id,
            mode: classification.mode,
            source,
            start_point: point,
            current_point: point,
            state: DragState::Ready,
            zone_candidates: Vec::new(),
            selected_zone: None,
            auto_apply: false,
            start_time: now,
            last_activity: now,
        });

        Ok(vec![DragEffect::ScheduleWatchdog(now + self.config.watchdog())])
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) -> Vec<DragEffect> {
        let threshold = match &self.session {
            Some(session) => self.config.threshold(session.mode),
            None => return Vec::new(),
        };
        let watchdog = now + self.config.watchdog();
        self.velocity.push(now, point);

        let mut effects = vec![DragEffect::ScheduleWatchdog(watchdog)];
        let Some(session) = self.session.as_mut() else {
            return effects;
        };
        session.current_point = point;
        session.last_activity = now;

        match session.state {
            DragState::Ready => {
                let displacement = session.start_point.distance(point);
                if displacement <= threshold {
                    return effects;
                }
                session.state = DragState::Dragging;
                info!(session = session.id, mode = %session.mode, displacement, "Drag started");
                effects.push(DragEffect::Started {
                    session_id: session.id,
                    mode: session.mode,
                });
            }
            DragState::Dragging => {}
            DragState::Idle | DragState::Dropping => return effects,
        }

        self.pending_sample = true;
        if self.frame_deadline.is_none() {
            let at = match self.last_frame {
                Some(last) => (last + self.config.frame_interval()).max(now),
                None => now,
            };
            self.frame_deadline = Some(at);
            effects.push(DragEffect::ScheduleFrame(at));
        }
        effects
    }

    /// Frame timer fired: recompute zones from the latest sample
    pub fn on_frame(&mut self, tree: &VisualTree, filter: &ContentFilter, now: Instant) -> Vec<DragEffect> {
        self.frame_deadline = None;
        if !self.pending_sample || self.state() != DragState::Dragging {
            return Vec::new();
        }
        self.pending_sample = false;
        self.last_frame = Some(now);
        self.recompute(tree, filter)
    }

    fn recompute(&mut self, tree: &VisualTree, filter: &ContentFilter) -> Vec<DragEffect> {
        let velocity = self.velocity.velocity();
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let query = ZoneQuery {
            dragged: session.dragged_node(),
            mode: session.mode,
            pointer: session.current_point,
            velocity,
        };
        let resolution = score_zones(tree, filter, &query, &self.zones);

        let changed = resolution.selected.as_ref().map(|z| &z.id)
            != session.selected_zone.as_ref().map(|z| &z.id)
            || resolution.auto_apply != session.auto_apply;

        session.zone_candidates = resolution.zones;
        session.selected_zone = resolution.selected;
        session.auto_apply = resolution.auto_apply;

        if !changed {
            return Vec::new();
        }
        match &session.selected_zone {
            Some(zone) => vec![DragEffect::ShowFeedback {
                zone: zone.clone(),
                auto_apply: session.auto_apply,
            }],
            None => vec![DragEffect::ClearFeedback],
        }
    }

    /// Pointer up
    ///
    /// A session that never passed its threshold ends as a plain click. A
    /// drag is resolved against the release point using current geometry.
    pub fn release(
        &mut self,
        tree: &VisualTree,
        filter: &ContentFilter,
        point: Point,
        now: Instant,
    ) -> Vec<DragEffect> {
        let Some(state) = self.session.as_ref().map(|s| s.state) else {
            return Vec::new();
        };

        match state {
            DragState::Ready => {
                debug!("Pointer released before drag threshold");
                self.end()
            }
            DragState::Dragging => {
                if let Some(session) = self.session.as_mut() {
                    session.current_point = point;
                    session.last_activity = now;
                }
                self.velocity.push(now, point);
                self.pending_sample = false;
                self.recompute(tree, filter);
                self.drop_selected()
            }
            DragState::Idle | DragState::Dropping => Vec::new(),
        }
    }

    fn drop_selected(&mut self) -> Vec<DragEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match session.selected_zone.clone() {
            Some(zone) => {
                session.state = DragState::Dropping;
                debug!(session = session.id, zone = %zone.id, "Dropping");
                vec![
                    DragEffect::ClearFeedback,
                    DragEffect::CancelFrame,
                    DragEffect::Drop(DropRequest {
                        session_id: session.id,
                        source: session.source.clone(),
                        zone,
                    }),
                ]
            }
            None => self.cancel(CancelReason::NoTarget),
        }
    }

    /// The executor finished (or rejected) the drop
    pub fn finish(&mut self) -> Vec<DragEffect> {
        if self.state() != DragState::Dropping {
            return Vec::new();
        }
        self.end()
    }

    fn end(&mut self) -> Vec<DragEffect> {
        self.session = None;
        self.pending_sample = false;
        self.frame_deadline = None;
        self.velocity.reset();
        vec![DragEffect::CancelWatchdog, DragEffect::CancelFrame]
    }

    /// Abort the session from any state; nothing is committed
    pub fn cancel(&mut self, reason: CancelReason) -> Vec<DragEffect> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let session_id = session.id;

        match reason {
            CancelReason::Watchdog => {
                warn!(session = session_id, "Drag session stalled, recovered by watchdog")
            }
            _ => debug!(session = session_id, %reason, "Drag cancelled"),
        }

        let mut effects = vec![DragEffect::ClearFeedback];
        effects.extend(self.end());
        effects.push(DragEffect::Cancelled { session_id, reason });
        effects
    }

    /// Watchdog timer fired
    pub fn check_watchdog(&mut self, now: Instant) -> Vec<DragEffect> {
        match self.watchdog_deadline() {
            Some(deadline) if deadline <= now => self.cancel(CancelReason::Watchdog),
            Some(deadline) => vec![DragEffect::ScheduleWatchdog(deadline)],
            None => Vec::new(),
        }
    }

    /// Begin and immediately drop at `point`, bypassing the threshold
    pub fn drop_at(
        &mut self,
        tree: &VisualTree,
        filter: &ContentFilter,
        source: DragSource,
        point: Point,
        now: Instant,
    ) -> Result<Vec<DragEffect>, DragError> {
        let mut effects = self.begin(tree, filter, source, Modifiers::NONE, point, now)?;
        if let Some(session) = self.session.as_mut() {
            session.state = DragState::Dragging;
        }
        effects.extend(self.release(tree, filter, point, now));
        Ok(effects)
    }
}
