//! # Async Driver
//!
//! Runs a [`Canvas`] on a tokio current-thread runtime. Host commands
//! arrive on a channel; between commands the driver sleeps until the
//! canvas's next timer deadline.
//!
//! ```text
//! CanvasCommand ──mpsc──▶ run() ──select!──▶ Canvas ──events──▶ mpsc
//!                           ▲
//!                           └── sleep_until(next_deadline)
//! ```
//!
//! The canvas is not `Send`, so `run` must be spawned with
//! `tokio::task::spawn_local` inside a `LocalSet`. Build the canvas with
//! `tokio::time::Instant::now().into_std()` so paused test clocks and the
//! canvas agree on time.

use crate::canvas::Canvas;
use crate::errors::EditorError;
use crate::events::EditorEvent;
use easel_common::Point;
use easel_drag::{DragSource, Modifiers, PaletteItem};
use easel_tree::{NodeKey, VisualTree};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub enum CanvasCommand {
    Edit(Box<dyn FnOnce(&mut VisualTree)>),
    AckSuccess,
    AckFailure,
    PointerDown {
        source: DragSource,
        modifiers: Modifiers,
        point: Point,
    },
    PointerMove(Point),
    PointerUp(Point),
    CancelDrag,
    RequestDrop {
        item: PaletteItem,
        point: Point,
    },
    RemoveElement(NodeKey),
    Retrigger,
    Shutdown,
}

impl CanvasCommand {
    pub fn edit(f: impl FnOnce(&mut VisualTree) + 'static) -> Self {
        CanvasCommand::Edit(Box::new(f))
    }
}

impl std::fmt::Debug for CanvasCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanvasCommand::Edit(_) => write!(f, "Edit"),
            CanvasCommand::AckSuccess => write!(f, "AckSuccess"),
            CanvasCommand::AckFailure => write!(f, "AckFailure"),
            CanvasCommand::PointerDown { point, .. } => write!(f, "PointerDown({:?})", point),
            CanvasCommand::PointerMove(point) => write!(f, "PointerMove({:?})", point),
            CanvasCommand::PointerUp(point) => write!(f, "PointerUp({:?})", point),
            CanvasCommand::CancelDrag => write!(f, "CancelDrag"),
            CanvasCommand::RequestDrop { item, point } => {
                write!(f, "RequestDrop({}, {:?})", item.tag, point)
            }
            CanvasCommand::RemoveElement(key) => write!(f, "RemoveElement({})", key),
            CanvasCommand::Retrigger => write!(f, "Retrigger"),
            CanvasCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}

fn handle(canvas: &mut Canvas, command: CanvasCommand) -> Result<(), EditorError> {
    let now = now();
    match command {
        CanvasCommand::Edit(f) => canvas.edit(now, f),
        CanvasCommand::AckSuccess => canvas.ack_success(now),
        CanvasCommand::AckFailure => canvas.ack_failure(now),
        CanvasCommand::PointerDown {
            source,
            modifiers,
            point,
        } => canvas.pointer_down(source, modifiers, point, now),
        CanvasCommand::PointerMove(point) => canvas.pointer_move(point, now),
        CanvasCommand::PointerUp(point) => canvas.pointer_up(point, now).map(|_| ()),
        CanvasCommand::CancelDrag => canvas.cancel_drag(now),
        CanvasCommand::RequestDrop { item, point } => {
            canvas.request_drop_at_point(item, point, now).map(|_| ())
        }
        CanvasCommand::RemoveElement(key) => canvas.remove_element(key, now),
        CanvasCommand::Retrigger => canvas.retrigger_sync(now),
        CanvasCommand::Shutdown => Ok(()),
    }
}

fn forward(canvas: &mut Canvas, events: &UnboundedSender<EditorEvent>) {
    for event in canvas.take_events() {
        if events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

/// Drive `canvas` until `Shutdown` or until every command sender is gone
///
/// Returns the canvas so the caller can inspect its final state.
pub async fn run(
    mut canvas: Canvas,
    mut commands: UnboundedReceiver<CanvasCommand>,
    events: UnboundedSender<EditorEvent>,
) -> Canvas {
    info!("Canvas driver started");
    loop {
        forward(&mut canvas, &events);
        let deadline = canvas.next_deadline();

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                if matches!(command, CanvasCommand::Shutdown) {
                    break;
                }
                debug!(?command, "Canvas command");
                if let Err(e) = handle(&mut canvas, command) {
                    warn!(error = %e, "Canvas command failed");
                }
            }
            _ = sleep_until(deadline) => {
                if let Err(e) = canvas.advance(now()) {
                    warn!(error = %e, "Timer handling failed");
                }
            }
        }
    }
    forward(&mut canvas, &events);
    info!("Canvas driver stopped");
    canvas
}
