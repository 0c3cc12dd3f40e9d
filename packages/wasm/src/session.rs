//! JSON-facing wrapper around [`Canvas`].
//!
//! Everything crossing the JS boundary is a JSON string or a scalar, and
//! elements are addressed by their `id` attribute. This layer holds no JS
//! types, so it runs under plain `cargo test`.

use easel_common::{Point, Rect};
use easel_drag::{DragSource, Modifiers, PaletteItem};
use easel_editor::{Canvas, CanvasBuilder, EditorConfig, EditorError};
use easel_tree::{rebuild_into, NodeKey, Snapshot, TreeError, VisualTree};
use thiserror::Error;
use web_time::Instant;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No element with id '{0}'")]
    UnknownElement(String),
}

pub type Result<T> = std::result::Result<T, BindingError>;

/// Config from JSON, or the defaults for `None` and blank input
pub fn parse_config(json: Option<&str>) -> Result<EditorConfig> {
    match json.map(str::trim) {
        None | Some("") => Ok(EditorConfig::default()),
        Some(json) => Ok(EditorConfig::from_json(json).map_err(EditorError::from)?),
    }
}

pub struct CanvasSession {
    canvas: Canvas,
}

impl CanvasSession {
    /// Build the canvas, mounting `canvas_json` under the root when given
    pub fn open(builder: CanvasBuilder, canvas_json: Option<&str>, now: Instant) -> Result<Self> {
        let mut tree = VisualTree::new("main");
        if let Some(json) = canvas_json {
            let snapshot: Snapshot = serde_json::from_str(json)?;
            let root = tree.root();
            rebuild_into(&mut tree, root, &snapshot)?;
        }
        let canvas = builder.with_tree(tree).build(now)?;
        Ok(Self { canvas })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn key(&self, id: &str) -> Result<NodeKey> {
        self.canvas
            .tree()
            .find_by_id(id)
            .ok_or_else(|| BindingError::UnknownElement(id.to_string()))
    }

    /// Geometry is not content: this never schedules a sync
    pub fn set_bounds(&mut self, id: &str, bounds: Rect) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.tree_mut().set_bounds(key, bounds)?;
        Ok(())
    }

    pub fn set_attribute(&mut self, id: &str, name: &str, value: &str, now: Instant) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.edit(now, |tree| tree.set_attribute(key, name, value))??;
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: &str, name: &str, now: Instant) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.edit(now, |tree| tree.remove_attribute(key, name))??;
        Ok(())
    }

    pub fn set_style(&mut self, id: &str, property: &str, value: &str, now: Instant) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.edit(now, |tree| tree.set_style(key, property, value))??;
        Ok(())
    }

    pub fn set_text(&mut self, id: &str, text: &str, now: Instant) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.edit(now, |tree| tree.set_text_content(key, text))??;
        Ok(())
    }

    /// Append a palette item as the last child of `parent_id`
    pub fn append_element(&mut self, parent_id: &str, item_json: &str, now: Instant) -> Result<()> {
        let parent = self.key(parent_id)?;
        let item: PaletteItem = serde_json::from_str(item_json)?;
        self.canvas.edit(now, |tree| {
            tree.batch(|tree| {
                let node = tree.create_element_with(item.element_data());
                if let Some(text) = &item.text {
                    let text = tree.create_text(text.clone());
                    tree.append_child(node, text)?;
                }
                tree.append_child(parent, node)
            })
        })??;
        Ok(())
    }

    pub fn remove_element(&mut self, id: &str, now: Instant) -> Result<()> {
        let key = self.key(id)?;
        self.canvas.remove_element(key, now)?;
        Ok(())
    }

    pub fn pointer_down_element(&mut self, id: &str, point: Point, modifiers_json: Option<&str>, now: Instant) -> Result<()> {
        let source = DragSource::Element(self.key(id)?);
        let modifiers = parse_modifiers(modifiers_json)?;
        self.canvas.pointer_down(source, modifiers, point, now)?;
        Ok(())
    }

    pub fn pointer_down_palette(&mut self, item_json: &str, point: Point, now: Instant) -> Result<()> {
        let item: PaletteItem = serde_json::from_str(item_json)?;
        self.canvas
            .pointer_down(DragSource::Palette(item), Modifiers::NONE, point, now)?;
        Ok(())
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) -> Result<()> {
        self.canvas.pointer_move(point, now)?;
        Ok(())
    }

    /// The committed drop as JSON, if the release dropped something
    pub fn pointer_up(&mut self, point: Point, now: Instant) -> Result<Option<String>> {
        match self.canvas.pointer_up(point, now)? {
            Some(commit) => Ok(Some(serde_json::to_string(&commit)?)),
            None => Ok(None),
        }
    }

    pub fn cancel_drag(&mut self, now: Instant) -> Result<()> {
        self.canvas.cancel_drag(now)?;
        Ok(())
    }

    pub fn request_drop_at_point(&mut self, item_json: &str, point: Point, now: Instant) -> Result<bool> {
        let item: PaletteItem = serde_json::from_str(item_json)?;
        Ok(self.canvas.request_drop_at_point(item, point, now)?)
    }

    pub fn ack_success(&mut self, now: Instant) -> Result<()> {
        self.canvas.ack_success(now)?;
        Ok(())
    }

    pub fn ack_failure(&mut self, now: Instant) -> Result<()> {
        self.canvas.ack_failure(now)?;
        Ok(())
    }

    pub fn retrigger_sync(&mut self, now: Instant) -> Result<()> {
        self.canvas.retrigger_sync(now)?;
        Ok(())
    }

    pub fn advance(&mut self, now: Instant) -> Result<()> {
        self.canvas.advance(now)?;
        Ok(())
    }

    /// Milliseconds until the next timer, for the host's `setTimeout`
    pub fn next_deadline_ms(&self, now: Instant) -> Option<f64> {
        self.canvas
            .next_deadline()
            .map(|at| at.saturating_duration_since(now).as_millis() as f64)
    }

    pub fn take_events_json(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.canvas.take_events())?)
    }

    pub fn sync_state(&self) -> String {
        self.canvas.sync_state().to_string()
    }

    pub fn serialize_json(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.canvas.serialize()?)?)
    }
}

fn parse_modifiers(json: Option<&str>) -> Result<Modifiers> {
    match json.map(str::trim) {
        None | Some("") => Ok(Modifiers::NONE),
        Some(json) => Ok(serde_json::from_str(json)?),
    }
}
