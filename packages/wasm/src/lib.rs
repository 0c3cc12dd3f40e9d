//! Browser bindings for the Easel canvas.
//!
//! ```javascript
//! const canvas = new WasmCanvas(host, JSON.stringify(page), null);
//! canvas.setBounds("root", 0, 0, 800, 600);
//! canvas.setAttribute("title", "lang", "en");
//!
//! // the canvas never sleeps on its own: wake it when it asks
//! const tick = () => {
//!   canvas.advance();
//!   const ms = canvas.nextDeadlineMs();
//!   if (ms !== undefined) setTimeout(tick, ms);
//! };
//! tick();
//! ```
//!
//! See [`host`] for the shape of the host object.

pub mod host;
pub mod session;

use crate::host::JsHost;
use crate::session::{parse_config, BindingError, CanvasSession};
use easel_common::{Point, Rect};
use easel_editor::Canvas;
use wasm_bindgen::prelude::*;
use web_time::Instant;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(err: BindingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WasmCanvas {
    session: CanvasSession,
}

#[wasm_bindgen]
impl WasmCanvas {
    /// `host` may be `null`, which leaves synchronization off
    #[wasm_bindgen(constructor)]
    pub fn new(host: JsValue, canvas_json: Option<String>, config_json: Option<String>) -> Result<WasmCanvas, JsValue> {
        let config = parse_config(config_json.as_deref()).map_err(js_error)?;
        let mut builder = Canvas::builder(config);
        if host.is_object() {
            let host = JsHost::new(host);
            if host.has_store() {
                builder = builder.with_store(host.clone());
            }
            builder = builder.with_bridge(host);
        }
        let session = CanvasSession::open(builder, canvas_json.as_deref(), Instant::now()).map_err(js_error)?;
        Ok(WasmCanvas { session })
    }

    #[wasm_bindgen(js_name = isSyncEnabled)]
    pub fn is_sync_enabled(&self) -> bool {
        self.session.canvas().is_sync_enabled()
    }

    #[wasm_bindgen(js_name = setBounds)]
    pub fn set_bounds(&mut self, id: &str, x: f64, y: f64, width: f64, height: f64) -> Result<(), JsValue> {
        self.session
            .set_bounds(id, Rect::new(x, y, width, height))
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setAttribute)]
    pub fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> Result<(), JsValue> {
        self.session
            .set_attribute(id, name, value, Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeAttribute)]
    pub fn remove_attribute(&mut self, id: &str, name: &str) -> Result<(), JsValue> {
        self.session
            .remove_attribute(id, name, Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, id: &str, property: &str, value: &str) -> Result<(), JsValue> {
        self.session
            .set_style(id, property, value, Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, id: &str, text: &str) -> Result<(), JsValue> {
        self.session.set_text(id, text, Instant::now()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = appendElement)]
    pub fn append_element(&mut self, parent_id: &str, item_json: &str) -> Result<(), JsValue> {
        self.session
            .append_element(parent_id, item_json, Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeElement)]
    pub fn remove_element(&mut self, id: &str) -> Result<(), JsValue> {
        self.session.remove_element(id, Instant::now()).map_err(js_error)
    }

    /// Start dragging an existing element; `modifiers_json` like `{"alt":true}`
    #[wasm_bindgen(js_name = pointerDownElement)]
    pub fn pointer_down_element(&mut self, id: &str, x: f64, y: f64, modifiers_json: Option<String>) -> Result<(), JsValue> {
        self.session
            .pointer_down_element(id, Point::new(x, y), modifiers_json.as_deref(), Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerDownPalette)]
    pub fn pointer_down_palette(&mut self, item_json: &str, x: f64, y: f64) -> Result<(), JsValue> {
        self.session
            .pointer_down_palette(item_json, Point::new(x, y), Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.session
            .pointer_move(Point::new(x, y), Instant::now())
            .map_err(js_error)
    }

    /// Returns the committed drop as JSON, or `undefined`
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<Option<String>, JsValue> {
        self.session
            .pointer_up(Point::new(x, y), Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = cancelDrag)]
    pub fn cancel_drag(&mut self) -> Result<(), JsValue> {
        self.session.cancel_drag(Instant::now()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = requestDropAtPoint)]
    pub fn request_drop_at_point(&mut self, item_json: &str, x: f64, y: f64) -> Result<bool, JsValue> {
        self.session
            .request_drop_at_point(item_json, Point::new(x, y), Instant::now())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = ackSuccess)]
    pub fn ack_success(&mut self) -> Result<(), JsValue> {
        self.session.ack_success(Instant::now()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = ackFailure)]
    pub fn ack_failure(&mut self) -> Result<(), JsValue> {
        self.session.ack_failure(Instant::now()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = retriggerSync)]
    pub fn retrigger_sync(&mut self) -> Result<(), JsValue> {
        self.session.retrigger_sync(Instant::now()).map_err(js_error)
    }

    /// Fire every timer that is due
    pub fn advance(&mut self) -> Result<(), JsValue> {
        self.session.advance(Instant::now()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.session.next_deadline_ms(Instant::now())
    }

    /// Drain queued editor events as a JSON array
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        self.session.take_events_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = syncState)]
    pub fn sync_state(&self) -> String {
        self.session.sync_state()
    }

    pub fn serialize(&mut self) -> Result<String, JsValue> {
        self.session.serialize_json().map_err(js_error)
    }
}
