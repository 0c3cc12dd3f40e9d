#![cfg(target_arch = "wasm32")]

use easel_wasm::WasmCanvas;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

const PAGE: &str = r#"{ "tag": "main", "id": "root", "children": [ { "tag": "h1", "id": "title" } ] }"#;

#[wasm_bindgen_test]
fn offline_canvas_edits_without_syncing() {
    let mut canvas = WasmCanvas::new(JsValue::NULL, Some(PAGE.to_string()), None).unwrap();
    assert!(!canvas.is_sync_enabled());

    canvas.set_attribute("title", "lang", "en").unwrap();
    assert_eq!(canvas.next_deadline_ms(), None);

    let snapshot = canvas.serialize().unwrap();
    assert!(snapshot.contains("\"lang\":\"en\""));
    assert!(canvas.take_events().unwrap().contains("bridgeUnavailable"));
}

#[wasm_bindgen_test]
fn host_receives_submission() {
    let host = js_sys::Object::new();
    let submit = js_sys::Function::new_with_args("json", "this.last = json;");
    js_sys::Reflect::set(&host, &"submitSnapshot".into(), &submit).unwrap();

    let mut canvas = WasmCanvas::new(host.clone().into(), Some(PAGE.to_string()), Some(r#"{"sync":{"debounceMs":1}}"#.to_string())).unwrap();
    canvas.set_attribute("title", "lang", "en").unwrap();
    assert!(canvas.next_deadline_ms().is_some());
}
