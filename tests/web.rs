//! Browser tests for the `MetonymStudio` handle
#![cfg(target_arch = "wasm32")]

use metonym_studio::{js_segment_text, version, MetonymStudio};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const RESPONSE: &str = r#"{
    "ast": {"name": "expression", "children": [
        {"name": "term", "value": "Bob"},
        {"name": "entity", "value": "name"}
    ]},
    "rasa": {"rasa_nlu_data": {"common_examples": [
        {"text": "Hi Bob", "intent": "greet",
         "entities": [{"start": 3, "end": 5, "value": "Bob", "entity": "name"}]}
    ]}}
}"#;

fn get(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

fn ticket_of(issued: &JsValue) -> u32 {
    get(issued, "ticket").as_f64().unwrap() as u32
}

#[wasm_bindgen_test]
fn test_version() {
    assert!(version().starts_with("metonym-studio"));
}

#[wasm_bindgen_test]
fn test_host_driven_request_cycle() {
    let studio = MetonymStudio::new(JsValue::NULL).unwrap();

    let issued = studio.js_begin_request("(Bob):name", "").unwrap();
    assert!(studio.js_is_busy());
    let request = get(&issued, "request");
    assert_eq!(get(&request, "intent").as_string().unwrap(), "intent");

    assert!(studio.js_complete_request(ticket_of(&issued), 200, RESPONSE.to_string()));

    let view = studio.js_view().unwrap();
    assert_eq!(get(&view, "phase").as_string().unwrap(), "succeeded");
    let tree = get(&view, "tree");
    assert_eq!(get(&tree, "tag").as_string().unwrap(), "name");

    assert_eq!(studio.js_sample(0.0).unwrap(), 0);
    assert_eq!(studio.js_sample(1.0).unwrap(), 1);
    assert_eq!(studio.js_add_to_output(), 1);
    assert!(studio.js_sample(2.0).is_err());
}

#[wasm_bindgen_test]
fn test_stale_ticket_and_unreachable() {
    let studio = MetonymStudio::new(JsValue::UNDEFINED).unwrap();
    let first = ticket_of(&studio.js_begin_request("a", "greet").unwrap());
    let second = ticket_of(&studio.js_begin_request("b", "greet").unwrap());

    assert!(!studio.js_complete_request(first, 200, RESPONSE.to_string()));
    assert!(studio.js_complete_request(second, 0, "Failed to fetch".to_string()));

    let view = studio.js_view().unwrap();
    assert_eq!(get(&view, "phase").as_string().unwrap(), "failed");

    let status = studio.js_get_status();
    assert_eq!(get(&status, "droppedResponses").as_f64().unwrap(), 1.0);
    assert_eq!(get(&status, "entropyDegraded").as_bool(), Some(false));
}

#[wasm_bindgen_test]
fn test_invalid_config_is_rejected() {
    let config = js_sys::JSON::parse(r#"{"maxTreeDepth": "deep"}"#).unwrap();
    assert!(MetonymStudio::new(config).is_err());
}

#[wasm_bindgen_test]
fn test_segment_text_binding() {
    let spans = js_sys::JSON::parse(r#"[{"start": 3, "end": 5, "entity": "name"}]"#).unwrap();
    let segments: js_sys::Array = js_segment_text("Hi Bob", spans).unwrap().into();
    assert_eq!(segments.length(), 2);

    let entity = segments.get(1);
    assert_eq!(get(&entity, "kind").as_string().unwrap(), "entity");
    assert_eq!(get(&entity, "text").as_string().unwrap(), "Bob");
    assert_eq!(get(&entity, "entityType").as_string().unwrap(), "name");

    let overlapping =
        js_sys::JSON::parse(r#"[{"start": 0, "end": 1, "entity": "a"}, {"start": 0, "end": 0, "entity": "b"}]"#)
            .unwrap();
    assert!(js_segment_text("ab", overlapping).is_err());
}

#[wasm_bindgen_test]
fn test_probability_label() {
    assert_eq!(MetonymStudio::js_probability_label(0.5), "0.50");
}
