//! Browser transport: POST the request with `fetch`
//!
//! Every failure (no window, rejected fetch, unreadable body) is folded into
//! `TransportOutcome::Unreachable` so the controller sees one shape.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use super::protocol::{ParseRequest, TransportOutcome};

pub async fn post_parse(endpoint: &str, request: &ParseRequest) -> TransportOutcome {
    match send(endpoint, request).await {
        Ok(outcome) => outcome,
        Err(reason) => TransportOutcome::Unreachable { reason },
    }
}

async fn send(endpoint: &str, request: &ParseRequest) -> Result<TransportOutcome, String> {
    let body = serde_json::to_string(request).map_err(|e| format!("encode request: {}", e))?;

    let headers = Headers::new().map_err(describe)?;
    headers
        .set("Content-Type", "application/json")
        .map_err(describe)?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&body));

    let req = Request::new_with_str_and_init(endpoint, &init).map_err(describe)?;
    let window = web_sys::window().ok_or_else(|| "no window available".to_string())?;

    let value = JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(describe)?;
    let response: Response = value.dyn_into().map_err(describe)?;
    let status = response.status();

    let text = JsFuture::from(response.text().map_err(describe)?)
        .await
        .map_err(describe)?;

    Ok(TransportOutcome::Delivered {
        status,
        body: text.as_string().unwrap_or_default(),
    })
}

fn describe(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}
