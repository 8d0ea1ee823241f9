//! JavaScript handle for a studio session
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { MetonymStudio } from 'metonym-studio';
//!
//! await init();
//! const studio = new MetonymStudio({ endpoint: '/parse' });
//!
//! const view = await studio.parse('[hi|hello] (Bob):name', 'greet');
//! studio.setAllIncluded(false);
//! studio.sample(0.25);
//! studio.addToOutput();
//! console.log(studio.output());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::curation::probability_label;

use super::config::StudioConfig;
use super::controller::{ParseController, RequestTicket};
use super::protocol::{ParseRequest, TransportOutcome};
use super::transport::post_parse;

#[derive(Serialize)]
struct IssuedRequest {
    ticket: u32,
    endpoint: String,
    request: ParseRequest,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub struct MetonymStudio {
    inner: Rc<RefCell<ParseController>>,
}

#[wasm_bindgen]
impl MetonymStudio {
    /// Create a session. `config` may be null/undefined for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<MetonymStudio, JsValue> {
        let config: StudioConfig = if config.is_null() || config.is_undefined() {
            StudioConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        Ok(MetonymStudio {
            inner: Rc::new(RefCell::new(ParseController::new(config))),
        })
    }

    /// Send `syntax` to the configured endpoint. Resolves to the view once
    /// the response is applied (or dropped as stale).
    #[wasm_bindgen(js_name = "parse")]
    pub fn js_parse(&self, syntax: &str, intent: &str) -> js_sys::Promise {
        let (ticket, request, endpoint) = {
            let mut controller = self.inner.borrow_mut();
            let (ticket, request) = controller.begin_request(syntax, intent);
            (ticket, request, controller.config().endpoint.clone())
        };
        let inner = Rc::clone(&self.inner);

        future_to_promise(async move {
            let outcome = post_parse(&endpoint, &request).await;
            let view = {
                let mut controller = inner.borrow_mut();
                controller.complete(ticket, outcome);
                controller.view()
            };
            to_js(&view)
        })
    }

    /// Start a request whose transport the host performs itself.
    /// Returns `{ ticket, endpoint, request }`.
    #[wasm_bindgen(js_name = "beginRequest")]
    pub fn js_begin_request(&self, syntax: &str, intent: &str) -> Result<JsValue, JsValue> {
        let mut controller = self.inner.borrow_mut();
        let (ticket, request) = controller.begin_request(syntax, intent);
        to_js(&IssuedRequest {
            ticket: ticket.0,
            endpoint: controller.config().endpoint.clone(),
            request,
        })
    }

    /// Apply a host-performed response. Status 0 means the service was
    /// unreachable and `body` is the reason. Returns false for a stale ticket.
    #[wasm_bindgen(js_name = "completeRequest")]
    pub fn js_complete_request(&self, ticket: u32, status: u16, body: String) -> bool {
        let outcome = if status == 0 {
            TransportOutcome::Unreachable { reason: body }
        } else {
            TransportOutcome::Delivered { status, body }
        };
        self.inner.borrow_mut().complete(RequestTicket(ticket), outcome)
    }

    #[wasm_bindgen(js_name = "view")]
    pub fn js_view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().view())
    }

    #[wasm_bindgen(js_name = "setIncluded")]
    pub fn js_set_included(&self, identity: &str, included: bool) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .set_included(identity, included)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "setAllIncluded")]
    pub fn js_set_all_included(&self, included: bool) {
        self.inner.borrow_mut().set_all_included(included);
    }

    /// Bernoulli-sample the batch with probability `p`; returns the included count
    #[wasm_bindgen(js_name = "sample")]
    pub fn js_sample(&self, p: f64) -> Result<usize, JsValue> {
        self.inner
            .borrow_mut()
            .sample(p)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "probabilityLabel")]
    pub fn js_probability_label(p: f64) -> String {
        probability_label(p)
    }

    /// Copy included examples into the output; returns how many were new
    #[wasm_bindgen(js_name = "addToOutput")]
    pub fn js_add_to_output(&self) -> usize {
        self.inner.borrow_mut().add_to_output()
    }

    #[wasm_bindgen(js_name = "removeFromOutput")]
    pub fn js_remove_from_output(&self, identity: &str) -> bool {
        self.inner.borrow_mut().remove_from_output(identity)
    }

    /// Output set in Rasa NLU form
    #[wasm_bindgen(js_name = "output")]
    pub fn js_output(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().output().to_rasa())
    }

    #[wasm_bindgen(js_name = "clearOutput")]
    pub fn js_clear_output(&self) {
        self.inner.borrow_mut().clear_output();
    }

    #[wasm_bindgen(js_name = "clear")]
    pub fn js_clear(&self) {
        self.inner.borrow_mut().clear();
    }

    #[wasm_bindgen(js_name = "isBusy")]
    pub fn js_is_busy(&self) -> bool {
        self.inner.borrow().is_busy()
    }

    /// Get session status (for debugging)
    #[wasm_bindgen(js_name = "getStatus")]
    pub fn js_get_status(&self) -> JsValue {
        let status = self.inner.borrow().status();
        let json = serde_json::json!({
            "phase": status.phase,
            "endpoint": status.endpoint,
            "issuedRequests": status.issued_requests,
            "inFlight": status.in_flight,
            "droppedResponses": status.dropped_responses,
            "batchSize": status.batch_size,
            "includedCount": status.included_count,
            "outputCount": status.output_count,
            "entropyDegraded": status.entropy_degraded,
        });
        json.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap_or(JsValue::NULL)
    }
}
