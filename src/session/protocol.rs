//! Request/response boundary with the parse service
//!
//! POST `{ syntax, intent }` as JSON. A 2xx reply carries either
//! `{ error }` or any of `{ ast, rasa }`. A non-2xx status or a network
//! failure is a transport failure, distinct from a parser error.
//!
//! serde's recursion limit is lifted for the body; instead the bracket
//! nesting is scanned first and bounded by the tree depth limit, so a deep
//! tree is reported as too deep rather than as an unreadable body.

use serde::{Deserialize, Serialize};

use crate::curation::{NluExample, RasaPayload};
use crate::grammar::{AstWireNode, DEFAULT_MAX_DEPTH};

/// Nesting around the tree and the Rasa payload that is not tree depth
const ENVELOPE_NESTING: usize = 8;

pub const TRANSPORT_FAILURE_MESSAGE: &str = "Unable to reach the grammar service. Please try again.";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "The grammar service returned an unreadable response.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub syntax: String,
    pub intent: String,
}

/// Body of a 2xx reply
#[derive(Deserialize, Debug, Default)]
pub struct ParseResponse {
    #[serde(default)]
    pub ast: Option<AstWireNode>,
    /// Either the payload object or the same payload JSON-encoded as a string
    #[serde(default)]
    pub rasa: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the transport delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    Delivered { status: u16, body: String },
    Unreachable { reason: String },
}

/// Interpreted reply
#[derive(Debug, Clone, PartialEq)]
pub enum ParseReply {
    Success {
        ast: Option<AstWireNode>,
        examples: Option<Vec<NluExample>>,
    },
    /// Structured `{ error }` payload, message kept verbatim
    ParserError(String),
    /// Body nested deeper than a tree of `limit` levels can be
    TreeTooDeep { limit: usize },
    /// Non-2xx status or network failure
    TransportFailure(String),
    /// 2xx with a body that does not decode
    Malformed(String),
}

impl TransportOutcome {
    /// Interpret with the default tree depth limit
    pub fn into_reply(self) -> ParseReply {
        self.into_reply_within(DEFAULT_MAX_DEPTH)
    }

    /// Interpret, accepting trees up to `max_tree_depth` levels
    pub fn into_reply_within(self, max_tree_depth: usize) -> ParseReply {
        match self {
            TransportOutcome::Unreachable { reason } => ParseReply::TransportFailure(reason),
            TransportOutcome::Delivered { status, .. } if !(200..300).contains(&status) => {
                ParseReply::TransportFailure(format!("HTTP status {}", status))
            }
            TransportOutcome::Delivered { body, .. } => decode_body(&body, max_tree_depth),
        }
    }
}

/// Deepest `{`/`[` nesting outside string literals, stopping once past `limit`
fn nesting_exceeds(body: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for b in body.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

fn decode_body(body: &str, max_tree_depth: usize) -> ParseReply {
    // Each tree level is an object plus its `children` array
    let nesting_limit = max_tree_depth
        .saturating_mul(2)
        .saturating_add(ENVELOPE_NESTING);
    if nesting_exceeds(body, nesting_limit) {
        return ParseReply::TreeTooDeep {
            limit: max_tree_depth,
        };
    }

    let mut de = serde_json::Deserializer::from_str(body);
    de.disable_recursion_limit();
    let decoded = ParseResponse::deserialize(&mut de).and_then(|response| {
        de.end()?;
        Ok(response)
    });
    let response = match decoded {
        Ok(response) => response,
        Err(e) => return ParseReply::Malformed(format!("response body: {}", e)),
    };

    if let Some(message) = response.error {
        return ParseReply::ParserError(message);
    }

    let examples = match response.rasa.map(decode_rasa).transpose() {
        Ok(examples) => examples,
        Err(e) => return ParseReply::Malformed(format!("rasa payload: {}", e)),
    };

    ParseReply::Success {
        ast: response.ast,
        examples,
    }
}

fn decode_rasa(value: serde_json::Value) -> Result<Vec<NluExample>, serde_json::Error> {
    let payload: RasaPayload = match value {
        serde_json::Value::String(encoded) => serde_json::from_str(&encoded)?,
        other => serde_json::from_value(other)?,
    };
    Ok(payload
        .rasa_nlu_data
        .common_examples
        .into_iter()
        .map(NluExample::from)
        .collect())
}
