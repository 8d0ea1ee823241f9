//! EntitySegmenter: text + entity spans -> display segments
//!
//! Splits a generated example into alternating plain runs and tagged entity
//! runs for rendering. Offsets are character offsets (not bytes) and span
//! ends are inclusive, matching the generator's annotations.
//!
//! Concatenating the `text` of every returned segment reproduces the input
//! exactly. Spans that do not fit the text or that collide with each other
//! are rejected rather than repaired.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use wasm_bindgen::prelude::*;

// =============================================================================
// Types
// =============================================================================

/// One annotated entity occurrence inside an example's text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    /// First character of the entity
    pub start: usize,
    /// Last character of the entity (inclusive)
    pub end: usize,
    /// Entity type from the `:name` syntax
    #[serde(rename = "entity")]
    pub entity_type: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, entity_type: impl Into<String>) -> Self {
        Self {
            start,
            end,
            entity_type: entity_type.into(),
        }
    }
}

impl fmt::Display for EntitySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..={}", self.entity_type, self.start, self.end)
    }
}

/// A renderable piece of example text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DisplaySegment {
    Plain { text: String },
    Entity { text: String, entity_type: String },
}

impl DisplaySegment {
    pub fn plain(text: impl Into<String>) -> Self {
        DisplaySegment::Plain { text: text.into() }
    }

    pub fn entity(text: impl Into<String>, entity_type: impl Into<String>) -> Self {
        DisplaySegment::Entity {
            text: text.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DisplaySegment::Plain { text } | DisplaySegment::Entity { text, .. } => text,
        }
    }

    pub fn entity_type(&self) -> Option<&str> {
        match self {
            DisplaySegment::Plain { .. } => None,
            DisplaySegment::Entity { entity_type, .. } => Some(entity_type),
        }
    }
}

/// Span annotations inconsistent with the text they annotate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("malformed span {span}: text has {len} characters")]
    MalformedSpan { span: EntitySpan, len: usize },
    #[error("span {first} conflicts with span {second}")]
    ConflictingSpan { first: EntitySpan, second: EntitySpan },
}

// =============================================================================
// Segmentation
// =============================================================================

/// Segment `text` according to `entities`.
///
/// Returns no partial output: any invalid span fails the whole call.
pub fn segment(text: &str, entities: &[EntitySpan]) -> Result<Vec<DisplaySegment>, SegmentError> {
    // bounds[i] is the byte offset of character i; the extra entry closes the last char
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;

    let starts = index_by_start(entities, len)?;

    let mut segments = Vec::with_capacity(entities.len() * 2 + 1);
    let mut plain_start = 0;
    let mut offset = 0;

    while offset < len {
        match starts.get(&offset) {
            Some(span) => {
                if plain_start < offset {
                    segments.push(DisplaySegment::plain(&text[bounds[plain_start]..bounds[offset]]));
                }
                segments.push(DisplaySegment::entity(
                    &text[bounds[span.start]..bounds[span.end + 1]],
                    span.entity_type.as_str(),
                ));
                offset = span.end + 1;
                plain_start = offset;
            }
            None => offset += 1,
        }
    }

    if plain_start < len {
        segments.push(DisplaySegment::plain(&text[bounds[plain_start]..]));
    }

    Ok(segments)
}

/// Build the start-offset lookup, validating every span against `len`.
fn index_by_start(
    entities: &[EntitySpan],
    len: usize,
) -> Result<HashMap<usize, &EntitySpan>, SegmentError> {
    let mut starts: HashMap<usize, &EntitySpan> = HashMap::with_capacity(entities.len());

    for span in entities {
        if span.end < span.start || span.end >= len {
            return Err(SegmentError::MalformedSpan {
                span: span.clone(),
                len,
            });
        }
        if let Some(existing) = starts.insert(span.start, span) {
            return Err(SegmentError::ConflictingSpan {
                first: existing.clone(),
                second: span.clone(),
            });
        }
    }

    // Distinct starts can still overlap
    let mut ordered: Vec<&EntitySpan> = starts.values().copied().collect();
    ordered.sort_by_key(|span| span.start);
    for pair in ordered.windows(2) {
        if pair[1].start <= pair[0].end {
            return Err(SegmentError::ConflictingSpan {
                first: pair[0].clone(),
                second: pair[1].clone(),
            });
        }
    }

    Ok(starts)
}

// =============================================================================
// WASM Bindings
// =============================================================================

/// Segment a single example (JS binding)
///
/// `entities` is an array of `{ start, end, entity }`; end is inclusive.
#[wasm_bindgen(js_name = segmentText)]
pub fn js_segment_text(text: &str, entities: JsValue) -> Result<JsValue, JsValue> {
    let spans: Vec<EntitySpan> = serde_wasm_bindgen::from_value(entities)
        .map_err(|e| JsValue::from_str(&format!("Invalid entities: {}", e)))?;
    let segments = segment(text, &spans).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&segments)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn joined(segments: &[DisplaySegment]) -> String {
        segments.iter().map(DisplaySegment::text).collect()
    }

    // -------------------------------------------------------------------------
    // Requirement 1: Text without entities is one plain run
    // -------------------------------------------------------------------------
    #[test]
    fn test_plain_text_only() {
        let segments = segment("Hello", &[]).unwrap();
        assert_eq!(segments, vec![DisplaySegment::plain("Hello")]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(segment("", &[]).unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Requirement 2: Entity at the tail
    // -------------------------------------------------------------------------
    #[test]
    fn test_trailing_entity() {
        let segments = segment("Hi Bob", &[EntitySpan::new(3, 5, "name")]).unwrap();
        assert_eq!(
            segments,
            vec![DisplaySegment::plain("Hi "), DisplaySegment::entity("Bob", "name")]
        );
    }

    #[test]
    fn test_entity_in_the_middle() {
        let text = "Where is the market today";
        let segments = segment(text, &[EntitySpan::new(13, 18, "location")]).unwrap();
        assert_eq!(
            segments,
            vec![
                DisplaySegment::plain("Where is the "),
                DisplaySegment::entity("market", "location"),
                DisplaySegment::plain(" today"),
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Requirement 3: Adjacent spans stay separate
    // -------------------------------------------------------------------------
    #[test]
    fn test_adjacent_spans_not_merged() {
        let spans = vec![EntitySpan::new(0, 0, "x"), EntitySpan::new(1, 1, "y")];
        let segments = segment("ab", &spans).unwrap();
        assert_eq!(
            segments,
            vec![DisplaySegment::entity("a", "x"), DisplaySegment::entity("b", "y")]
        );
    }

    #[test]
    fn test_span_order_in_input_does_not_matter() {
        let spans = vec![EntitySpan::new(4, 6, "b"), EntitySpan::new(0, 2, "a")];
        let segments = segment("one two", &spans).unwrap();
        assert_eq!(
            segments,
            vec![
                DisplaySegment::entity("one", "a"),
                DisplaySegment::plain(" "),
                DisplaySegment::entity("two", "b"),
            ]
        );
    }

    // -------------------------------------------------------------------------
    // Requirement 4: Offsets are characters, not bytes
    // -------------------------------------------------------------------------
    #[test]
    fn test_multibyte_offsets() {
        let segments = segment("café Zoë", &[EntitySpan::new(5, 7, "name")]).unwrap();
        assert_eq!(
            segments,
            vec![DisplaySegment::plain("café "), DisplaySegment::entity("Zoë", "name")]
        );
    }

    // -------------------------------------------------------------------------
    // Requirement 5: Invalid spans are rejected
    // -------------------------------------------------------------------------
    #[test]
    fn test_span_past_end_is_malformed() {
        let err = segment("Hi Bob", &[EntitySpan::new(3, 6, "name")]).unwrap_err();
        assert!(matches!(err, SegmentError::MalformedSpan { len: 6, .. }));
    }

    #[test]
    fn test_inverted_span_is_malformed() {
        let err = segment("Hi Bob", &[EntitySpan::new(4, 3, "name")]).unwrap_err();
        assert!(matches!(err, SegmentError::MalformedSpan { .. }));
    }

    #[test]
    fn test_span_on_empty_text_is_malformed() {
        let err = segment("", &[EntitySpan::new(0, 0, "x")]).unwrap_err();
        assert!(matches!(err, SegmentError::MalformedSpan { len: 0, .. }));
    }

    #[test]
    fn test_shared_start_conflicts() {
        let spans = vec![EntitySpan::new(0, 1, "x"), EntitySpan::new(0, 2, "y")];
        let err = segment("abcd", &spans).unwrap_err();
        match err {
            SegmentError::ConflictingSpan { first, second } => {
                assert_eq!(first.entity_type, "x");
                assert_eq!(second.entity_type, "y");
            }
            other => panic!("expected ConflictingSpan, got {:?}", other),
        }
    }

    #[test]
    fn test_overlap_conflicts() {
        let spans = vec![EntitySpan::new(0, 2, "x"), EntitySpan::new(2, 3, "y")];
        let err = segment("abcd", &spans).unwrap_err();
        assert!(matches!(err, SegmentError::ConflictingSpan { .. }));
    }

    #[test]
    fn test_error_messages_name_the_span() {
        let err = segment("ab", &[EntitySpan::new(1, 5, "city")]).unwrap_err();
        assert_eq!(err.to_string(), "malformed span city@1..=5: text has 2 characters");
    }

    #[test]
    fn test_span_deserializes_from_wire_shape() {
        let json = r#"{"start": 3, "end": 5, "value": "Bob", "entity": "name"}"#;
        let span: EntitySpan = serde_json::from_str(json).unwrap();
        assert_eq!(span, EntitySpan::new(3, 5, "name"));
    }

    #[test]
    fn test_segment_serializes_with_kind_tag() {
        let json = serde_json::to_value(DisplaySegment::entity("Bob", "name")).unwrap();
        assert_eq!(json["kind"], "entity");
        assert_eq!(json["text"], "Bob");
        assert_eq!(json["entityType"], "name");
    }

    // -------------------------------------------------------------------------
    // Laws
    // -------------------------------------------------------------------------

    /// Text assembled from runs, some of them tagged (tagged runs may touch)
    fn annotated_text() -> impl Strategy<Value = (String, Vec<EntitySpan>)> {
        proptest::collection::vec((any::<bool>(), "[a-zé🙂 ]{1,5}"), 0..12).prop_map(|runs| {
            let mut text = String::new();
            let mut spans = Vec::new();
            let mut offset = 0;
            for (i, (tagged, run)) in runs.into_iter().enumerate() {
                let n = run.chars().count();
                if tagged {
                    spans.push(EntitySpan::new(offset, offset + n - 1, format!("type{}", i % 3)));
                }
                text.push_str(&run);
                offset += n;
            }
            (text, spans)
        })
    }

    proptest! {
        #[test]
        fn prop_segments_reassemble_text((text, spans) in annotated_text()) {
            let segments = segment(&text, &spans).unwrap();
            prop_assert_eq!(joined(&segments), text);
        }

        #[test]
        fn prop_one_entity_segment_per_span((text, spans) in annotated_text()) {
            let segments = segment(&text, &spans).unwrap();
            let entities: Vec<&DisplaySegment> =
                segments.iter().filter(|s| s.entity_type().is_some()).collect();
            prop_assert_eq!(entities.len(), spans.len());

            let chars: Vec<char> = text.chars().collect();
            for (segment, span) in entities.iter().zip(spans.iter()) {
                let expected: String = chars[span.start..=span.end].iter().collect();
                prop_assert_eq!(segment.text(), expected.as_str());
                prop_assert_eq!(segment.entity_type(), Some(span.entity_type.as_str()));
            }
        }
    }
}
