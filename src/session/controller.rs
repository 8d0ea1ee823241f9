//! ParseController: one parse request/response cycle and the view it feeds
//!
//! # State machine
//! `Idle → Requesting → {Succeeded, Failed}`. Succeeded and Failed hold the
//! published result and behave as idle: nothing is in flight.
//!
//! Entering `Requesting` clears every piece of derived state (tree,
//! segments, selection, output) so selection controls are never bound to a
//! stale batch. A new request while one is pending supersedes it; the
//! superseded response is dropped whenever it arrives.
//!
//! Nothing raised below this boundary escapes it: parser, transport and tree
//! failures become `Failed` with a message, and a bad example only marks
//! that example.

use instant::Instant;
use serde::{Deserialize, Serialize};

use crate::curation::{
    CurationSampler, Entropy, Identity, IdentityAssigner, NluExample, OutputSet, SelectionError,
    SelectionStore, SystemEntropy,
};
use crate::display::{segment, DisplaySegment, EntityPalette, EntitySummary, SegmentError};
use crate::grammar::{Ast, AstWireNode, TreeBuilder, TreeError, TreeLayoutNode};
use crate::{console_error, console_log, console_warn};

use super::config::StudioConfig;
use super::protocol::{
    ParseReply, ParseRequest, TransportOutcome, MALFORMED_RESPONSE_MESSAGE, TRANSPORT_FAILURE_MESSAGE,
};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

/// Handle for one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket(pub u32);

/// One segment as rendered, with its entity colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    pub kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One example as rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleView {
    pub identity: Identity,
    pub text: String,
    pub intent: String,
    pub included: bool,
    pub segments: Vec<SegmentView>,
    /// Set when the example's spans could not be segmented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub example_count: usize,
    pub entity_count: usize,
    pub tree_node_count: usize,
    pub segment_failures: usize,
    pub elapsed_ms: f64,
}

/// Everything the page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseView {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeLayoutNode>,
    pub examples: Vec<ExampleView>,
    pub entities: EntitySummary,
    pub included_count: usize,
    pub output_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stats: ParseStats,
}

/// Controller status (for debugging)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioStatus {
    pub phase: Phase,
    pub endpoint: String,
    pub issued_requests: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight: Option<u32>,
    pub dropped_responses: u32,
    pub batch_size: usize,
    pub included_count: usize,
    pub output_count: usize,
    /// Identity or sampling draws are using the clock-seeded fallback
    pub entropy_degraded: bool,
}

struct InFlight {
    ticket: RequestTicket,
    started: Instant,
}

struct RenderedExample {
    identity: Identity,
    segments: Result<Vec<DisplaySegment>, SegmentError>,
}

// =============================================================================
// ParseController
// =============================================================================

pub struct ParseController {
    config: StudioConfig,
    palette: EntityPalette,
    tree_builder: TreeBuilder,
    selection: SelectionStore,
    sampler: CurationSampler,
    output: OutputSet,

    phase: Phase,
    issued: u32,
    in_flight: Option<InFlight>,
    dropped_responses: u32,

    // Derived from the last successful response
    tree: Option<TreeLayoutNode>,
    rendered: Vec<RenderedExample>,
    summary: EntitySummary,
    error: Option<String>,
    stats: ParseStats,
}

impl Default for ParseController {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl ParseController {
    pub fn new(config: StudioConfig) -> Self {
        Self::with_entropy(
            config,
            Box::new(SystemEntropy::new()),
            Box::new(SystemEntropy::new()),
        )
    }

    /// Controller with explicit sources for identities and sampling draws
    pub fn with_entropy(
        config: StudioConfig,
        identities: Box<dyn Entropy>,
        sampling: Box<dyn Entropy>,
    ) -> Self {
        Self {
            palette: EntityPalette::new(config.palette.clone()),
            tree_builder: TreeBuilder::new(config.max_tree_depth),
            selection: SelectionStore::new(IdentityAssigner::with_entropy(identities)),
            sampler: CurationSampler::with_entropy(sampling),
            output: OutputSet::new(),
            config,
            phase: Phase::Idle,
            issued: 0,
            in_flight: None,
            dropped_responses: 0,
            tree: None,
            rendered: Vec::new(),
            summary: EntitySummary::default(),
            error: None,
            stats: ParseStats::default(),
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Requesting
    }

    // -------------------------------------------------------------------------
    // Request cycle
    // -------------------------------------------------------------------------

    /// Enter `Requesting` and build the request body.
    ///
    /// Any pending request is superseded. A blank intent falls back to the
    /// configured default.
    pub fn begin_request(&mut self, syntax: &str, intent: &str) -> (RequestTicket, ParseRequest) {
        // Tickets are only compared for equality
        self.issued = self.issued.wrapping_add(1);
        let ticket = RequestTicket(self.issued);

        if let Some(previous) = &self.in_flight {
            console_log!(
                "[ParseController] request #{} superseded by #{}",
                previous.ticket.0,
                ticket.0
            );
        }

        self.clear_derived();
        self.phase = Phase::Requesting;
        self.in_flight = Some(InFlight {
            ticket,
            started: Instant::now(),
        });

        let intent = if intent.trim().is_empty() {
            self.config.default_intent.clone()
        } else {
            intent.to_string()
        };
        let request = ParseRequest {
            syntax: syntax.to_string(),
            intent,
        };

        console_log!("[ParseController] request #{} issued", ticket.0);
        (ticket, request)
    }

    /// Apply the transport result for `ticket`.
    ///
    /// Returns false (and changes nothing) when `ticket` is not the request
    /// currently in flight.
    pub fn complete(&mut self, ticket: RequestTicket, outcome: TransportOutcome) -> bool {
        let started = match &self.in_flight {
            Some(current) if current.ticket == ticket => current.started,
            _ => {
                self.dropped_responses += 1;
                console_warn!("[ParseController] dropping stale response for request #{}", ticket.0);
                return false;
            }
        };
        self.in_flight = None;

        match outcome.into_reply_within(self.tree_builder.max_depth()) {
            ParseReply::Success { ast, examples } => self.publish(ast, examples),
            ParseReply::ParserError(message) => self.fail(message),
            ParseReply::TreeTooDeep { limit } => {
                self.fail(format!("Parse failed: {}", TreeError::TreeTooDeep { limit }));
            }
            ParseReply::TransportFailure(detail) => {
                console_error!("[ParseController] transport failure: {}", detail);
                self.fail(TRANSPORT_FAILURE_MESSAGE.to_string());
            }
            ParseReply::Malformed(detail) => {
                console_error!("[ParseController] malformed response: {}", detail);
                self.fail(MALFORMED_RESPONSE_MESSAGE.to_string());
            }
        }

        self.stats.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        true
    }

    /// Drop all derived state and return to `Idle`. A pending response is ignored.
    pub fn clear(&mut self) {
        self.clear_derived();
        self.in_flight = None;
        self.phase = Phase::Idle;
    }

    fn publish(&mut self, ast: Option<AstWireNode>, examples: Option<Vec<NluExample>>) {
        if let Some(wire) = ast {
            match self.tree_builder.build(&Ast::from_wire(&wire)) {
                Ok(tree) => {
                    self.stats.tree_node_count = tree.node_count();
                    self.tree = Some(tree);
                }
                Err(e) => {
                    self.fail(format!("Parse failed: {}", e));
                    return;
                }
            }
        }

        if let Some(examples) = examples {
            self.load_examples(examples);
        }

        self.phase = Phase::Succeeded;
    }

    fn load_examples(&mut self, examples: Vec<NluExample>) {
        self.summary = self
            .palette
            .summarize(examples.iter().flat_map(|example| example.entities.iter()));

        let segmented: Vec<Result<Vec<DisplaySegment>, SegmentError>> = examples
            .iter()
            .map(|example| segment(&example.text, &example.entities))
            .collect();

        self.stats.example_count = examples.len();
        self.stats.entity_count = self.summary.total();

        let identities = self.selection.load(examples);
        self.rendered = identities
            .into_iter()
            .zip(segmented)
            .map(|(identity, segments)| {
                if let Err(e) = &segments {
                    console_warn!("[ParseController] example {} not segmented: {}", identity, e);
                    self.stats.segment_failures += 1;
                }
                RenderedExample { identity, segments }
            })
            .collect();

        console_log!(
            "[ParseController] loaded {} examples ({} entity spans)",
            self.stats.example_count,
            self.stats.entity_count
        );
    }

    fn fail(&mut self, message: String) {
        console_error!("[ParseController] parse failed: {}", message);
        self.clear_derived();
        self.error = Some(message);
        self.phase = Phase::Failed;
    }

    fn clear_derived(&mut self) {
        self.tree = None;
        self.rendered.clear();
        self.summary = EntitySummary::default();
        self.selection.clear();
        self.output.clear();
        self.error = None;
        self.stats = ParseStats::default();
    }

    // -------------------------------------------------------------------------
    // Curation
    // -------------------------------------------------------------------------

    pub fn set_included(&mut self, identity: &str, included: bool) -> Result<(), SelectionError> {
        self.selection.set_included(identity, included)
    }

    pub fn set_all_included(&mut self, included: bool) {
        self.selection.set_all_included(included);
    }

    /// Bernoulli-sample the batch; returns the included count
    pub fn sample(&mut self, p: f64) -> Result<usize, SelectionError> {
        self.sampler.sample_with_probability(&mut self.selection, p)
    }

    /// Copy included examples into the output; returns how many were new
    pub fn add_to_output(&mut self) -> usize {
        self.output.add_included(&self.selection)
    }

    pub fn remove_from_output(&mut self, identity: &str) -> bool {
        self.output.remove(identity)
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn output(&self) -> &OutputSet {
        &self.output
    }

    // -------------------------------------------------------------------------
    // View
    // -------------------------------------------------------------------------

    pub fn tree(&self) -> Option<&TreeLayoutNode> {
        self.tree.as_ref()
    }

    pub fn entity_summary(&self) -> &EntitySummary {
        &self.summary
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> ParseView {
        let examples = self
            .rendered
            .iter()
            .filter_map(|rendered| {
                let entry = self.selection.get(&rendered.identity)?;
                let (segments, error) = match &rendered.segments {
                    Ok(segments) => (segments.iter().map(|s| self.segment_view(s)).collect(), None),
                    Err(e) => (Vec::new(), Some(e.to_string())),
                };
                Some(ExampleView {
                    identity: rendered.identity.clone(),
                    text: entry.example.text.clone(),
                    intent: entry.example.intent.clone(),
                    included: entry.included,
                    segments,
                    error,
                })
            })
            .collect();

        ParseView {
            phase: self.phase,
            tree: self.tree.clone(),
            examples,
            entities: self.summary.clone(),
            included_count: self.selection.included_count(),
            output_count: self.output.len(),
            error: self.error.clone(),
            stats: self.stats.clone(),
        }
    }

    fn segment_view(&self, segment: &DisplaySegment) -> SegmentView {
        match segment {
            DisplaySegment::Plain { text } => SegmentView {
                kind: "plain",
                text: text.clone(),
                entity_type: None,
                color: None,
            },
            DisplaySegment::Entity { text, entity_type } => SegmentView {
                kind: "entity",
                text: text.clone(),
                entity_type: Some(entity_type.clone()),
                color: self.summary.color_of(entity_type).map(str::to_string),
            },
        }
    }

    pub fn status(&self) -> StudioStatus {
        StudioStatus {
            phase: self.phase,
            endpoint: self.config.endpoint.clone(),
            issued_requests: self.issued,
            in_flight: self.in_flight.as_ref().map(|f| f.ticket.0),
            dropped_responses: self.dropped_responses,
            batch_size: self.selection.len(),
            included_count: self.selection.included_count(),
            output_count: self.output.len(),
            entropy_degraded: self.selection.entropy_degraded()
                || self.sampler.entropy_degraded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::SplitMix64;

    /// Seeded draws that report a failed platform source
    struct Fallback(SplitMix64);

    impl Entropy for Fallback {
        fn next_u64(&mut self) -> u64 {
            self.0.next_u64()
        }

        fn is_degraded(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_status_reports_degraded_entropy() {
        let healthy = ParseController::with_entropy(
            StudioConfig::default(),
            Box::new(SplitMix64::new(1)),
            Box::new(SplitMix64::new(2)),
        );
        assert!(!healthy.status().entropy_degraded);

        let degraded = ParseController::with_entropy(
            StudioConfig::default(),
            Box::new(SplitMix64::new(1)),
            Box::new(Fallback(SplitMix64::new(2))),
        );
        assert!(degraded.status().entropy_degraded);
    }

    #[test]
    fn test_ticket_counter_wraps() {
        let mut controller = ParseController::default();
        controller.issued = u32::MAX;

        let (last, _) = controller.begin_request("a", "greet");
        assert_eq!(last, RequestTicket(u32::MAX));

        let (wrapped, _) = controller.begin_request("b", "greet");
        assert_eq!(wrapped, RequestTicket(0));
        assert!(!controller.complete(last, TransportOutcome::Unreachable { reason: "late".into() }));
        assert!(controller.complete(wrapped, TransportOutcome::Unreachable { reason: "down".into() }));
        assert_eq!(controller.phase(), Phase::Failed);
    }
}
