//! In-process fakes for every collaborator trait.

#![allow(dead_code)]

use agentflow::collab::{
    GenerationRequest, OrderState, PaymentConfirmation, SearchHit, Storefront, TextGenerator,
    TextRecognizer, TranscriptSegment, TranscriptSource, WebSearch,
};
use agentflow::{ContentExtractor, ExtractedContent, StepProgressCallback, WorkflowError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Extraction / OCR ─────────────────────────────────────────────────────────

pub struct FakeExtractor {
    content: ExtractedContent,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(content: ExtractedContent) -> Self {
        Self {
            content,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, _source: &Path) -> ExtractedContent {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.content.clone()
    }
}

/// Replies are consumed in order; an exhausted script fails the call.
pub struct ScriptedRecognizer {
    replies: Mutex<VecDeque<Result<String, WorkflowError>>>,
    pub seen: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedRecognizer {
    pub fn new(replies: Vec<Result<String, WorkflowError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, WorkflowError> {
        self.seen.lock().unwrap().push(image.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WorkflowError::Internal("recognizer script exhausted".into())))
    }
}

// ── Generation ───────────────────────────────────────────────────────────────

/// Replies are consumed in order; once the script is empty every call gets
/// `fallback`.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, WorkflowError>>>,
    fallback: String,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, WorkflowError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: "ok".into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self {
            fallback: reply.into(),
            ..Self::new(Vec::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, WorkflowError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub fn quota() -> WorkflowError {
    WorkflowError::QuotaExhausted {
        message: "429 RESOURCE_EXHAUSTED".into(),
    }
}

pub fn generation_error(message: &str) -> WorkflowError {
    WorkflowError::Generation {
        message: message.into(),
    }
}

// ── Search / transcripts ─────────────────────────────────────────────────────

pub struct FakeSearch {
    hits: Option<Vec<SearchHit>>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Some(hits),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: None,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WorkflowError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        match &self.hits {
            Some(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
            None => Err(WorkflowError::Search {
                query: query.to_string(),
                detail: "network unreachable".into(),
            }),
        }
    }
}

pub fn hit(title: &str, url: &str, body: &str) -> SearchHit {
    SearchHit {
        title: title.into(),
        url: url.into(),
        body: body.into(),
    }
}

pub struct FakeTranscripts {
    segments: Option<Vec<TranscriptSegment>>,
}

impl FakeTranscripts {
    pub fn returning(texts: &[&str]) -> Self {
        let segments = texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptSegment {
                text: t.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect();
        Self {
            segments: Some(segments),
        }
    }

    pub fn failing() -> Self {
        Self { segments: None }
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, WorkflowError> {
        self.segments.clone().ok_or_else(|| WorkflowError::Transcript {
            video_id: video_id.to_string(),
            detail: "transcripts disabled".into(),
        })
    }
}

// ── Storefront ───────────────────────────────────────────────────────────────

/// Scripted order states; once the script runs out every check reports
/// `NotShipped`. `None` entries simulate a failed check.
pub struct FakeStore {
    pub cart_ok: bool,
    states: Mutex<VecDeque<Option<OrderState>>>,
    pub log: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new(cart_ok: bool, states: Vec<Option<OrderState>>) -> Self {
        Self {
            cart_ok,
            states: Mutex::new(states.into()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self, action: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|a| *a == action).count()
    }

    fn record(&self, action: &str) {
        self.log.lock().unwrap().push(action.to_string());
    }
}

#[async_trait]
impl Storefront for FakeStore {
    async fn add_to_cart(&self, _product_url: &str) -> Result<(), WorkflowError> {
        self.record("add_to_cart");
        if self.cart_ok {
            Ok(())
        } else {
            Err(WorkflowError::Browser {
                step: "add_to_cart",
                detail: "button never appeared".into(),
            })
        }
    }

    async fn open_cart(&self) -> Result<(), WorkflowError> {
        self.record("open_cart");
        Ok(())
    }

    async fn open_order_history(&self) -> Result<(), WorkflowError> {
        self.record("open_order_history");
        Ok(())
    }

    async fn order_state(&self) -> Result<OrderState, WorkflowError> {
        self.record("order_state");
        match self.states.lock().unwrap().pop_front() {
            Some(Some(state)) => Ok(state),
            Some(None) => Err(WorkflowError::Browser {
                step: "order_state",
                detail: "element not found".into(),
            }),
            None => Ok(OrderState::NotShipped),
        }
    }

    async fn refresh(&self) -> Result<(), WorkflowError> {
        self.record("refresh");
        Ok(())
    }
}

pub struct FakePayment(pub bool);

#[async_trait]
impl PaymentConfirmation for FakePayment {
    async fn wait_for_payment(&self) -> bool {
        self.0
    }
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl StepProgressCallback for RecordingProgress {
    fn on_workflow_start(&self, workflow: &str) {
        self.push(format!("workflow:{workflow}"));
    }

    fn on_step_start(&self, step: &str) {
        self.push(format!("start:{step}"));
    }

    fn on_step_complete(&self, step: &str, _elapsed_ms: u64) {
        self.push(format!("done:{step}"));
    }

    fn on_step_skipped(&self, step: &str) {
        self.push(format!("skip:{step}"));
    }

    fn on_notice(&self, _message: &str) {
        self.push("notice".into());
    }

    fn on_workflow_complete(&self, workflow: &str) {
        self.push(format!("finished:{workflow}"));
    }
}
