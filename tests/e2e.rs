//! End-to-end tests against live services.
//!
//! These make real LLM, search and transcript calls and read sample PDFs
//! from `./test_cases/`. They are gated behind `E2E_ENABLED` so a plain
//! `cargo test` never touches the network.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Provider selection follows the usual environment variables
//! (`OPENAI_API_KEY`, `GOOGLE_API_KEY`, ...). Tests whose credential is
//! missing print a SKIP line and return.

use agentflow::collab::search::DuckDuckGoSearch;
use agentflow::collab::transcript::YouTubeTranscripts;
use agentflow::collab::{MemoryCheckpointStore, TranscriptSource, WebSearch};
use agentflow::workflows::analysts::{AnalystOutcome, AnalystPlanner};
use agentflow::workflows::blog::BlogGenerator;
use agentflow::workflows::summarize::{Summarizer, SummaryInput};
use agentflow::workflows::youtube::YouTubeSummarizer;
use agentflow::{analyze_bytes, analyze_document, route, Credentials, Route, WorkflowConfig};
use std::path::PathBuf;
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// Skip unless e2e is enabled and the sample file exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        e2e_skip_unless_enabled!();
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

macro_rules! skip_without_env {
    ($var:expr) => {
        if std::env::var($var).map(|v| v.is_empty()).unwrap_or(true) {
            println!("SKIP: {} is not set", $var);
            return;
        }
    };
}

fn config() -> WorkflowConfig {
    WorkflowConfig::builder()
        .build()
        .expect("default config is valid")
}

// ── Document pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_document_text_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let record = analyze_document(path.to_string_lossy(), &config())
        .await
        .expect("analysis should succeed");

    assert!(record.notices.is_empty(), "notices: {:?}", record.notices);
    assert!(!record.pages.is_empty());
    for pair in record.pages.windows(2) {
        assert!(pair[0].page_number < pair[1].page_number);
    }
    assert!(record.answer_lines.iter().any(|l| !l.trim().is_empty()));
    println!("{}", record.answer_lines.join("\n"));
}

#[tokio::test]
async fn e2e_document_scanned_pdf_runs_ocr() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scanned.pdf"));

    let record = analyze_document(path.to_string_lossy(), &config())
        .await
        .expect("analysis should succeed");

    assert_eq!(route(&record), Route::NeedsOcr);
    assert_eq!(record.ocr_results.len(), record.images.len());
    for (image, ocr) in record.images.iter().zip(&record.ocr_results) {
        assert_eq!(image.page_number, ocr.page_number);
    }
}

#[tokio::test]
async fn e2e_document_from_upload_matches_path() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let bytes = std::fs::read(&path).expect("read sample");

    let record = analyze_bytes(&bytes, &config()).await.expect("analysis should succeed");

    assert!(record.notices.is_empty(), "notices: {:?}", record.notices);
    assert!(!record.pages.is_empty());
}

#[tokio::test]
async fn e2e_document_missing_file_degrades() {
    e2e_skip_unless_enabled!();

    let record = analyze_document("/no/such/document.pdf", &config())
        .await
        .expect("a missing file is not fatal");

    assert!(record.pages.is_empty());
    assert_eq!(record.notices.len(), 1);
    assert!(record.notices[0].starts_with("Error extracting PDF:"));
}

// ── Other workflows ──────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_summarize_text() {
    e2e_skip_unless_enabled!();
    let config = config();

    let state = Summarizer::from_config(&config)
        .expect("summarizer")
        .run(SummaryInput::parse(
            "Rust is a multi-paradigm language focused on performance and memory safety. \
             It enforces ownership rules at compile time and has no garbage collector.",
        ))
        .await
        .expect("summary");

    assert!(!state.summary.trim().is_empty());
}

#[tokio::test]
async fn e2e_blog_with_tavily() {
    e2e_skip_unless_enabled!();
    skip_without_env!("TAVILY_API_KEY");

    let blog = BlogGenerator::from_config(&config(), &Credentials::from_env()).expect("blog");
    let state = blog.generate("WebAssembly outside the browser").await.expect("blog run");

    assert!(state.notices.is_empty(), "notices: {:?}", state.notices);
    assert_ne!(state.research, "No info found.");
    assert!(!state.blog.trim().is_empty());
}

#[tokio::test]
async fn e2e_duckduckgo_search() {
    e2e_skip_unless_enabled!();

    let search = DuckDuckGoSearch::new(30).expect("client");
    let hits = search.search("rust programming language", 5).await.expect("search");

    assert!(!hits.is_empty());
    assert!(hits.len() <= 5);
    assert!(hits.iter().all(|h| h.url.starts_with("http")));
}

#[tokio::test]
async fn e2e_youtube_transcript() {
    e2e_skip_unless_enabled!();

    let segments = YouTubeTranscripts::new(30)
        .expect("client")
        .fetch("dQw4w9WgXcQ")
        .await
        .expect("captions");

    assert!(!segments.is_empty());
    for pair in segments.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
}

#[tokio::test]
async fn e2e_youtube_summary() {
    e2e_skip_unless_enabled!();
    skip_without_env!("GOOGLE_API_KEY");

    let summarizer = YouTubeSummarizer::from_config(&config(), &Credentials::from_env()).expect("summarizer");
    let state = summarizer.run("https://youtu.be/dQw4w9WgXcQ").await.expect("run");

    assert_eq!(state.video_id.as_deref(), Some("dQw4w9WgXcQ"));
    assert!(state.summary.is_some() || !state.notices.is_empty());
}

#[tokio::test]
async fn e2e_analysts_round_trip() {
    e2e_skip_unless_enabled!();

    let store = Arc::new(MemoryCheckpointStore::new());
    let planner = AnalystPlanner::from_config(&config(), store.clone()).expect("planner");

    let outcome = planner.start("Open-source AI governance", 3).await.expect("start");
    let AnalystOutcome::Paused { session_id, state } = outcome else {
        panic!("start must pause");
    };
    assert!(state.analysts.len() <= 3);

    let finished = planner.resume(&session_id, "").await.expect("finish");
    assert!(matches!(finished, AnalystOutcome::Finished { .. }));
    assert!(store.is_empty());
}
