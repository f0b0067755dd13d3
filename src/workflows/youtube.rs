//! YouTube summarizer: video id → transcript → summary.
//!
//! Only the generation call retries, and only on quota exhaustion; see
//! [`crate::retry::retry_on_quota`].

use crate::collab::llm::LlmGenerator;
use crate::collab::transcript::YouTubeTranscripts;
use crate::collab::{GenerationRequest, TextGenerator, TranscriptSource};
use crate::config::{Credential, Credentials, ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::transcript_summary_prompt;
use crate::retry::{retry_on_quota, RetryPolicy};
use crate::workflows::run_step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WORKFLOW: &str = "youtube";

/// Extract the video id from a `youtu.be/<id>` or `youtube.com/watch?v=<id>`
/// link. Other hosts and unparsable input give `None`.
pub fn extract_video_id(link: &str) -> Option<String> {
    let url = reqwest::Url::parse(link.trim()).ok()?;
    let id = match url.host_str()? {
        "youtu.be" => url.path().trim_start_matches('/').to_string(),
        "www.youtube.com" | "youtube.com" => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())?,
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("http://img.youtube.com/vi/{video_id}/0.jpg")
}

/// Segment texts joined by spaces, cut to at most `limit` characters.
pub fn join_transcript<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> String {
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    match joined.char_indices().nth(limit) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSummary {
    pub link: String,
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub notices: Vec<String>,
}

pub struct YouTubeSummarizer {
    transcripts: Arc<dyn TranscriptSource>,
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
    retry: RetryPolicy,
    char_limit: usize,
    progress: Option<ProgressCallback>,
}

impl YouTubeSummarizer {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        generator: Arc<dyn TextGenerator>,
        settings: ModelSettings,
        retry: RetryPolicy,
        char_limit: usize,
    ) -> Self {
        Self {
            transcripts,
            generator,
            settings,
            retry,
            char_limit,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// YouTube captions plus the configured model. Without an explicit
    /// provider this uses Gemini and needs `GOOGLE_API_KEY`.
    pub fn from_config(
        config: &WorkflowConfig,
        credentials: &Credentials,
    ) -> Result<Self, WorkflowError> {
        let mut settings = config.youtube.clone();
        if settings.provider.is_none() && settings.provider_name.is_none() {
            credentials.require(Credential::Google, WORKFLOW)?;
            settings.provider_name = Some("gemini".to_string());
            settings.model.get_or_insert_with(|| "gemini-1.5-flash".to_string());
        }
        Ok(Self::new(
            Arc::new(YouTubeTranscripts::new(config.download_timeout_secs)?),
            Arc::new(LlmGenerator::from_settings(&settings)?),
            settings,
            config.retry,
            config.transcript_char_limit,
        )
        .with_progress(config.progress_callback.clone()))
    }

    pub async fn run(&self, link: &str) -> Result<TranscriptSummary, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);
        let mut state = TranscriptSummary {
            link: link.to_string(),
            ..TranscriptSummary::default()
        };

        state.video_id = extract_video_id(link);
        let Some(video_id) = state.video_id.clone() else {
            let notice = "Please enter a valid YouTube URL.".to_string();
            progress.notice(&notice);
            state.notices.push(notice);
            progress.step_skipped("transcript");
            progress.step_skipped("generate");
            progress.workflow_complete(WORKFLOW);
            return Ok(state);
        };
        state.thumbnail_url = Some(thumbnail_url(&video_id));

        let (transcript, notice) = run_step(&progress, "transcript", async {
            Ok(self.transcript(&video_id).await)
        })
        .await?;
        state.transcript = transcript;
        if let Some(notice) = notice {
            progress.notice(&notice);
            state.notices.push(notice);
        }

        match state.transcript.as_deref() {
            Some(transcript) => {
                let (summary, notice) = run_step(&progress, "generate", self.generate(transcript)).await?;
                state.summary = summary;
                if let Some(notice) = notice {
                    progress.notice(&notice);
                    state.notices.push(notice);
                }
            }
            None => progress.step_skipped("generate"),
        }

        progress.workflow_complete(WORKFLOW);
        Ok(state)
    }

    async fn transcript(&self, video_id: &str) -> (Option<String>, Option<String>) {
        match self.transcripts.fetch(video_id).await {
            Ok(segments) => {
                let text = join_transcript(segments.iter().map(|s| s.text.as_str()), self.char_limit);
                debug!("Transcript for {}: {} segments, {} chars", video_id, segments.len(), text.len());
                (Some(text), None)
            }
            Err(e) => {
                warn!("Error fetching transcript: {}", e);
                (None, Some(format!("Error fetching transcript: {e}")))
            }
        }
    }

    /// Only an exhausted quota aborts the run; any other generation failure
    /// leaves the summary empty and is reported as a notice.
    async fn generate(&self, transcript: &str) -> Result<(Option<String>, Option<String>), WorkflowError> {
        let request = GenerationRequest::new(transcript_summary_prompt(transcript), &self.settings);
        match retry_on_quota(&self.retry, "youtube summary", || self.generator.generate(&request)).await {
            Ok(summary) => {
                info!("Summary: {} chars", summary.len());
                Ok((Some(summary), None))
            }
            Err(e) if e.is_quota_exhausted() => Err(e),
            Err(e) => {
                warn!("Failed to generate summary: {}", e);
                Ok((None, Some(format!("Failed to generate summary: {e}"))))
            }
        }
    }
}
