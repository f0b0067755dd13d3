//! Blog generator: research → write → feedback.
//!
//! Feedback is applied by re-running the whole sequence on the previous
//! state with `feedback` set, so a refinement also refreshes the research
//! and the first draft before the refine call.

use crate::collab::llm::LlmGenerator;
use crate::collab::search::TavilySearch;
use crate::collab::{GenerationRequest, TextGenerator, WebSearch};
use crate::config::{Credential, Credentials, ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::{blog_refine_prompt, blog_write_prompt, NO_INFO_FOUND};
use crate::workflows::{join_snippets, run_step};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WORKFLOW: &str = "blog";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogState {
    pub topic: String,
    pub research: String,
    pub blog: String,
    pub feedback: String,
    pub notices: Vec<String>,
}

impl BlogState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

/// Feedback triggers a refine call only when it asks to "improve".
pub fn wants_refinement(feedback: &str) -> bool {
    !feedback.is_empty() && feedback.to_lowercase().contains("improve")
}

pub struct BlogGenerator {
    search: Arc<dyn WebSearch>,
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
    max_results: usize,
    progress: Option<ProgressCallback>,
}

impl BlogGenerator {
    pub fn new(
        search: Arc<dyn WebSearch>,
        generator: Arc<dyn TextGenerator>,
        settings: ModelSettings,
        max_results: usize,
    ) -> Self {
        Self {
            search,
            generator,
            settings,
            max_results,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Tavily search plus the configured chat model. Needs `TAVILY_API_KEY`.
    pub fn from_config(config: &WorkflowConfig, credentials: &Credentials) -> Result<Self, WorkflowError> {
        let key = credentials.require(Credential::Tavily, WORKFLOW)?;
        Ok(Self::new(
            Arc::new(TavilySearch::new(key, config.download_timeout_secs)?),
            Arc::new(LlmGenerator::from_settings(&config.blog)?),
            config.blog.clone(),
            config.blog_search_results,
        )
        .with_progress(config.progress_callback.clone()))
    }

    /// First draft for a topic.
    pub async fn generate(&self, topic: &str) -> Result<BlogState, WorkflowError> {
        self.run(BlogState::new(topic)).await
    }

    /// Re-run on a previous result with new feedback.
    pub async fn apply_feedback(&self, previous: BlogState, feedback: &str) -> Result<BlogState, WorkflowError> {
        self.run(BlogState {
            feedback: feedback.to_string(),
            ..previous
        })
        .await
    }

    pub async fn run(&self, mut state: BlogState) -> Result<BlogState, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);
        info!("Blog on '{}'", state.topic);

        let (research, notice) = run_step(&progress, "research", async {
            Ok(self.research(&state.topic).await)
        })
        .await?;
        state.research = research;
        if let Some(notice) = notice {
            progress.notice(&notice);
            state.notices.push(notice);
        }

        state.blog = run_step(&progress, "write", self.write(&state.topic, &state.research)).await?;

        if wants_refinement(&state.feedback) {
            state.blog = run_step(&progress, "feedback", self.refine(&state.feedback, &state.blog)).await?;
        } else {
            debug!("Feedback '{}' does not ask for improvement", state.feedback);
            progress.step_skipped("feedback");
        }

        progress.workflow_complete(WORKFLOW);
        Ok(state)
    }

    async fn research(&self, topic: &str) -> (String, Option<String>) {
        match self.search.search(topic, self.max_results).await {
            Ok(hits) => (join_snippets(&hits, NO_INFO_FOUND), None),
            Err(e) => {
                warn!("Blog research failed: {}", e);
                (NO_INFO_FOUND.to_string(), Some(e.to_string()))
            }
        }
    }

    async fn write(&self, topic: &str, research: &str) -> Result<String, WorkflowError> {
        let prompt = blog_write_prompt(topic, research);
        self.generator
            .generate(&GenerationRequest::new(prompt, &self.settings))
            .await
    }

    async fn refine(&self, feedback: &str, blog: &str) -> Result<String, WorkflowError> {
        let prompt = blog_refine_prompt(feedback, blog);
        self.generator
            .generate(&GenerationRequest::new(prompt, &self.settings))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refinement_needs_the_keyword() {
        assert!(wants_refinement("Please IMPROVE clarity"));
        assert!(wants_refinement("improve"));
        assert!(!wants_refinement(""));
        assert!(!wants_refinement("looks great"));
    }
}
