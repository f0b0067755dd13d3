//! Campaign orchestrator/synthesizer: ideas → research → draft → synthesize.

use crate::collab::llm::LlmGenerator;
use crate::collab::search::DuckDuckGoSearch;
use crate::collab::{GenerationRequest, TextGenerator, WebSearch};
use crate::config::{ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::{
    campaign_draft_prompt, campaign_ideas_prompt, campaign_research_query,
    campaign_synthesize_prompt, NO_RESEARCH_FOUND,
};
use crate::workflows::{join_snippets, run_step};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const WORKFLOW: &str = "campaign";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub topic: String,
    pub ideas: String,
    pub research: String,
    pub draft: String,
    pub final_post: String,
    pub notices: Vec<String>,
}

pub struct CampaignWriter {
    search: Arc<dyn WebSearch>,
    generator: Arc<dyn TextGenerator>,
    settings: ModelSettings,
    max_results: usize,
    progress: Option<ProgressCallback>,
}

impl CampaignWriter {
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

    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        Ok(Self::new(
            Arc::new(DuckDuckGoSearch::new(config.download_timeout_secs)?),
            Arc::new(LlmGenerator::from_settings(&config.campaign)?),
            config.campaign.clone(),
            config.campaign_search_results,
        )
        .with_progress(config.progress_callback.clone()))
    }

    pub async fn run(&self, topic: &str) -> Result<CampaignState, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);
        info!("Campaign for '{}'", topic);
        let mut state = CampaignState {
            topic: topic.to_string(),
            ..CampaignState::default()
        };

        state.ideas = run_step(&progress, "ideas", self.generate(campaign_ideas_prompt(topic))).await?;

        let (research, notice) = run_step(&progress, "research", async {
            Ok(self.research(topic).await)
        })
        .await?;
        state.research = research;
        if let Some(notice) = notice {
            progress.notice(&notice);
            state.notices.push(notice);
        }

        let draft_prompt = campaign_draft_prompt(topic, &state.ideas, &state.research);
        state.draft = run_step(&progress, "draft", self.generate(draft_prompt)).await?;

        let final_prompt = campaign_synthesize_prompt(&state.draft);
        state.final_post = run_step(&progress, "synthesize", self.generate(final_prompt)).await?;

        progress.workflow_complete(WORKFLOW);
        Ok(state)
    }

    async fn generate(&self, prompt: String) -> Result<String, WorkflowError> {
        self.generator
            .generate(&GenerationRequest::new(prompt, &self.settings))
            .await
    }

    async fn research(&self, topic: &str) -> (String, Option<String>) {
        let query = campaign_research_query(topic);
        match self.search.search(&query, self.max_results).await {
            Ok(hits) => (join_snippets(&hits, NO_RESEARCH_FOUND), None),
            Err(e) => {
                warn!("Audience research failed: {}", e);
                (NO_RESEARCH_FOUND.to_string(), Some(e.to_string()))
            }
        }
    }
}
