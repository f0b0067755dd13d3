//! Analyst personas with a human in the loop.
//!
//! ```text
//! start ──▶ create ──▶ save checkpoint ──▶ Paused { session_id }
//!                                              │
//! resume(session_id, feedback) ◀───────────────┘
//!   ├─ feedback non-blank ──▶ create ──▶ save ──▶ Paused
//!   └─ feedback blank ──────▶ remove checkpoint ──▶ Finished
//! ```
//!
//! The pause is a save-and-return: nothing stays suspended in memory, so a
//! [`FileCheckpointStore`](crate::collab::FileCheckpointStore) lets the
//! resume happen in a later process.

use crate::collab::llm::LlmGenerator;
use crate::collab::{new_session_id, Checkpoint, CheckpointStore, GenerationRequest, TextGenerator};
use crate::config::{ModelSettings, WorkflowConfig};
use crate::error::WorkflowError;
use crate::progress::{Progress, ProgressCallback};
use crate::prompts::{analyst_instructions, ANALYST_REQUEST};
use crate::workflows::run_step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const WORKFLOW: &str = "analysts";
/// Resume point stored in every analyst checkpoint.
pub const STEP_HUMAN_FEEDBACK: &str = "human_feedback";
pub const MAX_ANALYSTS: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyst {
    pub affiliation: String,
    pub name: String,
    pub role: String,
    pub description: String,
}

impl Analyst {
    pub fn persona(&self) -> String {
        format!(
            "Name: {}\nRole: {}\nAffiliation: {}\nDescription: {}\n",
            self.name, self.role, self.affiliation, self.description
        )
    }
}

#[derive(Debug, Deserialize)]
struct Perspectives {
    analysts: Vec<Analyst>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystState {
    pub topic: String,
    pub max_analysts: u8,
    pub human_analyst_feedback: String,
    pub analysts: Vec<Analyst>,
    pub warnings: Vec<String>,
}

/// Where a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalystOutcome {
    /// Waiting for feedback; pass `session_id` to [`AnalystPlanner::resume`].
    Paused { session_id: String, state: AnalystState },
    Finished { state: AnalystState },
}

impl AnalystOutcome {
    pub fn state(&self) -> &AnalystState {
        match self {
            AnalystOutcome::Paused { state, .. } | AnalystOutcome::Finished { state } => state,
        }
    }
}

/// Parse the model's JSON reply, tolerating code fences and prose around
/// the object.
pub fn parse_analysts(reply: &str) -> Result<Vec<Analyst>, String> {
    let start = reply.find('{').ok_or("no JSON object in reply")?;
    let end = reply.rfind('}').ok_or("unterminated JSON object in reply")?;
    if end < start {
        return Err("malformed JSON object in reply".into());
    }
    serde_json::from_str::<Perspectives>(&reply[start..=end])
        .map(|p| p.analysts)
        .map_err(|e| e.to_string())
}

pub struct AnalystPlanner {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn CheckpointStore>,
    settings: ModelSettings,
    progress: Option<ProgressCallback>,
}

impl AnalystPlanner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn CheckpointStore>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            generator,
            store,
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn from_config(
        config: &WorkflowConfig,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self, WorkflowError> {
        Ok(Self::new(
            Arc::new(LlmGenerator::from_settings(&config.analysts)?),
            store,
            config.analysts.clone(),
        )
        .with_progress(config.progress_callback.clone()))
    }

    /// Generate the first set of analysts and pause for feedback.
    pub async fn start(&self, topic: &str, max_analysts: u8) -> Result<AnalystOutcome, WorkflowError> {
        if !(1..=MAX_ANALYSTS).contains(&max_analysts) {
            return Err(WorkflowError::InvalidInput {
                input: max_analysts.to_string(),
                reason: format!("number of analysts must be between 1 and {MAX_ANALYSTS}"),
            });
        }
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);

        let mut state = AnalystState {
            topic: topic.to_string(),
            max_analysts,
            ..AnalystState::default()
        };
        self.create(&progress, &mut state).await?;
        self.pause(new_session_id(), state).await
    }

    /// Continue a paused session. Blank feedback finishes it.
    pub async fn resume(&self, session_id: &str, feedback: &str) -> Result<AnalystOutcome, WorkflowError> {
        let checkpoint = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| WorkflowError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        if checkpoint.next_step != STEP_HUMAN_FEEDBACK {
            return Err(WorkflowError::WrongResumePoint {
                session_id: session_id.to_string(),
                expected: STEP_HUMAN_FEEDBACK.to_string(),
                found: checkpoint.next_step,
            });
        }
        let mut state: AnalystState =
            serde_json::from_value(checkpoint.state).map_err(|e| WorkflowError::Checkpoint {
                session_id: session_id.to_string(),
                detail: format!("unreadable state: {e}"),
            })?;

        let progress = Progress(self.progress.as_ref());
        let feedback = feedback.trim();
        if feedback.is_empty() {
            self.store.remove(session_id).await?;
            info!("Session {} finalised with {} analysts", session_id, state.analysts.len());
            progress.step_skipped("create_analysts");
            progress.workflow_complete(WORKFLOW);
            return Ok(AnalystOutcome::Finished { state });
        }

        debug!("Session {} resumed with feedback", session_id);
        state.human_analyst_feedback = feedback.to_string();
        self.create(&progress, &mut state).await?;
        self.pause(session_id.to_string(), state).await
    }

    async fn create(&self, progress: &Progress<'_>, state: &mut AnalystState) -> Result<(), WorkflowError> {
        let current: &AnalystState = state;
        let (analysts, warning) = run_step(progress, "create_analysts", async {
            Ok(self.generate(current).await)
        })
        .await?;
        state.analysts = analysts;
        if let Some(warning) = warning {
            progress.notice(&warning);
            state.warnings.push(warning);
        }
        Ok(())
    }

    /// Any failure here degrades to an empty list and a warning.
    async fn generate(&self, state: &AnalystState) -> (Vec<Analyst>, Option<String>) {
        let system = analyst_instructions(&state.topic, &state.human_analyst_feedback, state.max_analysts);
        let request = GenerationRequest::new(ANALYST_REQUEST, &self.settings).with_system(system);

        let outcome = match self.generator.generate(&request).await {
            Ok(reply) => parse_analysts(&reply),
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok(mut analysts) => {
                analysts.truncate(state.max_analysts as usize);
                info!("Generated {} analysts", analysts.len());
                (analysts, None)
            }
            Err(detail) => {
                warn!("Error generating analysts: {}", detail);
                (Vec::new(), Some(format!("Error generating analysts: {detail}")))
            }
        }
    }

    async fn pause(&self, session_id: String, state: AnalystState) -> Result<AnalystOutcome, WorkflowError> {
        let value = serde_json::to_value(&state).map_err(|e| WorkflowError::Checkpoint {
            session_id: session_id.clone(),
            detail: e.to_string(),
        })?;
        self.store
            .save(&Checkpoint::new(&session_id, WORKFLOW, STEP_HUMAN_FEEDBACK, value))
            .await?;
        info!("Session {} paused for feedback", session_id);
        Ok(AnalystOutcome::Paused { session_id, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_lists_every_field() {
        let a = Analyst {
            affiliation: "MIT".into(),
            name: "Ada".into(),
            role: "Roboticist".into(),
            description: "Safety first.".into(),
        };
        assert_eq!(
            a.persona(),
            "Name: Ada\nRole: Roboticist\nAffiliation: MIT\nDescription: Safety first.\n"
        );
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"analysts\":[{\"affiliation\":\"A\",\"name\":\"N\",\"role\":\"R\",\"description\":\"D\"}]}\n```";
        let analysts = parse_analysts(reply).unwrap();
        assert_eq!(analysts.len(), 1);
        assert_eq!(analysts[0].name, "N");
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_analysts("Sure! Here are some analysts.").is_err());
        assert!(parse_analysts("} oops {").is_err());
        assert!(parse_analysts("{\"people\": []}").is_err());
    }
}
