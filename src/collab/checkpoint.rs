//! Checkpoint persistence for paused workflows.
//!
//! A paused workflow saves a [`Checkpoint`] and returns. Resuming loads it
//! by session id, checks the resume point and continues from there.
//! [`FileCheckpointStore`] writes one JSON file per session with a
//! temp-file + rename so a crash never leaves a half-written checkpoint.

use crate::error::WorkflowError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Saved state of one paused session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    pub workflow: String,
    /// Name of the step to run on resume.
    pub next_step: String,
    pub saved_at: DateTime<Utc>,
    pub state: serde_json::Value,
}

impl Checkpoint {
    pub fn new(
        session_id: impl Into<String>,
        workflow: impl Into<String>,
        next_step: impl Into<String>,
        state: serde_json::Value,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            workflow: workflow.into(),
            next_step: next_step.into(),
            saved_at: Utc::now(),
            state,
        }
    }
}

/// Fresh random session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite the checkpoint for `checkpoint.session_id`.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WorkflowError>;

    /// `Ok(None)` when no checkpoint exists for the session.
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, WorkflowError>;

    /// Removing an unknown session is not an error.
    async fn remove(&self, session_id: &str) -> Result<(), WorkflowError>;
}

/// Process-local store; checkpoints vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    inner: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
        session_id: &str,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Checkpoint>>, WorkflowError> {
        self.inner.lock().map_err(|_| WorkflowError::Checkpoint {
            session_id: session_id.to_string(),
            detail: "store lock poisoned".into(),
        })
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WorkflowError> {
        self.lock(&checkpoint.session_id)?
            .insert(checkpoint.session_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, WorkflowError> {
        Ok(self.lock(session_id)?.get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> Result<(), WorkflowError> {
        self.lock(session_id)?.remove(session_id);
        Ok(())
    }
}

/// One `<session_id>.json` file per session under `dir`.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Session ids become file names, so only a safe alphabet is accepted.
    fn path_for(&self, session_id: &str) -> Result<PathBuf, WorkflowError> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(WorkflowError::Checkpoint {
                session_id: session_id.to_string(),
                detail: "invalid session id".into(),
            });
        }
        Ok(self.dir.join(format!("{session_id}.json")))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WorkflowError> {
        let session_id = checkpoint.session_id.as_str();
        let failed = |detail: String| WorkflowError::Checkpoint {
            session_id: session_id.to_string(),
            detail,
        };
        let path = self.path_for(session_id)?;
        let json = serde_json::to_vec_pretty(checkpoint).map_err(|e| failed(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| failed(format!("create {}: {e}", self.dir.display())))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| failed(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| failed(format!("rename to {}: {e}", path.display())))?;

        debug!("Checkpoint saved: {}", path.display());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, WorkflowError> {
        let path = self.path_for(session_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(WorkflowError::Checkpoint {
                    session_id: session_id.to_string(),
                    detail: format!("read {}: {e}", path.display()),
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| WorkflowError::Checkpoint {
                session_id: session_id.to_string(),
                detail: format!("corrupt checkpoint: {e}"),
            })
    }

    async fn remove(&self, session_id: &str) -> Result<(), WorkflowError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkflowError::Checkpoint {
                session_id: session_id.to_string(),
                detail: format!("remove {}: {e}", path.display()),
            }),
        }
    }
}
