use chrono::{DateTime, Local};
use thiserror::Error;

use crate::types::{ProjectId, SessionId};

/// Why a store operation did not happen. None of these are fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project name cannot be empty")]
    EmptyName,
    #[error("Project not found ({0})")]
    ProjectNotFound(ProjectId),
    #[error("Session not found ({session_id} in project {project_id})")]
    SessionNotFound {
        project_id: ProjectId,
        session_id: SessionId,
    },
    #[error("End time must be after start time")]
    InvalidRange {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    #[error("No timer is running for project {0}")]
    NoRunningSession(ProjectId),
    #[error("Session {0} is still running, stop it before editing its end time")]
    SessionRunning(SessionId),
    #[error("Failed to save projects: {0:#}")]
    Storage(anyhow::Error),
}
