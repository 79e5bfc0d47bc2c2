use async_trait::async_trait;
use polyjudge_core::Language;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Judge0 returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Submission {token} still pending after {attempts} polls")]
    Timeout { token: String, attempts: u32 },

    #[error("Failed to start {program}: {source}")]
    Toolchain {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Judge0 status ids the pipeline cares about
pub mod status {
    pub const IN_QUEUE: u32 = 1;
    pub const PROCESSING: u32 = 2;
    pub const ACCEPTED: u32 = 3;
    pub const TIME_LIMIT_EXCEEDED: u32 = 5;
    pub const COMPILATION_ERROR: u32 = 6;
    pub const RUNTIME_ERROR: u32 = 11;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

impl ExecutionStatus {
    pub fn new(id: u32, description: &str) -> Self {
        Self {
            id,
            description: description.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.id, status::IN_QUEUE | status::PROCESSING)
    }

    pub fn is_accepted(&self) -> bool {
        self.id == status::ACCEPTED
    }
}

/// Result of one sandboxed run, shaped like a Judge0 submission record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<ExecutionStatus>,
    /// Wall time in seconds, as Judge0 reports it
    #[serde(default)]
    pub time: Option<String>,
    /// Peak memory in kilobytes
    #[serde(default)]
    pub memory: Option<u64>,
}

impl ExecutionOutcome {
    pub fn status_id(&self) -> Option<u32> {
        self.status.as_ref().map(|s| s.id)
    }

    /// A record without a status has not been picked up yet
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(ExecutionStatus::is_terminal)
    }
}

/// Something that can run one program with one stdin and report back
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn submit(&self, language: Language, source: &str, stdin: &str) -> Result<ExecutionOutcome>;
}
