//! Wire and domain data types exchanged with the service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A conversion script advertised by the service catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    pub id: String,
    pub nicename: String,
    pub description: String,
    #[serde(default)]
    pub homepage: Option<String>,
    pub href: String,
    #[serde(default)]
    pub inputs: Vec<InputDescriptor>,
    #[serde(default)]
    pub options: Vec<OptionDescriptor>,
}

/// A named input port a script accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub sequence: bool,
}

/// A named parameter a script accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub option_type: String,
    #[serde(default)]
    pub sequence: bool,
}

impl OptionDescriptor {
    /// Whether values of this option must be resolved as file/directory URIs.
    pub fn is_uri_typed(&self) -> bool {
        matches!(self.option_type.as_str(), "anyFileURI" | "anyDirURI")
    }
}

/// A request to run a script, assembled by a synthesized subcommand handler.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub script_id: String,
    pub nicename: Option<String>,
    pub inputs: HashMap<String, Vec<String>>,
    pub options: HashMap<String, Vec<String>>,
    pub payload: Option<Vec<u8>>,
    pub background: bool,
}

/// Job execution status, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Idle,
    Running,
    Done,
    Error,
    Valid,
}

impl JobStatus {
    /// Terminal statuses end polling; `Idle`/`Running` continue it.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Valid)
    }
}

impl std::fmt::Display for JobStatus {
    /// The server's own uppercase spelling (`DONE`, `ERROR`, ...), so
    /// printed status lines match what the service reports rather than
    /// Rust's derived debug spelling.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Idle => "IDLE",
            JobStatus::Running => "RUNNING",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
            JobStatus::Valid => "VALID",
        };
        f.write_str(s)
    }
}

/// A single message emitted by a running job, ordered by `sequence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sequence: u64,
    pub level: String,
    pub content: String,
}

impl std::fmt::Display for Message {
    /// `(sequence)[level]\tcontent`, matching the per-message echo shape
    /// commands print while a job is running.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})[{}]\t{}", self.sequence, self.level, self.content)
    }
}

/// A job snapshot as returned by a poll, carrying only messages newer than
/// the cursor that was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Facts negotiated during bring-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFacts {
    pub version: String,
    pub mode: String,
    pub authentication: bool,
}

impl ServerFacts {
    pub fn is_local(&self) -> bool {
        self.mode == "local"
    }
}

/// Per-status job counts, surfaced by the admin `sizes` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSizes {
    pub idle: u64,
    pub running: u64,
    pub done: u64,
    pub error: u64,
    pub total: u64,
}

/// A registered API client, as managed through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub secret: Option<String>,
    pub role: String,
    #[serde(default)]
    pub contact: Option<String>,
}

/// A server runtime property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub bundle: Option<String>,
}

/// A job's entry in the server's priority queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: String,
    pub computed_priority: f64,
    pub job_priority: f64,
    pub client_priority: f64,
    pub relative_time: f64,
    pub time_stamp: String,
}
