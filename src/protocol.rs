//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::coach::CoachReply;
use crate::domain::ScoreReport;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartSession {
        #[serde(rename = "textType")]
        text_type: Option<String>,
    },
    Sample {
        #[serde(rename = "sessionId")]
        session_id: String,
        content: String,
        #[serde(rename = "elapsedSeconds")]
        elapsed_seconds: u64,
    },
    Grade {
        #[serde(rename = "essayText")]
        essay_text: String,
        #[serde(rename = "textType")]
        text_type: Option<String>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    SessionStarted {
        #[serde(rename = "sessionId")]
        session_id: String,
        greeting: String,
    },
    /// A coaching message for an accepted sample.
    Coach {
        reply: CoachReply,
    },
    /// The sampling gate suppressed this sample; nothing to show.
    Quiet,
    Report {
        report: ScoreReport,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

/// Only used for the unrecoverable 500 path.
#[derive(Serialize)]
pub struct ServerErrorOut {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionStartIn {
    #[serde(rename = "textType")]
    pub text_type: Option<String>,
}

#[derive(Serialize)]
pub struct SessionStartOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub greeting: String,
}

#[derive(Debug, Deserialize)]
pub struct SampleIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub content: String,
    #[serde(rename = "elapsedSeconds")]
    pub elapsed_seconds: u64,
}

#[derive(Serialize)]
pub struct SampleOut {
    pub quiet: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<CoachReply>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
