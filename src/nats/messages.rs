use serde::{Deserialize, Serialize};

/// Transcript message received from STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    pub confidence: f32,
    /// Lower-ranked hypotheses, if the STT service produces them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

/// Finalized utterance sent to the command handler
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandMessage {
    pub session_id: String,
    pub text: String,
    pub timestamp: String, // RFC3339 timestamp
}

/// Bare wake phrase notification sent to the greeting handler
#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingMessage {
    pub session_id: String,
    pub timestamp: String,
}

/// Reply from a command or greeting handler. An empty reply counts as success.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DispatchReply {
    #[serde(default)]
    pub error: Option<String>,
}
