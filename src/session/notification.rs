use serde::Serialize;

/// Server → client message on a session's channel.
///
/// Serialized with a `type` discriminator, e.g.
/// `{"type":"progress","progress":42.5}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// First message on every channel
    ConnectionAck { session_id: String },
    /// Job entered `preparing`
    Status { message: String },
    /// Download progress, 0..=100
    Progress { progress: f64 },
    /// Terminal success
    Completed { data: CompletedData },
    /// Terminal failure
    Failed { message: String },
}

/// Where to fetch a finished artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedData {
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    pub filename: String,
}

impl Notification {
    /// `completed` and `failed` end a job; nothing follows them for that job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Notification::Completed { .. } | Notification::Failed { .. })
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys: serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
