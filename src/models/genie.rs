use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ContentRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StartConversationResponse {
    pub conversation: ConversationRef,
    pub message: MessageRef,
}

#[derive(Debug, Deserialize)]
pub struct ConversationRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    #[serde(alias = "message_id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of a status check. Attachments stay loosely typed here so one bad
/// item cannot fail deserialization of the whole message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageStatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attachments: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Anything other than COMPLETED or FAILED, including statuses this gateway
/// has never seen, counts as still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Pending,
    Completed,
    Failed,
}

impl MessageStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => MessageStatus::Completed,
            "FAILED" => MessageStatus::Failed,
            _ => MessageStatus::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != MessageStatus::Pending
    }
}

/// What one status check amounted to. Only the poller looks at `Pending`.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    Completed(Vec<Value>),
    Failed(String),
    Pending,
}

impl From<MessageStatusResponse> for PollResult {
    fn from(resp: MessageStatusResponse) -> Self {
        let status = MessageStatus::parse(&resp.status);
        if !status.is_terminal() {
            return PollResult::Pending;
        }
        if status == MessageStatus::Failed {
            return PollResult::Failed(failure_reason(resp.error.as_ref()));
        }
        PollResult::Completed(resp.attachments.unwrap_or_default())
    }
}

fn failure_reason(error: Option<&Value>) -> String {
    let reason = match error {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(map)) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "unknown error".to_string())
}
