use serde::{Deserialize, Serialize};

/// Marked-up display fragment. Fragments concatenate in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedContent(String);

impl RenderedContent {
    pub fn new(markup: impl Into<String>) -> Self {
        RenderedContent(markup.into())
    }

    pub fn push(&mut self, other: &RenderedContent) {
        self.0.push_str(&other.0);
    }

    pub fn push_str(&mut self, markup: &str) {
        self.0.push_str(markup);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RenderedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: RenderedContent,
    pub is_error: bool,
    pub timestamp: String,
}

impl Turn {
    pub fn user(content: RenderedContent) -> Self {
        Self::build(Role::User, content, false)
    }

    pub fn service(content: RenderedContent) -> Self {
        Self::build(Role::Service, content, false)
    }

    pub fn service_error(content: RenderedContent) -> Self {
        Self::build(Role::Service, content, true)
    }

    fn build(role: Role, content: RenderedContent, is_error: bool) -> Self {
        Turn {
            role,
            content,
            is_error,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Where a single question currently sits. `Idle` is both the start and the
/// resting state between questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionState {
    #[default]
    Idle,
    Pending,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    Completed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurnResult {
    pub conversation_id: Option<String>,
    pub question: Turn,
    pub answer: Turn,
    pub outcome: QuestionOutcome,
}
