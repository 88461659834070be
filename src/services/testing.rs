//! In-process doubles for the conversation API and the poll clock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::models::MessageStatusResponse;
use crate::services::genie::{ConversationApi, StartedConversation};
use crate::services::poller::Sleeper;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start { question: String },
    Continue { conversation_id: String, question: String },
    Status { conversation_id: String, message_id: String },
}

/// Answers status checks from a script, then reports `PENDING` forever.
#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<Call>>,
    statuses: Mutex<VecDeque<Result<Value, GatewayError>>>,
    initiate_errors: Mutex<VecDeque<GatewayError>>,
    messages: Mutex<u32>,
}

impl ScriptedApi {
    pub fn with_statuses(statuses: Vec<Value>) -> Self {
        let api = ScriptedApi::default();
        api.push_statuses(statuses);
        api
    }

    pub fn never_finishing() -> Self {
        ScriptedApi::default()
    }

    pub fn push_statuses(&self, statuses: Vec<Value>) {
        self.statuses.lock().unwrap().extend(statuses.into_iter().map(Ok));
    }

    pub fn push_status_error(&self, err: GatewayError) {
        self.statuses.lock().unwrap().push_back(Err(err));
    }

    pub fn fail_next_initiate(&self, err: GatewayError) {
        self.initiate_errors.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Status { .. }))
            .count()
    }

    fn next_message_id(&self) -> String {
        let mut n = self.messages.lock().unwrap();
        *n += 1;
        format!("msg-{}", *n)
    }
}

#[async_trait]
impl ConversationApi for ScriptedApi {
    async fn start_conversation(&self, question: &str) -> Result<StartedConversation, GatewayError> {
        self.calls.lock().unwrap().push(Call::Start {
            question: question.to_string(),
        });
        if let Some(err) = self.initiate_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(StartedConversation {
            conversation_id: "conv-1".to_string(),
            message_id: self.next_message_id(),
        })
    }

    async fn continue_conversation(
        &self,
        conversation_id: &str,
        question: &str,
    ) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(Call::Continue {
            conversation_id: conversation_id.to_string(),
            question: question.to_string(),
        });
        if let Some(err) = self.initiate_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.next_message_id())
    }

    async fn message_status(
        &self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<MessageStatusResponse, GatewayError> {
        self.calls.lock().unwrap().push(Call::Status {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
        });
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"status": "PENDING"})));
        next.map(|body| serde_json::from_value(body).unwrap())
    }
}

#[derive(Default)]
pub struct CountingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl CountingSleeper {
    pub fn count(&self) -> usize {
        self.naps.lock().unwrap().len()
    }

    pub fn total(&self) -> Duration {
        self.naps.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.naps.lock().unwrap().push(duration);
    }
}
