//! Waits for a submitted message to reach a terminal status.
//!
//! The policy is a fixed interval with a hard bound on the number of checks:
//! sleep, check, repeat. `COMPLETED` and `FAILED` end the loop; every other
//! status, and a status check that itself failed to go through, is another
//! round. Running out of rounds is a [`GatewayError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GatewayConfig, DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL_SECS};
use crate::error::GatewayError;
use crate::models::PollResult;
use crate::services::genie::ConversationApi;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_POLLS,
        }
    }
}

impl From<&GatewayConfig> for PollPolicy {
    fn from(config: &GatewayConfig) -> Self {
        PollPolicy {
            interval: config.poll_interval,
            max_attempts: config.max_polls,
        }
    }
}

#[derive(Debug)]
pub enum PollStep {
    Wait,
    Done(Result<PollResult, GatewayError>),
}

/// Counts checks and decides after each one whether to keep waiting.
#[derive(Debug)]
pub struct CompletionPoll {
    policy: PollPolicy,
    attempts: u32,
}

impl CompletionPoll {
    pub fn new(policy: PollPolicy) -> Self {
        CompletionPoll { policy, attempts: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn record(&mut self, check: Result<PollResult, GatewayError>) -> PollStep {
        self.attempts += 1;
        match check {
            Ok(PollResult::Pending) | Err(_) if self.attempts < self.policy.max_attempts => {
                PollStep::Wait
            }
            Ok(PollResult::Pending) | Err(_) => PollStep::Done(Err(GatewayError::Timeout {
                attempts: self.attempts,
            })),
            Ok(terminal) => PollStep::Done(Ok(terminal)),
        }
    }
}

/// Returns `Completed` or `Failed`; never `Pending`.
pub async fn await_completion(
    api: &dyn ConversationApi,
    sleeper: &dyn Sleeper,
    policy: PollPolicy,
    conversation_id: &str,
    message_id: &str,
) -> Result<PollResult, GatewayError> {
    let mut poll = CompletionPoll::new(policy);
    loop {
        sleeper.sleep(policy.interval).await;

        let check = api
            .message_status(conversation_id, message_id)
            .await
            .map(|resp| {
                tracing::debug!(
                    conversation_id,
                    message_id,
                    attempt = poll.attempts() + 1,
                    status = %resp.status,
                    "polled Genie message"
                );
                PollResult::from(resp)
            });
        if let Err(err) = &check {
            tracing::warn!(
                conversation_id,
                message_id,
                attempt = poll.attempts() + 1,
                error = %err,
                "status check failed, will retry"
            );
        }

        match poll.record(check) {
            PollStep::Wait => continue,
            PollStep::Done(result) => {
                tracing::info!(conversation_id, message_id, attempts = poll.attempts(), "polling finished");
                return result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{CountingSleeper, ScriptedApi};
    use serde_json::json;

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts,
        }
    }

    #[test]
    fn test_state_machine_stops_on_terminal() {
        let mut poll = CompletionPoll::new(policy(5));
        assert!(matches!(poll.record(Ok(PollResult::Pending)), PollStep::Wait));
        assert!(matches!(
            poll.record(Err(GatewayError::transport(Some(502), "bad gateway"))),
            PollStep::Wait
        ));
        match poll.record(Ok(PollResult::Failed("boom".into()))) {
            PollStep::Done(Ok(PollResult::Failed(reason))) => assert_eq!(reason, "boom"),
            other => panic!("unexpected step: {other:?}"),
        }
        assert_eq!(poll.attempts(), 3);
    }

    #[test]
    fn test_state_machine_times_out_at_bound() {
        let mut poll = CompletionPoll::new(policy(2));
        assert!(matches!(poll.record(Ok(PollResult::Pending)), PollStep::Wait));
        assert!(matches!(
            poll.record(Ok(PollResult::Pending)),
            PollStep::Done(Err(GatewayError::Timeout { attempts: 2 }))
        ));
    }

    #[tokio::test]
    async fn test_completes_after_three_checks() {
        let api = ScriptedApi::with_statuses(vec![
            json!({"status": "PENDING"}),
            json!({"status": "PENDING"}),
            json!({"status": "COMPLETED", "attachments": [{"text": {"content": "42"}}]}),
        ]);
        let sleeper = CountingSleeper::default();

        let result = await_completion(&api, &sleeper, PollPolicy::default(), "c1", "m1")
            .await
            .unwrap();

        assert_eq!(
            result,
            PollResult::Completed(vec![json!({"text": {"content": "42"}})])
        );
        assert_eq!(api.status_checks(), 3);
        assert_eq!(sleeper.count(), 3);
        assert_eq!(sleeper.total(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_times_out_after_ninety_checks() {
        let api = ScriptedApi::never_finishing();
        let sleeper = CountingSleeper::default();

        let err = await_completion(&api, &sleeper, PollPolicy::default(), "c1", "m1")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Timeout { attempts: 90 }));
        assert_eq!(api.status_checks(), 90);
        assert_eq!(sleeper.count(), 90);
    }

    #[tokio::test]
    async fn test_failed_status_stops_immediately() {
        let api = ScriptedApi::with_statuses(vec![
            json!({"status": "IN_PROGRESS"}),
            json!({"status": "FAILED", "error": "warehouse stopped"}),
            json!({"status": "COMPLETED"}),
        ]);
        let sleeper = CountingSleeper::default();

        let result = await_completion(&api, &sleeper, PollPolicy::default(), "c1", "m1")
            .await
            .unwrap();

        assert_eq!(result, PollResult::Failed("warehouse stopped".into()));
        assert_eq!(api.status_checks(), 2);
    }
}
