use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::i18n::Locale;
use crate::models::{ConversationTurnResult, PollResult, QuestionOutcome, RenderedContent, Turn};
use crate::services::bridge;
use crate::services::genie::{ConversationApi, GenieClient};
use crate::services::poller::{await_completion, PollPolicy, Sleeper, TokioSleeper};
use crate::services::render::{render_error, render_payload, render_question};
use crate::state::SessionHandle;

/// Drives one question at a time from the pending slot to an answer turn.
/// Holds no session state; every call gets the session it works on.
pub struct Gateway {
    api: Arc<dyn ConversationApi>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl Gateway {
    pub fn new(api: Arc<dyn ConversationApi>, sleeper: Arc<dyn Sleeper>, policy: PollPolicy) -> Self {
        Gateway { api, sleeper, policy }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = GenieClient::new(config)?;
        Ok(Gateway::new(
            Arc::new(client),
            Arc::new(TokioSleeper),
            PollPolicy::from(config),
        ))
    }

    /// Submits `question` and runs the cycle that answers it. Only rejected
    /// submissions come back as `Err`; upstream trouble becomes an error turn.
    pub async fn ask(
        &self,
        session: &SessionHandle,
        question: &str,
    ) -> Result<ConversationTurnResult, GatewayError> {
        let _rerun = bridge::submit(session, question)?;
        self.run_cycle(session)
            .await
            .ok_or(GatewayError::QuestionInFlight)
    }

    /// One reaction cycle. Returns `None` when nothing was pending.
    pub async fn run_cycle(&self, session: &SessionHandle) -> Option<ConversationTurnResult> {
        let (question, conversation_id, locale, question_turn) = {
            let mut store = session.lock();
            let question = store.take_pending_question()?;
            let turn = Turn::user(render_question(&question));
            store.append_turn(turn.clone());
            (
                question,
                store.current_conversation_id().map(str::to_string),
                store.locale(),
                turn,
            )
        };
        let guard = CycleGuard {
            session: session.clone(),
            locale,
            settled: false,
        };

        let (answer, outcome) = match self.exchange(session, conversation_id, &question, locale).await {
            Ok(content) => (Turn::service(content), QuestionOutcome::Completed),
            Err(err) => {
                tracing::warn!(error = %err, "question ended without an answer");
                let outcome = match err {
                    GatewayError::Timeout { .. } => QuestionOutcome::TimedOut,
                    _ => QuestionOutcome::Failed,
                };
                (Turn::service_error(render_error(&err, locale)), outcome)
            }
        };

        let conversation_id = guard.settle(answer.clone());

        Some(ConversationTurnResult {
            conversation_id,
            question: question_turn,
            answer,
            outcome,
        })
    }

    async fn exchange(
        &self,
        session: &SessionHandle,
        conversation_id: Option<String>,
        question: &str,
        locale: Locale,
    ) -> Result<RenderedContent, GatewayError> {
        let (conversation_id, message_id) = match conversation_id {
            Some(id) => {
                let message_id = self.api.continue_conversation(&id, question).await?;
                (id, message_id)
            }
            None => {
                let started = self.api.start_conversation(question).await?;
                session.lock().set_conversation_id(started.conversation_id.clone());
                (started.conversation_id, started.message_id)
            }
        };

        let result = await_completion(
            self.api.as_ref(),
            self.sleeper.as_ref(),
            self.policy,
            &conversation_id,
            &message_id,
        )
        .await?;

        match result {
            PollResult::Completed(raw) => Ok(render_payload(&raw, locale)),
            PollResult::Failed(reason) => Err(GatewayError::UpstreamFailure(reason)),
            PollResult::Pending => Err(GatewayError::Timeout {
                attempts: self.policy.max_attempts,
            }),
        }
    }
}

/// Closes out a taken question. If the cycle is dropped before an answer is
/// recorded (client gone, caller timeout), the session still gets an error
/// turn and returns to `Idle`.
struct CycleGuard {
    session: SessionHandle,
    locale: Locale,
    settled: bool,
}

impl CycleGuard {
    fn settle(mut self, answer: Turn) -> Option<String> {
        self.settled = true;
        let mut store = self.session.lock();
        store.append_turn(answer);
        store.finish_question();
        store.current_conversation_id().map(str::to_string)
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("question cycle dropped before an answer arrived");
        let mut store = self.session.lock();
        store.append_turn(Turn::service_error(render_error(
            &GatewayError::Interrupted,
            self.locale,
        )));
        store.finish_question();
    }
}
