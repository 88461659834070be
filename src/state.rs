use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::DEFAULT_SESSION_IDLE_SECS;
use crate::error::GatewayError;
use crate::i18n::Locale;
use crate::models::{QuestionState, Turn};
use crate::services::gateway::Gateway;

pub type SessionId = String;

/// Everything one dashboard session knows about its Genie conversation.
///
/// The conversation id is assigned once, history only grows, and at most one
/// question is pending or in flight at a time.
#[derive(Debug, Default)]
pub struct SessionStore {
    conversation_id: Option<String>,
    turns: Vec<Turn>,
    pending: Option<String>,
    state: QuestionState,
    locale: Locale,
}

impl SessionStore {
    pub fn new(locale: Locale) -> Self {
        SessionStore {
            locale,
            ..Default::default()
        }
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Returns false, leaving the stored id alone, if one was already set.
    pub fn set_conversation_id(&mut self, id: impl Into<String>) -> bool {
        if self.conversation_id.is_some() {
            return false;
        }
        self.conversation_id = Some(id.into());
        true
    }

    pub fn append_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn state(&self) -> QuestionState {
        self.state
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_pending_question(&mut self, text: impl Into<String>) -> Result<(), GatewayError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyQuestion);
        }
        if self.state != QuestionState::Idle {
            return Err(GatewayError::QuestionInFlight);
        }
        self.pending = Some(text);
        self.state = QuestionState::Pending;
        Ok(())
    }

    /// Read-and-clear. The taken question moves to `InFlight` until
    /// [`SessionStore::finish_question`] is called.
    pub fn take_pending_question(&mut self) -> Option<String> {
        let question = self.pending.take()?;
        self.state = QuestionState::InFlight;
        Some(question)
    }

    pub fn finish_question(&mut self) {
        self.state = QuestionState::Idle;
    }
}

/// Shared handle to one session's store. The lock is only ever held for
/// short, await-free sections.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<Mutex<SessionStore>>);

impl SessionHandle {
    pub fn new(locale: Locale) -> Self {
        SessionHandle(Arc::new(Mutex::new(SessionStore::new(locale))))
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Session registry plus the shared gateway. Sessions nobody has touched for
/// `idle_timeout` are dropped the next time the registry is consulted; a
/// session with a question pending or in flight is never dropped.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
    idle_timeout: Duration,
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            gateway: Arc::new(gateway),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Locks the registry after sweeping out idle sessions.
    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() < self.idle_timeout
                || entry.handle.lock().state() != QuestionState::Idle
        });
        if sessions.len() < before {
            tracing::info!(evicted = before - sessions.len(), "dropped idle Genie sessions");
        }
        sessions
    }

    pub fn open_session(&self, locale: Locale) -> (SessionId, SessionHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = SessionHandle::new(locale);
        self.sessions().insert(
            id.clone(),
            SessionEntry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        (id, handle)
    }

    pub fn session(&self, id: &str) -> Result<SessionHandle, GatewayError> {
        let mut sessions = self.sessions();
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| GatewayError::SessionNotFound(id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.handle.clone())
    }

    pub fn close_session(&self, id: &str) -> bool {
        self.sessions().remove(id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderedContent;
    use crate::services::poller::PollPolicy;
    use crate::services::testing::{CountingSleeper, ScriptedApi};

    fn app_state(idle_timeout: Duration) -> AppState {
        let gateway = Gateway::new(
            Arc::new(ScriptedApi::default()),
            Arc::new(CountingSleeper::default()),
            PollPolicy::default(),
        );
        AppState::new(gateway).with_idle_timeout(idle_timeout)
    }

    #[test]
    fn test_idle_session_expires() {
        let state = app_state(Duration::from_millis(20));
        let (id, _) = state.open_session(Locale::En);
        assert!(state.session(&id).is_ok());

        std::thread::sleep(Duration::from_millis(50));

        assert!(matches!(
            state.session(&id),
            Err(GatewayError::SessionNotFound(missing)) if missing == id
        ));
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_busy_session_survives_sweep() {
        let state = app_state(Duration::from_millis(20));
        let (id, handle) = state.open_session(Locale::En);
        handle.lock().set_pending_question("still waiting").unwrap();

        std::thread::sleep(Duration::from_millis(50));
        let (other, _) = state.open_session(Locale::En);

        assert!(state.session(&id).is_ok());
        assert!(state.session(&other).is_ok());
    }

    #[test]
    fn test_close_session_removes_entry() {
        let state = app_state(Duration::from_secs(60));
        let (id, _) = state.open_session(Locale::En);
        assert!(state.session(&id).is_ok());
        assert!(state.close_session(&id));
        assert!(!state.close_session(&id));
    }

    #[test]
    fn test_take_pending_is_read_and_clear() {
        let mut store = SessionStore::default();
        store.set_pending_question("How many cases?").unwrap();
        assert_eq!(store.state(), QuestionState::Pending);

        assert_eq!(store.take_pending_question().as_deref(), Some("How many cases?"));
        assert_eq!(store.take_pending_question(), None);
        assert_eq!(store.state(), QuestionState::InFlight);
    }

    #[test]
    fn test_second_question_rejected_until_finished() {
        let mut store = SessionStore::default();
        store.set_pending_question("first").unwrap();
        assert!(matches!(
            store.set_pending_question("second"),
            Err(GatewayError::QuestionInFlight)
        ));

        store.take_pending_question();
        assert!(matches!(
            store.set_pending_question("second"),
            Err(GatewayError::QuestionInFlight)
        ));

        store.finish_question();
        assert!(store.set_pending_question("second").is_ok());
    }

    #[test]
    fn test_blank_question_rejected() {
        let mut store = SessionStore::default();
        assert!(matches!(
            store.set_pending_question("  \n"),
            Err(GatewayError::EmptyQuestion)
        ));
        assert_eq!(store.state(), QuestionState::Idle);
    }

    #[test]
    fn test_conversation_id_set_once() {
        let mut store = SessionStore::default();
        assert_eq!(store.current_conversation_id(), None);
        assert!(store.set_conversation_id("c1"));
        assert!(!store.set_conversation_id("c2"));
        assert_eq!(store.current_conversation_id(), Some("c1"));
    }

    #[test]
    fn test_history_keeps_insertion_order() {
        let handle = SessionHandle::new(Locale::En);
        handle.lock().append_turn(Turn::user(RenderedContent::new("q")));
        handle.lock().append_turn(Turn::service(RenderedContent::new("a")));

        let store = handle.lock();
        let contents: Vec<&str> = store.history().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q", "a"]);
    }
}
