//! Hand-off point between the chat widget and the gateway driver.
//!
//! The widget is rebuilt on every interaction and cannot hold a request open,
//! so it only drops its question into the session's pending slot. The slot
//! holds one question; the driver drains it on the next cycle.

use crate::error::GatewayError;
use crate::state::SessionHandle;

/// Returned by [`submit`]: the host has to run a gateway cycle for this session.
#[derive(Debug)]
#[must_use = "a submitted question is only answered by the next gateway cycle"]
pub struct Rerun;

pub fn submit(session: &SessionHandle, question: &str) -> Result<Rerun, GatewayError> {
    session.lock().set_pending_question(question.trim())?;
    tracing::debug!("question queued for next cycle");
    Ok(Rerun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::models::QuestionState;

    #[test]
    fn test_submit_queues_trimmed_question() {
        let session = SessionHandle::new(Locale::En);
        let _ = submit(&session, "  deaths by region \n").unwrap();

        let mut store = session.lock();
        assert_eq!(store.state(), QuestionState::Pending);
        assert_eq!(store.take_pending_question().as_deref(), Some("deaths by region"));
    }

    #[test]
    fn test_submit_rejects_second_question() {
        let session = SessionHandle::new(Locale::En);
        let _ = submit(&session, "one").unwrap();
        assert!(matches!(
            submit(&session, "two"),
            Err(GatewayError::QuestionInFlight)
        ));
        assert!(matches!(submit(&session, ""), Err(GatewayError::EmptyQuestion)));
    }
}
