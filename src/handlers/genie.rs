use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::i18n;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn create_session(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let locale = i18n::detect_locale(&req);
    let (session_id, _) = state.open_session(locale);
    tracing::info!(%session_id, ?locale, "opened Genie session");

    HttpResponse::Created().json(json!({
        "session_id": session_id,
        "locale": locale,
    }))
}

/// One reaction cycle: queue the question, answer it, hand back the history.
pub async fn ask(
    path: web::Path<String>,
    data: web::Json<AskRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let session_id = path.into_inner();
    let session = state.session(&session_id)?;

    let result = state.gateway.ask(&session, &data.question).await?;

    let store = session.lock();
    Ok(HttpResponse::Ok().json(json!({
        "session_id": session_id,
        "result": result,
        "conversation_id": store.current_conversation_id(),
        "turns": store.history(),
    })))
}

pub async fn get_history(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let session_id = path.into_inner();
    let session = state.session(&session_id)?;

    let store = session.lock();
    Ok(HttpResponse::Ok().json(json!({
        "session_id": session_id,
        "conversation_id": store.current_conversation_id(),
        "state": store.state(),
        "turns": store.history(),
        "count": store.history().len(),
    })))
}

pub async fn close_session(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let session_id = path.into_inner();
    if !state.close_session(&session_id) {
        return Err(GatewayError::SessionNotFound(session_id));
    }
    tracing::info!(%session_id, "closed Genie session");
    Ok(HttpResponse::NoContent().finish())
}
