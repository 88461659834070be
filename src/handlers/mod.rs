pub mod genie;

use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/api/genie/sessions", web::post().to(genie::create_session))
        .route("/api/genie/sessions/{session_id}/ask", web::post().to(genie::ask))
        .route("/api/genie/sessions/{session_id}/history", web::get().to(genie::get_history))
        .route("/api/genie/sessions/{session_id}", web::delete().to(genie::close_session));
}
