use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use genie_gateway::config::{self, GatewayConfig};
use genie_gateway::{handlers, AppState, Gateway};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, port) = match GatewayConfig::from_env()
        .and_then(|cfg| config::server_port().map(|port| (cfg, port)))
    {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::error!(error = %err, "Genie gateway is not configured");
            std::process::exit(1);
        }
    };
    let gateway = match Gateway::from_config(&config) {
        Ok(gateway) => gateway,
        Err(err) => {
            tracing::error!(error = %err, "Genie gateway is not configured");
            std::process::exit(1);
        }
    };

    let app_state =
        web::Data::new(AppState::new(gateway).with_idle_timeout(config.session_idle_timeout));
    tracing::info!(port, "starting Genie gateway");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .configure(handlers::routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
