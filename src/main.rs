mod app;
mod auth;
mod collections;
mod config;
mod error;
mod extract;
mod profile;
mod state;
mod users;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "travel_assistant=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init()?;
    let (host, port) = (app_state.config.host.clone(), app_state.config.port);
    tracing::info!(static_dir = %app_state.config.static_dir.display(), "serving static pages");

    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
