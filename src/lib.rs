pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::providers;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    tracing::debug!(prompt = %settings.rubric().prompt(), "Loaded grading prompt");

    let upload_dir = &settings.storage().upload_dir;
    tokio::fs::create_dir_all(upload_dir).await.map_err(|err| {
        anyhow::anyhow!("failed to create upload dir {}: {err}", upload_dir.display())
    })?;

    let provider = providers::from_settings(&settings)?;
    let state = AppState::new(settings, provider);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        provider = state.provider().name(),
        "Sketch grader listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}
