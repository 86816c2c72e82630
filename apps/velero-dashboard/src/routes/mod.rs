pub mod backups;
pub mod dashboard;
pub mod health;
pub mod locations;
pub mod login;
pub mod restores;
pub mod schedules;

use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::{Json, Router};

use crate::auth::{require_session, Identity};
use crate::document::VeleroDocument;
use crate::error::AppResult;
use crate::state::AppState;
use crate::velero::validate_resource_name;
use crate::{openapi, static_assets, views};

/// Structured listing, passed through as JSON.
pub(crate) async fn structured_json(
    state: &AppState,
    subcommand: &str,
) -> AppResult<Json<VeleroDocument>> {
    let document = state.velero.structured(subcommand).await?;
    Ok(Json(VeleroDocument(document)))
}

/// Text output of `<verb> <name>`, returned verbatim.
pub(crate) async fn text_output(state: &AppState, verb: &str, name: &str) -> AppResult<String> {
    let name = validate_resource_name(name)?;
    let output = state.velero.text(&format!("{verb} {name}")).await?;
    Ok(output)
}

/// Runs a write through velero. The exit status decides the outcome; output is only logged.
pub(crate) async fn run_action(state: &AppState, identity: &Identity, subcommand: &str) -> bool {
    match state.velero.text(subcommand).await {
        Ok(output) => {
            tracing::info!(
                command = %subcommand,
                user = %identity.display_name(),
                output = %output.trim(),
                "velero action succeeded"
            );
            true
        }
        Err(err) => {
            tracing::warn!(command = %subcommand, error = %err, "velero action failed");
            false
        }
    }
}

async fn not_found() -> Response {
    views::not_found_page()
}

pub fn router(state: AppState) -> anyhow::Result<Router> {
    let protected = Router::new()
        .merge(dashboard::router())
        .merge(backups::router())
        .merge(restores::router())
        .merge(schedules::router())
        .merge(locations::router())
        .merge(openapi::router())
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let app = Router::new()
        .merge(health::router())
        .merge(login::router())
        .merge(protected)
        .merge(static_assets::router(state.config.static_root.clone())?)
        .fallback(not_found)
        .with_state(state);
    Ok(app)
}
