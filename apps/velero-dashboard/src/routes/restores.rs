use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::SignedCookieJar;

use crate::auth::{require_role, Identity, Role};
use crate::flash::{self, Flash};
use crate::velero::validate_resource_name;

use crate::document::VeleroDocument;
use crate::error::AppResult;
use crate::routes::{run_action, structured_json, text_output};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/restore/get",
    tag = "restores",
    responses(
        (status = 200, description = "Output of `velero restore get -o json`", body = VeleroDocument),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn get_restores(State(state): State<AppState>) -> AppResult<Json<VeleroDocument>> {
    structured_json(&state, "restore get").await
}

#[utoipa::path(
    get,
    path = "/restore/describe/{name}",
    tag = "restores",
    params(("name" = String, Path, description = "Restore name")),
    responses(
        (status = 200, description = "Output of `velero restore describe`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid restore name")
    )
)]
pub(crate) async fn describe_restore(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<String> {
    text_output(&state, "restore describe", &name).await
}

#[utoipa::path(
    get,
    path = "/restore/logs/{name}",
    tag = "restores",
    params(("name" = String, Path, description = "Restore name")),
    responses(
        (status = 200, description = "Output of `velero restore logs`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid restore name")
    )
)]
pub(crate) async fn restore_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<String> {
    text_output(&state, "restore logs", &name).await
}

/// Starts a restore of `backup`; velero names the restore after the backup and a timestamp.
pub(crate) async fn create_restore(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Path(backup): Path<String>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    require_role(&identity, Role::Operator)?;
    let backup = validate_resource_name(&backup)?;

    let command = format!("restore create --from-backup {backup}");
    let notice = if run_action(&state, &identity, &command).await {
        Flash::success(format!("Restore from {backup} requested"))
    } else {
        Flash::error("Restore cannot be created")
    };
    Ok((flash::push(jar, &notice), Redirect::to("/backups")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restore/get", get(get_restores))
        .route("/restore/describe/{name}", get(describe_restore))
        .route("/restore/logs/{name}", get(restore_logs))
        .route("/restore/create/{backup}", post(create_restore))
}
