use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use axum_extra::extract::SignedCookieJar;

use crate::auth::{require_role, Identity, Role};
use crate::document::VeleroDocument;
use crate::error::AppResult;
use crate::flash::{self, Flash};
use crate::normalize::normalize_all;
use crate::routes::{run_action, structured_json, text_output};
use crate::state::AppState;
use crate::velero::validate_resource_name;
use crate::views::{self, BackupIndexTemplate, BackupRow};

/// What `velero backup delete` prints once the deletion request is accepted.
const DELETE_SUBMITTED: &str = "submitted successfully";

pub(crate) fn delete_submitted(output: &str) -> bool {
    output.contains(DELETE_SUBMITTED)
}

pub(crate) async fn backups_index(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let document = state.velero.structured("backup get").await?;
    let records = normalize_all(&document)?;
    tracing::debug!(count = records.len(), "listed backups");

    let (jar, flash) = flash::take(jar);
    let page = BackupIndexTemplate {
        user: identity.display_name().to_string(),
        page: "backup",
        backups: records.iter().map(BackupRow::from).collect(),
        flash,
    };
    Ok((jar, views::render(&page)?))
}

#[utoipa::path(
    get,
    path = "/backup/get",
    tag = "backups",
    responses(
        (status = 200, description = "Output of `velero backup get -o json`", body = VeleroDocument),
        (status = 303, description = "Not signed in; redirect to /login"),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn get_backups(State(state): State<AppState>) -> AppResult<Json<VeleroDocument>> {
    structured_json(&state, "backup get").await
}

#[utoipa::path(
    get,
    path = "/backup/describe/{name}",
    tag = "backups",
    params(("name" = String, Path, description = "Backup name")),
    responses(
        (status = 200, description = "Output of `velero backup describe`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid backup name")
    )
)]
pub(crate) async fn describe_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<String> {
    text_output(&state, "backup describe", &name).await
}

#[utoipa::path(
    get,
    path = "/backup/logs/{name}",
    tag = "backups",
    params(("name" = String, Path, description = "Backup name")),
    responses(
        (status = 200, description = "Output of `velero backup logs`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid backup name")
    )
)]
pub(crate) async fn backup_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<String> {
    text_output(&state, "backup logs", &name).await
}

/// Always redirects to the backups page; the outcome travels as a flash notice.
pub(crate) async fn delete_backup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Path(name): Path<String>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    require_role(&identity, Role::Operator)?;
    let name = validate_resource_name(&name)?;

    let notice = match state
        .velero
        .text(&format!("backup delete {name} --confirm"))
        .await
    {
        Ok(output) if delete_submitted(&output) => {
            tracing::info!(backup = %name, user = %identity.display_name(), "backup deletion submitted");
            Flash::success("Backup successful delete")
        }
        Ok(output) => {
            tracing::warn!(backup = %name, output = %output.trim(), "backup deletion not confirmed");
            Flash::error("Backup cannot be deleted")
        }
        Err(err) => {
            tracing::warn!(backup = %name, error = %err, "backup deletion failed");
            Flash::error("Backup cannot be deleted")
        }
    };

    Ok((flash::push(jar, &notice), Redirect::to("/backups")))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct CreateBackupForm {
    name: String,
    #[serde(default)]
    from_schedule: Option<String>,
}

/// `velero backup create`, optionally copying the template of an existing schedule.
pub(crate) fn create_backup_command(form: &CreateBackupForm) -> AppResult<String> {
    let name = validate_resource_name(form.name.trim())?;
    let schedule = form
        .from_schedule
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    match schedule {
        Some(schedule) => {
            let schedule = validate_resource_name(schedule)?;
            Ok(format!("backup create {name} --from-schedule {schedule}"))
        }
        None => Ok(format!("backup create {name}")),
    }
}

pub(crate) async fn create_backup(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Form(form): Form<CreateBackupForm>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    require_role(&identity, Role::Operator)?;
    let command = create_backup_command(&form)?;

    let notice = if run_action(&state, &identity, &command).await {
        Flash::success(format!("Backup {} requested", form.name.trim()))
    } else {
        Flash::error("Backup cannot be created")
    };
    Ok((flash::push(jar, &notice), Redirect::to("/backups")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/backups", get(backups_index))
        .route("/backup/get", get(get_backups))
        .route("/backup/describe/{name}", get(describe_backup))
        .route("/backup/logs/{name}", get(backup_logs))
        .route("/backup/delete/{name}", get(delete_backup))
        .route("/backup/create", post(create_backup))
}
