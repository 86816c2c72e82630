use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::SignedCookieJar;

use crate::auth::{require_role, Identity, Role};
use crate::document::VeleroDocument;
use crate::error::AppResult;
use crate::flash::{self, Flash};
use crate::normalize::items;
use crate::routes::{run_action, structured_json, text_output};
use crate::state::AppState;
use crate::velero::validate_resource_name;
use crate::views::{self, ScheduleIndexTemplate, ScheduleRow};

pub(crate) async fn schedules_index(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let document = state.velero.structured("schedule get").await?;
    let schedules: Vec<ScheduleRow> = items(&document).into_iter().map(ScheduleRow::from).collect();

    let (jar, flash) = flash::take(jar);
    let page = ScheduleIndexTemplate {
        user: identity.display_name().to_string(),
        page: "schedule",
        schedules,
        flash,
    };
    Ok((jar, views::render(&page)?))
}

#[utoipa::path(
    get,
    path = "/schedule/get",
    tag = "schedules",
    responses(
        (status = 200, description = "Output of `velero schedule get -o json`", body = VeleroDocument),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn get_schedules(
    State(state): State<AppState>,
) -> AppResult<Json<VeleroDocument>> {
    structured_json(&state, "schedule get").await
}

#[utoipa::path(
    get,
    path = "/schedule/describe/{name}",
    tag = "schedules",
    params(("name" = String, Path, description = "Schedule name")),
    responses(
        (status = 200, description = "Output of `velero schedule describe`", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid schedule name")
    )
)]
pub(crate) async fn describe_schedule(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<String> {
    text_output(&state, "schedule describe", &name).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduleAction {
    Pause,
    Unpause,
    Delete,
}

impl ScheduleAction {
    fn command(self, name: &str) -> String {
        match self {
            Self::Pause => format!("schedule pause {name}"),
            Self::Unpause => format!("schedule unpause {name}"),
            Self::Delete => format!("schedule delete {name} --confirm"),
        }
    }

    fn notice(self, name: &str, succeeded: bool) -> Flash {
        match (self, succeeded) {
            (Self::Pause, true) => Flash::success(format!("Schedule {name} paused")),
            (Self::Unpause, true) => Flash::success(format!("Schedule {name} resumed")),
            (Self::Delete, true) => Flash::success(format!("Schedule {name} deleted")),
            (Self::Pause, false) => Flash::error("Schedule cannot be paused"),
            (Self::Unpause, false) => Flash::error("Schedule cannot be resumed"),
            (Self::Delete, false) => Flash::error("Schedule cannot be deleted"),
        }
    }
}

async fn apply(
    state: AppState,
    identity: Identity,
    jar: SignedCookieJar,
    name: String,
    action: ScheduleAction,
) -> AppResult<(SignedCookieJar, Redirect)> {
    require_role(&identity, Role::Operator)?;
    let name = validate_resource_name(&name)?;
    let succeeded = run_action(&state, &identity, &action.command(name)).await;
    let notice = action.notice(name, succeeded);
    Ok((flash::push(jar, &notice), Redirect::to("/schedules")))
}

pub(crate) async fn pause_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Path(name): Path<String>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    apply(state, identity, jar, name, ScheduleAction::Pause).await
}

pub(crate) async fn unpause_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Path(name): Path<String>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    apply(state, identity, jar, name, ScheduleAction::Unpause).await
}

pub(crate) async fn delete_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    jar: SignedCookieJar,
    Path(name): Path<String>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    apply(state, identity, jar, name, ScheduleAction::Delete).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedule/get", get(get_schedules))
        .route("/schedules", get(schedules_index))
        .route("/schedule/describe/{name}", get(describe_schedule))
        .route("/schedule/pause/{name}", post(pause_schedule))
        .route("/schedule/unpause/{name}", post(unpause_schedule))
        .route("/schedule/delete/{name}", post(delete_schedule))
}
