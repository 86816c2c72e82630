use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::document::VeleroDocument;
use crate::routes::dashboard::DashboardStats;
use crate::routes::health::HealthResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "Velero Dashboard", description = "JSON and text endpoints over the velero CLI"),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::dashboard::stats,
        crate::routes::backups::get_backups,
        crate::routes::backups::describe_backup,
        crate::routes::backups::backup_logs,
        crate::routes::restores::get_restores,
        crate::routes::restores::describe_restore,
        crate::routes::restores::restore_logs,
        crate::routes::schedules::get_schedules,
        crate::routes::schedules::describe_schedule,
        crate::routes::locations::backup_locations,
        crate::routes::locations::snapshot_locations,
    ),
    components(schemas(VeleroDocument, DashboardStats, HealthResponse)),
    tags(
        (name = "status"),
        (name = "dashboard"),
        (name = "backups"),
        (name = "restores"),
        (name = "schedules"),
        (name = "locations")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
