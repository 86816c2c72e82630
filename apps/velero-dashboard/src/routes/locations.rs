use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::document::VeleroDocument;
use crate::error::AppResult;
use crate::routes::structured_json;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/location/backup",
    tag = "locations",
    responses(
        (status = 200, description = "Output of `velero backup-location get -o json`", body = VeleroDocument),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn backup_locations(
    State(state): State<AppState>,
) -> AppResult<Json<VeleroDocument>> {
    structured_json(&state, "backup-location get").await
}

#[utoipa::path(
    get,
    path = "/location/snapshot",
    tag = "locations",
    responses(
        (status = 200, description = "Output of `velero snapshot-location get -o json`", body = VeleroDocument),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn snapshot_locations(
    State(state): State<AppState>,
) -> AppResult<Json<VeleroDocument>> {
    structured_json(&state, "snapshot-location get").await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/location/backup", get(backup_locations))
        .route("/location/snapshot", get(snapshot_locations))
}
