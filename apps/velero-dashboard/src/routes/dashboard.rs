use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::Value as JsonValue;

use crate::auth::Identity;
use crate::error::AppResult;
use crate::normalize::items;
use crate::state::AppState;
use crate::views::{self, DashboardTemplate};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct DashboardStats {
    pub(crate) total_backups: usize,
    pub(crate) completed_backups: usize,
    pub(crate) failed_backups: usize,
    pub(crate) total_restores: usize,
    pub(crate) total_schedules: usize,
    pub(crate) active_schedules: usize,
    pub(crate) storage_locations: usize,
    pub(crate) healthy_locations: usize,
}

fn str_at<'a>(value: &'a JsonValue, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(JsonValue::as_str)
}

pub(crate) fn summarize(
    backups: &JsonValue,
    restores: &JsonValue,
    schedules: &JsonValue,
    locations: &JsonValue,
) -> DashboardStats {
    let backups = items(backups);
    let schedules = items(schedules);
    let locations = items(locations);

    DashboardStats {
        total_backups: backups.len(),
        completed_backups: backups
            .iter()
            .filter(|b| str_at(b, "/status/phase") == Some("Completed"))
            .count(),
        failed_backups: backups
            .iter()
            .filter(|b| matches!(str_at(b, "/status/phase"), Some("Failed" | "PartiallyFailed")))
            .count(),
        total_restores: items(restores).len(),
        total_schedules: schedules.len(),
        active_schedules: schedules
            .iter()
            .filter(|s| s.pointer("/spec/paused").and_then(JsonValue::as_bool) != Some(true))
            .count(),
        storage_locations: locations.len(),
        healthy_locations: locations
            .iter()
            .filter(|l| str_at(l, "/status/phase") == Some("Available"))
            .count(),
    }
}

pub(crate) async fn index(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Html<String>> {
    views::render(&DashboardTemplate {
        user: identity.display_name().to_string(),
        page: "dashboard",
        mail_from: state.config.mail_from.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Counts across backups, restores, schedules and storage locations", body = DashboardStats),
        (status = 500, description = "velero failed")
    )
)]
pub(crate) async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let backups = state.velero.structured("backup get").await?;
    let restores = state.velero.structured("restore get").await?;
    let schedules = state.velero.structured("schedule get").await?;
    let locations = state.velero.structured("backup-location get").await?;
    Ok(Json(summarize(&backups, &restores, &schedules, &locations)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/dashboard/stats", get(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backup(name: &str, phase: &str) -> JsonValue {
        json!({"metadata": {"name": name}, "status": {"phase": phase}})
    }

    #[test]
    fn summarize_counts_phases_and_flags() {
        let backups = json!({"items": [
            backup("b1", "Completed"),
            backup("b2", "Completed"),
            backup("b3", "Failed"),
            backup("b4", "PartiallyFailed"),
            backup("b5", "InProgress"),
        ]});
        let restores = json!({"items": [{"metadata": {"name": "r1"}}]});
        let schedules = json!({"items": [
            {"metadata": {"name": "s1"}, "spec": {"schedule": "0 2 * * *"}},
            {"metadata": {"name": "s2"}, "spec": {"schedule": "0 0 * * 0", "paused": true}},
        ]});
        let locations = json!({"items": [
            {"metadata": {"name": "default"}, "status": {"phase": "Available"}},
            {"metadata": {"name": "dr"}, "status": {"phase": "Unavailable"}},
        ]});

        let stats = summarize(&backups, &restores, &schedules, &locations);
        assert_eq!(
            stats,
            DashboardStats {
                total_backups: 5,
                completed_backups: 2,
                failed_backups: 2,
                total_restores: 1,
                total_schedules: 2,
                active_schedules: 1,
                storage_locations: 2,
                healthy_locations: 1,
            }
        );
    }

    #[test]
    fn summarize_accepts_single_documents() {
        let single = backup("only", "Completed");
        let empty = json!({"items": []});
        let stats = summarize(&single, &empty, &empty, &empty);
        assert_eq!(stats.total_backups, 1);
        assert_eq!(stats.completed_backups, 1);
        assert_eq!(stats.total_restores, 0);
    }
}
