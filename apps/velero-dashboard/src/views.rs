use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::Value as JsonValue;

use crate::error::{internal_error, AppError, AppResult};
use crate::flash::Flash;
use crate::normalize::NormalizedRecord;

/// One table row on the backups page.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRow {
    pub name: String,
    pub created: String,
    pub phase: String,
    pub errors: String,
    pub warnings: String,
    pub storage_location: String,
    pub selector: String,
    pub expiration: String,
}

impl From<&NormalizedRecord> for BackupRow {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            name: display_value(record.name.as_ref()),
            created: display_value(record.creation_timestamp.as_ref()),
            phase: display_value(record.phase.as_ref()),
            errors: display_value(record.errors.as_ref()),
            warnings: display_value(record.warnings.as_ref()),
            storage_location: display_value(record.storage_location.as_ref()),
            selector: display_value(record.selector.as_ref()),
            expiration: record.expiration.clone().unwrap_or_default(),
        }
    }
}

fn display_value(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// One table row on the schedules page.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub name: String,
    pub schedule: String,
    pub phase: String,
    pub last_backup: String,
    pub paused: bool,
}

impl From<&JsonValue> for ScheduleRow {
    fn from(document: &JsonValue) -> Self {
        Self {
            name: display_value(document.pointer("/metadata/name")),
            schedule: display_value(document.pointer("/spec/schedule")),
            phase: display_value(document.pointer("/status/phase")),
            last_backup: display_value(document.pointer("/status/lastBackup")),
            paused: document
                .pointer("/spec/paused")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub user: String,
    pub page: &'static str,
    pub mail_from: String,
}

#[derive(Template)]
#[template(path = "backup/index.html")]
pub struct BackupIndexTemplate {
    pub user: String,
    pub page: &'static str,
    pub backups: Vec<BackupRow>,
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "schedule/index.html")]
pub struct ScheduleIndexTemplate {
    pub user: String,
    pub page: &'static str,
    pub schedules: Vec<ScheduleRow>,
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "403.html")]
struct ForbiddenTemplate;

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate;

pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|err| {
        let (status, message) = internal_error(err);
        AppError::new(status, message)
    })
}

fn error_page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render error page");
            status.into_response()
        }
    }
}

pub fn forbidden_page() -> Response {
    error_page(StatusCode::FORBIDDEN, &ForbiddenTemplate)
}

pub fn not_found_page() -> Response {
    error_page(StatusCode::NOT_FOUND, &NotFoundTemplate)
}
