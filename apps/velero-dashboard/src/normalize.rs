//! Flattens velero backup documents into the rows shown on the backups page.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Timestamp layout velero uses for `creationTimestamp` and `expiration`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("{field} is not a timestamp in YYYY-MM-DDTHH:MM:SSZ form: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("status.expiration is set but metadata.creationTimestamp is missing")]
    MissingCreationTimestamp,
}

/// Display fields of one backup. Fields missing from the source document stay `None` and
/// are left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<JsonValue>,
    /// Whole days left before the backup expires, as `"{days}d"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

/// Sections are read metadata first, then status, then spec, so the creation timestamp is
/// always known before the expiration is computed. Unknown keys are ignored.
pub fn normalize(record: &JsonValue) -> Result<NormalizedRecord, NormalizeError> {
    let mut out = NormalizedRecord::default();
    let mut created: Option<NaiveDateTime> = None;

    if let Some(metadata) = record.get("metadata").and_then(JsonValue::as_object) {
        out.name = metadata.get("name").cloned();
        if let Some(value) = metadata.get("creationTimestamp").filter(|v| !v.is_null()) {
            created = Some(parse_timestamp("creationTimestamp", value)?);
            out.creation_timestamp = Some(value.clone());
        }
    }

    if let Some(status) = record.get("status").and_then(JsonValue::as_object) {
        out.phase = status.get("phase").cloned();
        out.errors = status.get("errors").cloned();
        out.warnings = status.get("warnings").cloned();
        if let Some(value) = status.get("expiration").filter(|v| !v.is_null()) {
            let expires = parse_timestamp("expiration", value)?;
            let created = created.ok_or(NormalizeError::MissingCreationTimestamp)?;
            out.expiration = Some(days_remaining(created, expires));
        }
    }

    if let Some(spec) = record.get("spec").and_then(JsonValue::as_object) {
        out.storage_location = spec.get("storageLocation").cloned();
        out.selector = spec.get("selector").cloned();
    }

    Ok(out)
}

/// `velero ... get -o json` prints `{"items": [...]}` for a list but a bare document when a
/// single resource exists. Either way the caller gets a list.
pub fn items(document: &JsonValue) -> Vec<&JsonValue> {
    match document.get("items").and_then(JsonValue::as_array) {
        Some(items) => items.iter().collect(),
        None => vec![document],
    }
}

pub fn normalize_all(document: &JsonValue) -> Result<Vec<NormalizedRecord>, NormalizeError> {
    items(document).into_iter().map(normalize).collect()
}

fn parse_timestamp(field: &'static str, value: &JsonValue) -> Result<NaiveDateTime, NormalizeError> {
    value
        .as_str()
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok())
        .ok_or_else(|| NormalizeError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

// Floor division keeps negative deltas rounding toward the earlier day. The extra `- 1`
// is what the dashboard has always displayed.
fn days_remaining(created: NaiveDateTime, expires: NaiveDateTime) -> String {
    let days = (expires - created).num_seconds().div_euclid(SECONDS_PER_DAY);
    format!("{}d", days - 1)
}
