use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A document printed by `velero ... -o json`, passed to the browser untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct VeleroDocument(pub serde_json::Value);

impl Deref for VeleroDocument {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<serde_json::Value> for VeleroDocument {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
