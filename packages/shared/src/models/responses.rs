use serde::{Deserialize, Serialize};

use crate::models::club::JoinStatus;
use crate::services::errors::service_errors::ErrorKind;

/// Body of every failed call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClubResponse {
    pub club_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinClubResponse {
    pub status: JoinStatus,
}
