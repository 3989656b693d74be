use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeErrorResponse {
    pub error: bool,
    pub error_code: ResizeErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Filled only for the nothing-processed response, one entry per
    /// rejected file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_errors: Vec<String>,
}

/// All possible reasons a resize request may be refused as a whole.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeErrorCode {
    MalformedBody,
    NoFilesProvided,
    InvalidParameters,
    NothingProcessed,
    ArchiveFailed,
}
