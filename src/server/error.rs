use crate::error::CodeplateError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The endpoint an error was raised from; picks the `detail` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Preview,
    Export,
}

impl Stage {
    fn prefix(self) -> &'static str {
        match self {
            Stage::Upload => "Error processing template",
            Stage::Preview => "Error generating preview",
            Stage::Export => "Error generating PDF",
        }
    }
}

/// Error returned by every handler.
///
/// All failures are reported as `400 Bad Request` with a JSON body of the
/// form `{"detail": "<stage prefix>: <message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub stage: Stage,
    pub source: CodeplateError,
}

impl ApiError {
    pub fn new(stage: Stage, source: CodeplateError) -> Self {
        Self { stage, source }
    }

    pub fn detail(&self) -> String {
        format!("{}: {}", self.stage.prefix(), self.source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.detail();
        match &self.source {
            CodeplateError::Internal(_) | CodeplateError::PdfiumBindingFailed(_) => {
                tracing::error!(stage = ?self.stage, "{}", detail)
            }
            _ => tracing::warn!(stage = ?self.stage, "{}", detail),
        }

        (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Attach a [`Stage`] to a library result.
pub trait StageExt<T> {
    fn at(self, stage: Stage) -> Result<T, ApiError>;
}

impl<T> StageExt<T> for Result<T, CodeplateError> {
    fn at(self, stage: Stage) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(stage, e))
    }
}
