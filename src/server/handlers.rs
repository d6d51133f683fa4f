use super::error::{ApiError, Stage, StageExt};
use super::AppState;
use crate::batch;
use crate::config::{GenerationConfig, ServiceConfig};
use crate::error::CodeplateError;
use crate::pipeline::template::{self, Template};
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

pub const PDF_FILENAME: &str = "generated_codes.pdf";

#[derive(Debug, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub template_image: String,
    pub dimensions: Dimensions,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub preview_image: String,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub max_pages: usize,
    pub supported_formats: &'static [&'static str],
}

/// `POST /upload-template`: multipart `file` part, image or PDF.
pub async fn upload_template(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (bytes, content_type) = read_file_field(&mut multipart).await.at(Stage::Upload)?;
    debug!(bytes = bytes.len(), %content_type, "Template upload received");

    let template = template::load_template_async(bytes, content_type, &state.service)
        .await
        .at(Stage::Upload)?;
    let (width, height) = template.dimensions();
    let template_image = tokio::task::spawn_blocking(move || template.to_data_uri())
        .await
        .map_err(|e| CodeplateError::Internal(format!("Encode task panicked: {}", e)))
        .and_then(|r| r)
        .at(Stage::Upload)?;

    Ok(Json(UploadResponse {
        success: true,
        template_image,
        dimensions: Dimensions { width, height },
    }))
}

/// `POST /preview`: form fields `template_data` and `config_data`.
pub async fn preview(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let (template, config) = read_batch_form(&mut multipart, &state.service)
        .await
        .at(Stage::Preview)?;

    let preview = batch::preview_async(template, config, state.service.clone())
        .await
        .at(Stage::Preview)?;
    let total_pages = preview.total_pages;
    let preview_image = tokio::task::spawn_blocking(move || preview.to_data_uri())
        .await
        .map_err(|e| CodeplateError::Internal(format!("Encode task panicked: {}", e)))
        .and_then(|r| r)
        .at(Stage::Preview)?;

    Ok(Json(PreviewResponse {
        success: true,
        preview_image,
        total_pages,
    }))
}

/// `POST /generate-pdf`: same form as `/preview`, answers with the PDF.
pub async fn generate_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (template, config) = read_batch_form(&mut multipart, &state.service)
        .await
        .at(Stage::Export)?;

    let bytes = batch::export_pdf_async(template, config, state.service.clone())
        .await
        .at(Stage::Export)?;
    info!(bytes = bytes.len(), "PDF generated");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", PDF_FILENAME),
            ),
        ],
        bytes,
    ))
}

/// `GET /config`
pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        max_pages: state.service.max_pages,
        supported_formats: state.service.supported_formats(),
    })
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

// ── Form helpers ─────────────────────────────────────────────────────────

/// Bytes and declared content type of the `file` part.
async fn read_file_field(multipart: &mut Multipart) -> Result<(Vec<u8>, String), CodeplateError> {
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(form_error)?;
        return Ok((bytes.to_vec(), content_type));
    }
    Err(CodeplateError::MissingField("file"))
}

/// Collect every text part of the form by name. Later duplicates win.
async fn read_text_fields(multipart: &mut Multipart) -> Result<HashMap<String, String>, CodeplateError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let text = field.text().await.map_err(form_error)?;
        fields.insert(name, text);
    }
    Ok(fields)
}

/// Decode the `template_data` and `config_data` fields shared by preview
/// and export.
///
/// The config is validated before the template is decoded, so range and
/// code-selection errors win over a bad template.
async fn read_batch_form(
    multipart: &mut Multipart,
    service: &ServiceConfig,
) -> Result<(Template, GenerationConfig), CodeplateError> {
    let mut fields = read_text_fields(multipart).await?;
    let template_data = fields
        .remove("template_data")
        .ok_or(CodeplateError::MissingField("template_data"))?;
    let config_data = fields
        .remove("config_data")
        .ok_or(CodeplateError::MissingField("config_data"))?;

    let config = GenerationConfig::from_json(&config_data)?;
    config.validate(service)?;
    let template = tokio::task::spawn_blocking(move || Template::from_data_uri(&template_data))
        .await
        .map_err(|e| CodeplateError::Internal(format!("Decode task panicked: {}", e)))??;
    Ok((template, config))
}

fn form_error(err: axum::extract::multipart::MultipartError) -> CodeplateError {
    CodeplateError::Form(err.body_text())
}
