//! Integration tests for the HTTP API.
//!
//! Requests go straight to the router through `tower::ServiceExt::oneshot`,
//! so no socket is bound. PNG templates only: PDF templates need pdfium and
//! are covered by `pdf_template.rs`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use codeplate::{build_router, ServiceConfig};
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "codeplate-test-boundary";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn app() -> Router {
    build_router(Arc::new(ServiceConfig::default()))
}

fn white_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn upload(png: &[u8]) -> Value {
    let request = multipart_request(
        "/upload-template",
        &[Part::File {
            name: "file",
            filename: "label.png",
            content_type: "image/png",
            bytes: png,
        }],
    );
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    body
}

fn batch_request(uri: &str, template_data: &str, config: &Value) -> Request<Body> {
    let config = config.to_string();
    multipart_request(
        uri,
        &[
            Part::Text("template_data", template_data),
            Part::Text("config_data", &config),
        ],
    )
}

fn decode_data_uri_png(uri: &str) -> RgbImage {
    use base64::Engine;
    let (_, payload) = uri.split_once(',').expect("data URI has a comma");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgb8()
}

// ── Metadata endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn config_reports_limits_and_formats() {
    let request = Request::get("/config").body(Body::empty()).unwrap();
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_pages"], 100);
    assert_eq!(
        body["supported_formats"],
        json!(["image/png", "image/jpeg", "image/jpg", "application/pdf"])
    );
}

#[tokio::test]
async fn config_follows_service_settings() {
    let service = ServiceConfig::builder().max_pages(7).build().unwrap();
    let app = build_router(Arc::new(service));
    let request = Request::get("/config").body(Body::empty()).unwrap();
    let (_, body) = send_json(app, request).await;
    assert_eq!(body["max_pages"], 7);
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_returns_data_uri_and_dimensions() {
    let body = upload(&white_png(400, 300)).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["dimensions"], json!({ "width": 400, "height": 300 }));

    let uri = body["template_image"].as_str().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
    assert_eq!(decode_data_uri_png(uri).dimensions(), (400, 300));
}

#[tokio::test]
async fn upload_rejects_undecodable_bytes() {
    let request = multipart_request(
        "/upload-template",
        &[Part::File {
            name: "file",
            filename: "notes.txt",
            content_type: "image/png",
            bytes: b"definitely not an image",
        }],
    );
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error processing template: "), "got: {detail}");
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let request = multipart_request("/upload-template", &[Part::Text("other", "x")]);
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn upload_over_body_limit_is_rejected() {
    let service = ServiceConfig::builder().max_body_bytes(1024).build().unwrap();
    let app = build_router(Arc::new(service));
    let payload = vec![0u8; 8 * 1024];
    let request = multipart_request(
        "/upload-template",
        &[Part::File {
            name: "file",
            filename: "big.png",
            content_type: "image/png",
            bytes: &payload,
        }],
    );
    let (status, body) = send_json(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error processing template: malformed form data"));
}

// ── Preview ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_renders_first_page_and_counts_range() {
    let uploaded = upload(&white_png(400, 300)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let config = json!({
        "start_value": 1,
        "end_value": 3,
        "prefix": "ID-",
        "include_qr": true,
        "show_qr_text": true,
        "qr_size": 80,
        "qr_x": 20,
        "qr_y": 20
    });

    let (status, body) = send_json(app(), batch_request("/preview", template, &config)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["total_pages"], 3);

    let page = decode_data_uri_png(body["preview_image"].as_str().unwrap());
    assert_eq!(page.dimensions(), (400, 300));
    // The QR quiet zone is white; its first dark module sits inside the box.
    let dark_in_box = (20..100)
        .flat_map(|y| (20..100).map(move |x| (x, y)))
        .any(|(x, y)| page.get_pixel(x, y).0 == [0, 0, 0]);
    assert!(dark_in_box, "expected QR modules inside the placement box");
    assert_eq!(page.get_pixel(399, 0).0, [255, 255, 255]);
}

#[tokio::test]
async fn preview_without_code_type_is_rejected() {
    let uploaded = upload(&white_png(200, 200)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let config = json!({ "start_value": 1, "end_value": 3 });

    let (status, body) = send_json(app(), batch_request("/preview", template, &config)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Error generating preview: At least one code type must be selected"
    );
}

#[tokio::test]
async fn preview_rejects_malformed_config_json() {
    let uploaded = upload(&white_png(50, 50)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let request = multipart_request(
        "/preview",
        &[
            Part::Text("template_data", template),
            Part::Text("config_data", "{\"start_value\": 1,"),
        ],
    );
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error generating preview: Invalid configuration"));
}

#[tokio::test]
async fn preview_requires_template_data() {
    let request = multipart_request(
        "/preview",
        &[Part::Text(
            "config_data",
            r#"{"start_value":1,"end_value":1,"include_qr":true}"#,
        )],
    );
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("template_data"));
}

#[tokio::test]
async fn validation_is_reported_before_template_decoding() {
    let config = json!({ "start_value": 5, "end_value": 105, "include_qr": true });
    let request = batch_request("/preview", "data:image/png;base64,bm90IGEgcG5n", &config);
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("maximum of 100 pages"), "got: {detail}");

    let config = json!({ "start_value": 1, "end_value": 2 });
    let request = batch_request("/generate-pdf", "not a data uri", &config);
    let (_, body) = send_json(app(), request).await;
    assert_eq!(
        body["detail"],
        "Error generating PDF: At least one code type must be selected"
    );
}

#[tokio::test]
async fn bad_template_with_valid_config_is_a_decode_error() {
    let config = json!({ "start_value": 1, "end_value": 2, "include_qr": true });
    let request = batch_request("/preview", "data:image/png;base64,bm90IGEgcG5n", &config);
    let (status, body) = send_json(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error generating preview: cannot decode template image"));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_pdf_has_one_page_per_value() {
    let uploaded = upload(&white_png(400, 300)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let config = json!({
        "start_value": 1,
        "end_value": 3,
        "prefix": "ID-",
        "include_qr": true,
        "include_barcode": true,
        "show_barcode_text": true
    });

    let response = app()
        .oneshot(batch_request("/generate-pdf", template, &config))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=generated_codes.pdf"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[tokio::test]
async fn generate_pdf_rejects_range_over_ceiling() {
    let uploaded = upload(&white_png(100, 100)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let config = json!({ "start_value": 5, "end_value": 105, "include_qr": true });

    let (status, body) = send_json(app(), batch_request("/generate-pdf", template, &config)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Error generating PDF: "), "got: {detail}");
    assert!(detail.contains("maximum of 100 pages"), "got: {detail}");
}

#[tokio::test]
async fn generate_pdf_accepts_exactly_the_ceiling() {
    let service = ServiceConfig::builder().max_pages(4).build().unwrap();
    let app = build_router(Arc::new(service));
    let uploaded = upload(&white_png(60, 60)).await;
    let template = uploaded["template_image"].as_str().unwrap();
    let config = json!({ "start_value": 10, "end_value": 13, "include_qr": true, "qr_size": 40 });

    let (status, bytes) = send(app, batch_request("/generate-pdf", template, &config)).await;
    assert_eq!(status, StatusCode::OK);
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 4);
}

// ── CORS ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cors_allows_frontend_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/preview")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn cors_preflight_mirrors_requested_method_and_headers() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/generate-pdf")
        .header(header::ORIGIN, "https://qr-code-adder.vercel.app")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-requested-with")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-requested-with");
}

#[tokio::test]
async fn cors_ignores_unknown_origin() {
    let request = Request::get("/health")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
