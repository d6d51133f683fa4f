//! Image transport: `RgbImage` ⇄ PNG bytes ⇄ base64 `data:` URI.
//!
//! The service keeps no session store. After upload the normalised template
//! travels back to the client as a PNG data URI, and the client sends it
//! again with every preview and export request. PNG keeps that round trip
//! lossless, so pixel placements computed against the upload response stay
//! valid.

use crate::error::CodeplateError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbImage;
use std::io::Cursor;
use tracing::debug;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encode a raster as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, CodeplateError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode a raster as a `data:image/png;base64,…` URI.
pub fn to_data_uri(img: &RgbImage) -> Result<String, CodeplateError> {
    let png = encode_png(img)?;
    let b64 = STANDARD.encode(&png);
    debug!("Encoded {}x{} image → {} bytes base64", img.width(), img.height(), b64.len());
    Ok(format!("{PNG_DATA_URI_PREFIX}{b64}"))
}

/// Decode the payload of a base64 data URI.
///
/// Everything after the first `,` is treated as base64, whatever media type
/// the header declares; the bytes are sniffed by the image decoder later.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, CodeplateError> {
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| CodeplateError::Decode("template_data is not a data URI".into()))?;
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CodeplateError::Decode(format!("invalid base64 payload: {e}")))
}
