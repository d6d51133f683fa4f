//! PDF assembly: composed pages → one multi-page document.
//!
//! printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
//! `Vec<Op>`, and the whole document is serialised in one `save()` call.
//!
//! Pages are sized from their rasters at 72 DPI, so one image pixel maps to
//! one PDF point and the image covers the page edge to edge.

use crate::error::CodeplateError;
use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Raster resolution used to size PDF pages.
pub const PAGE_DPI: f32 = 72.0;

const MM_PER_INCH: f32 = 25.4;

/// Page dimensions in millimetres for a raster of `width × height` px.
pub fn page_size_mm(width: u32, height: u32) -> (Mm, Mm) {
    let to_mm = |px: u32| Mm(px as f32 / PAGE_DPI * MM_PER_INCH);
    (to_mm(width), to_mm(height))
}

/// Serialise `pages` into a single PDF, one page per raster, in order.
#[instrument(skip(pages), fields(pages = pages.len()))]
pub fn write_pages(pages: &[&RgbImage], title: &str) -> Result<Vec<u8>, CodeplateError> {
    if pages.is_empty() {
        return Err(CodeplateError::Composition(
            "cannot write a PDF without pages".into(),
        ));
    }

    let mut doc = PdfDocument::new(title);
    let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

    for raster in pages {
        let (width, height) = raster.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(raster.as_raw().clone()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(PAGE_DPI),
                rotate: None,
            },
        }];

        let (page_w, page_h) = page_size_mm(width, height);
        pdf_pages.push(PdfPage::new(page_w, page_h, ops));
    }

    doc.with_pages(pdf_pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "printpdf reported warnings");
    }

    info!(pages = pages.len(), bytes = output.len(), "PDF assembled");
    Ok(output)
}
