//! Render PDF pages to images for OCR (§4.A: "render each page to an
//! image at ≈108 DPI"). Behind the `pdfium` feature, following the
//! same optional-backend pattern the pack uses for PDF handling.

use crate::error::{ExtractError, Result};
use crate::ocr::OcrUnit;

const TARGET_DPI: f32 = 108.0;

#[cfg(feature = "pdfium")]
pub fn render_pages(storage_key: &str, bytes: &[u8]) -> Result<Vec<OcrUnit>> {
    use pdfium_render::prelude::*;

    let pdfium = Pdfium::new(
        Pdfium::bind_to_system_library()
            .map_err(|e| ExtractError::PdfRender { storage_key: storage_key.to_string(), message: e.to_string() })?,
    );
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractError::PdfRender { storage_key: storage_key.to_string(), message: e.to_string() })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(TARGET_DPI / 72.0);

    let mut units = Vec::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractError::PdfRender { storage_key: storage_key.to_string(), message: e.to_string() })?;
        let png_bytes = bitmap
            .as_image()
            .to_rgb8()
            .to_vec();
        units.push(OcrUnit { page_index, bytes: png_bytes, mime_type: "image/png".to_string() });
    }
    Ok(units)
}

#[cfg(not(feature = "pdfium"))]
pub fn render_pages(_storage_key: &str, _bytes: &[u8]) -> Result<Vec<OcrUnit>> {
    Err(ExtractError::PdfRenderingUnavailable)
}
