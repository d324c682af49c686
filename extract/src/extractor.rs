//! Dispatch `RawDocument` → `ExtractedDocument` by content-type suffix
//! (§4.A "Dispatch by content type").

use std::io::{BufReader, Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Reader};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use ingest_model::{ExtractedDocument, ExtractionError, ExtractionMethod, RawDocument};

use crate::cleaning::clean;
use crate::error::{ExtractError, Result};
use crate::ocr::{OcrBackend, OcrUnit};
use crate::pdf;

const FORM_FEED: char = '\u{000C}';

pub async fn extract(raw: &RawDocument, ocr: &dyn OcrBackend) -> Result<ExtractedDocument> {
    let extension = raw.extension().unwrap_or_default();
    match extension.as_str() {
        "pdf" => extract_pdf(raw, ocr).await,
        "png" | "jpg" | "jpeg" | "tiff" => extract_image(raw, ocr).await,
        "docx" => extract_docx(raw),
        "xlsx" | "xls" => extract_spreadsheet(raw),
        "csv" => extract_csv(raw),
        "txt" => extract_plain_text(raw),
        _ => Err(ExtractError::UnrecognizedFormat { storage_key: raw.storage_key.clone() }),
    }
}

async fn extract_pdf(raw: &RawDocument, ocr: &dyn OcrBackend) -> Result<ExtractedDocument> {
    let units = pdf::render_pages(&raw.storage_key, &raw.bytes)?;
    let page_count = units.len();
    let mut page_texts = Vec::with_capacity(units.len());
    let mut errors = Vec::new();

    for unit in units {
        match ocr.extract_text(&unit).await {
            Ok(text) => page_texts.push(text),
            Err(e) => errors.push(ExtractionError { unit_index: Some(unit.page_index), message: e.to_string() }),
        }
    }

    let joined = page_texts.join(&FORM_FEED.to_string());
    let mut doc = ExtractedDocument::new(&raw.storage_key, clean(&joined), ExtractionMethod::PdfOcr);
    doc.page_count = Some(page_count);
    doc.extraction_errors = errors;
    Ok(doc)
}

async fn extract_image(raw: &RawDocument, ocr: &dyn OcrBackend) -> Result<ExtractedDocument> {
    let unit = OcrUnit { page_index: 0, bytes: raw.bytes.clone(), mime_type: raw.content_type.clone() };
    let mut doc = ExtractedDocument::new(&raw.storage_key, String::new(), ExtractionMethod::ImageOcr);
    match ocr.extract_text(&unit).await {
        Ok(text) => doc.cleaned_text = clean(&text),
        Err(e) => doc.extraction_errors.push(ExtractionError { unit_index: Some(0), message: e.to_string() }),
    }
    Ok(doc)
}

/// `.docx` is a zip archive; `word/document.xml` holds the body. We
/// walk `<w:p>` paragraphs in document order, concatenating `<w:t>` runs.
fn extract_docx(raw: &RawDocument) -> Result<ExtractedDocument> {
    let cursor = Cursor::new(&raw.bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| ExtractError::Archive { storage_key: raw.storage_key.clone(), source: e })?;

    let mut xml = String::new();
    {
        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Archive { storage_key: raw.storage_key.clone(), source: e })?;
        entry.read_to_string(&mut xml)?;
    }

    let paragraphs = docx_paragraphs(&raw.storage_key, &xml)?;
    let text = paragraphs.join("\n");
    Ok(ExtractedDocument::new(&raw.storage_key, clean(&text), ExtractionMethod::DocxText))
}

fn docx_paragraphs(storage_key: &str, xml: &str) -> Result<Vec<String>> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Text(e)) if in_text => {
                current.push_str(
                    &e.unescape().map_err(|e| ExtractError::Xml { storage_key: storage_key.to_string(), source: e })?,
                );
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::Xml { storage_key: storage_key.to_string(), source: e }),
        }
        buf.clear();
    }
    Ok(paragraphs)
}

/// `.xlsx`/`.xls`: one "Sheet: <name>" header per sheet, rows as TSV (§4.A).
fn extract_spreadsheet(raw: &RawDocument) -> Result<ExtractedDocument> {
    let cursor = Cursor::new(&raw.bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ExtractError::Spreadsheet { storage_key: raw.storage_key.clone(), message: e.to_string() })?;

    let mut out = String::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ExtractError::Spreadsheet { storage_key: raw.storage_key.clone(), message: e.to_string() })?;
        out.push_str("Sheet: ");
        out.push_str(&sheet_name);
        out.push('\n');
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }
    Ok(ExtractedDocument::new(&raw.storage_key, clean(&out), ExtractionMethod::SpreadsheetText))
}

/// `.csv`: rows as TSV (§4.A). A plain comma split — good enough for
/// the unquoted CSVs this pipeline sees; no embedded-comma handling.
fn extract_csv(raw: &RawDocument) -> Result<ExtractedDocument> {
    let (text, _, _) = encoding_rs::UTF_8.decode(&raw.bytes);
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(&line.split(',').collect::<Vec<_>>().join("\t"));
        out.push('\n');
    }
    Ok(ExtractedDocument::new(&raw.storage_key, clean(&out), ExtractionMethod::CsvText))
}

fn extract_plain_text(raw: &RawDocument) -> Result<ExtractedDocument> {
    let mut reader = BufReader::new(raw.bytes.as_slice());
    let mut bytes = Vec::with_capacity(raw.bytes.len());
    reader.read_to_end(&mut bytes)?;
    let (text, _, _) = encoding_rs::UTF_8.decode(&bytes);
    Ok(ExtractedDocument::new(&raw.storage_key, clean(&text), ExtractionMethod::PlainText))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrBackend for FixedOcr {
        async fn extract_text(&self, _unit: &OcrUnit) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn doc(storage_key: &str, bytes: Vec<u8>, content_type: &str) -> RawDocument {
        RawDocument::new(storage_key, bytes, content_type)
    }

    #[tokio::test]
    async fn unrecognized_extension_errors() {
        let raw = doc("/x/y.unknown", b"data".to_vec(), "application/octet-stream");
        let result = extract(&raw, &FixedOcr("n/a")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn plain_text_is_cleaned() {
        let raw = doc("/a/b.txt", b"India.It rained.\r\n\r\n\r\nDone.".to_vec(), "text/plain");
        let extracted = extract(&raw, &FixedOcr("n/a")).await.expect("extraction succeeds");
        assert_eq!(extracted.cleaned_text, "India. It rained.\n\nDone.");
        assert_eq!(extracted.extraction_method, ExtractionMethod::PlainText);
    }

    #[tokio::test]
    async fn csv_becomes_tab_separated() {
        let raw = doc("/a/b.csv", b"a,b,c\n1,2,3".to_vec(), "text/csv");
        let extracted = extract(&raw, &FixedOcr("n/a")).await.expect("extraction succeeds");
        assert_eq!(extracted.cleaned_text, "a\tb\tc\n1\t2\t3");
    }

    #[tokio::test]
    async fn image_extension_goes_through_ocr() {
        let raw = doc("/a/scan.png", b"\x89PNG".to_vec(), "image/png");
        let extracted = extract(&raw, &FixedOcr("Alpha Beta")).await.expect("extraction succeeds");
        assert_eq!(extracted.cleaned_text, "Alpha Beta");
        assert_eq!(extracted.extraction_method, ExtractionMethod::ImageOcr);
    }

    #[tokio::test]
    async fn pdf_without_pdfium_feature_records_empty_with_errors() {
        let raw = doc("/a/report.pdf", b"%PDF-1.4".to_vec(), "application/pdf");
        let result = extract(&raw, &FixedOcr("n/a")).await;
        assert!(result.is_err(), "rendering should fail without the pdfium feature enabled");
    }
}
