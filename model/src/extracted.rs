//! Output of the Content Extractor.

use serde::{Deserialize, Serialize};

/// How a document's text was obtained. Drives downstream metadata only;
/// the pipeline treats all variants uniformly past extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PdfOcr,
    ImageOcr,
    DocxText,
    SpreadsheetText,
    CsvText,
    PlainText,
}

/// A single soft failure recorded during extraction (one page, one sheet).
/// Does not abort extraction; the document proceeds with whatever text
/// succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionError {
    /// 0-based page or sheet index, when known.
    pub unit_index: Option<usize>,
    pub message: String,
}

impl ExtractionError {
    pub fn new(unit_index: Option<usize>, message: impl Into<String>) -> Self {
        Self { unit_index, message: message.into() }
    }
}

/// Result of running the Content Extractor on a `RawDocument`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub storage_key: String,
    /// UTF-8, cleaned per the rules in §4.A. May be empty.
    pub cleaned_text: String,
    pub extraction_method: ExtractionMethod,
    pub page_count: Option<usize>,
    pub extraction_errors: Vec<ExtractionError>,
}

impl ExtractedDocument {
    pub fn new(
        storage_key: impl Into<String>,
        cleaned_text: impl Into<String>,
        extraction_method: ExtractionMethod,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            cleaned_text: cleaned_text.into(),
            extraction_method,
            page_count: None,
            extraction_errors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cleaned_text.is_empty()
    }
}
