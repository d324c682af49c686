use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unrecognized content type for {storage_key}")]
    UnrecognizedFormat { storage_key: String },

    #[error("archive error reading {storage_key}: {source}")]
    Archive { storage_key: String, source: zip::result::ZipError },

    #[error("spreadsheet error reading {storage_key}: {message}")]
    Spreadsheet { storage_key: String, message: String },

    #[error("XML error reading {storage_key}: {source}")]
    Xml { storage_key: String, source: quick_xml::Error },

    #[error("OCR backend error: {0}")]
    Ocr(String),

    #[error("PDF rendering unavailable: built without the `pdfium` feature")]
    PdfRenderingUnavailable,

    #[error("PDF rendering failed for {storage_key}: {message}")]
    PdfRender { storage_key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
