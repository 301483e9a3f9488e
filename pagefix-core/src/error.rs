use thiserror::Error;

/// Failures reported by the PDF engines (document structure and rendering).
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document error: {0}")]
    Document(#[from] lopdf::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Pdfium library error: {0}")]
    Library(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_pdf_error_display() {
        let error = PdfError::Render("page 3 failed".to_string());
        assert_eq!(error.to_string(), "Render error: page 3 failed");

        let error = PdfError::InvalidStructure("missing MediaBox".to_string());
        assert_eq!(error.to_string(), "Invalid PDF structure: missing MediaBox");
    }

    #[test]
    fn test_pdf_error_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let pdf_error = PdfError::from(io_error);

        match pdf_error {
            PdfError::Io(ref err) => assert_eq!(err.kind(), ErrorKind::NotFound),
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_pdf_error_from_lopdf_error() {
        let lopdf_error = lopdf::Error::from(IoError::new(ErrorKind::InvalidData, "bad xref"));
        let pdf_error = PdfError::from(lopdf_error);
        assert!(matches!(pdf_error, PdfError::Document(_)));
        assert!(pdf_error.to_string().starts_with("Document error"));
    }

    #[test]
    fn test_all_pdf_error_variants() {
        let errors = vec![
            PdfError::Render("render".to_string()),
            PdfError::Library("library".to_string()),
            PdfError::InvalidImage("image".to_string()),
            PdfError::InvalidStructure("structure".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
