//! PDF operations module
//!
//! This module provides the page-level operations of the tool: removing blank
//! pages, baking page rotations into content streams, rebuilding documents from
//! rasterized pages, and running those operations over batches of files.

pub mod batch;
pub mod blank_pages;
pub mod page_selection;
pub mod rasterize;
pub mod rotate;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::{
    bake_output_path, bake_rotation_batch, rasterize_batch, run_batch, BatchOptions, BatchReport,
    FileOutcome,
};
pub use blank_pages::{
    classify_pdf_pages, is_blank_page, remove_blank_pages, BlankPageClassifier, BlankPageOptions,
    BlankPageRemover, BlankReason, ClassifiablePage, ContentQueryFallback, DocumentPage,
    PageVerdict, RemovalReport,
};
pub use page_selection::retain_pages;
pub use rasterize::{raster_output_path, rasterize_document, rasterize_pdf, RasterizeOptions};
pub use rotate::{bake_rotation, bake_rotation_pdf, BakeRotationOptions, RotationAngle};

use crate::error::PdfError;
use std::path::{Path, PathBuf};

/// Result type for operations
pub type OperationResult<T> = Result<T, OperationError>;

/// Operation-specific errors
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Input file does not exist
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Page number out of bounds
    #[error("Page {0} out of bounds (document has {1} pages)")]
    PageIndexOutOfBounds(usize, usize),

    /// No pages would remain in the output
    #[error("No pages to process")]
    NoPagesToProcess,

    /// Invalid rotation angle
    #[error("Invalid rotation angle: {0} (must be a multiple of 90)")]
    InvalidRotation(i32),

    /// Blank threshold outside [0, 1]
    #[error("Invalid threshold: {0} (must be between 0 and 1)")]
    InvalidThreshold(f64),

    /// Render scale not strictly positive
    #[error("Invalid scale: {0} (must be greater than 0)")]
    InvalidScale(f32),

    /// Rasterization resolution of zero
    #[error("Invalid resolution: {0} dpi")]
    InvalidResolution(u32),

    /// Near white level above the exact white level
    #[error("Invalid white levels: near {near} is above exact {exact}")]
    InvalidWhiteLevels { exact: u8, near: u8 },

    /// Content stream of a page could not be inspected
    #[error("Content stream query failed: {0}")]
    ContentQuery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF engine error
    #[error("PDF error: {0}")]
    PdfError(#[from] PdfError),
}

impl From<lopdf::Error> for OperationError {
    fn from(error: lopdf::Error) -> Self {
        OperationError::PdfError(PdfError::Document(error))
    }
}

/// Fail with `InputNotFound` unless `path` is an existing file
pub fn ensure_input_exists(path: &Path) -> OperationResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(OperationError::InputNotFound(path.to_path_buf()))
    }
}
