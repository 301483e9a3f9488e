//! # pagefix
//!
//! Page-level clean-up jobs for PDF documents: dropping blank pages from scans,
//! baking page rotations into content streams, and rebuilding documents from
//! rasterized pages.
//!
//! ## Features
//!
//! - **Blank Page Removal**: Classify pages by the share of white pixels in a grayscale rendering
//! - **Rotation Baking**: Turn `/Rotate` attributes into real content transformations
//! - **Rasterized Rebuild**: Replace every page by a full-color image of itself
//! - **Batch Runs**: Process lists of files, skipping missing ones
//!
//! Documents are read, edited and written with `lopdf`. Rendering goes through
//! Pdfium via `pdfium-render`, behind the [`render::PageRasterizer`] trait.
//!
//! ## Quick Start
//!
//! ### Removing blank pages
//!
//! ```rust,no_run
//! use pagefix::operations::{remove_blank_pages, BlankPageOptions};
//! use pagefix::render::PdfiumRenderer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = PdfiumRenderer::bind(None)?;
//! let report = remove_blank_pages(
//!     "Salads.pdf",
//!     "Salads_clean.pdf",
//!     &BlankPageOptions::default(),
//!     &renderer,
//! )?;
//!
//! println!("Kept {} of {} pages", report.kept, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! ### Baking rotations
//!
//! ```rust,no_run
//! use pagefix::operations::{bake_rotation_pdf, BakeRotationOptions, RotationAngle};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BakeRotationOptions::default().with_angle(RotationAngle::Rotate180);
//! bake_rotation_pdf("upside_down.pdf", "upright.pdf", &options)?;
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod error;
pub mod operations;
pub mod raster;
pub mod render;

pub use error::{PdfError, Result};
pub use operations::{
    bake_rotation_pdf, rasterize_pdf, remove_blank_pages, BakeRotationOptions, BlankPageOptions,
    OperationError, OperationResult, RasterizeOptions, RotationAngle,
};
pub use raster::{PixelStats, WhiteLevels};
pub use render::{PageRasterizer, PdfiumRenderer};

/// Current version of pagefix
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
