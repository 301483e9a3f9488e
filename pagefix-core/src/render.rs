//! Page rasterization
//!
//! Rendering is delegated to Pdfium through `pdfium-render`. The rest of the
//! crate only sees the [`PageRasterizer`] trait, so operations can be driven by
//! any renderer that turns a page index into an image.

use crate::error::{PdfError, Result};
use crate::operations::rotate::RotationAngle;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f32 = 72.0;

/// Color layout of a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Single-channel grayscale
    #[default]
    Gray,
    /// Full color
    Rgb,
}

/// Options for rendering a single page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Scale factor relative to 72 dpi
    pub scale: f32,
    /// Rotation applied while rendering (clockwise)
    pub rotation: RotationAngle,
    /// Output color layout
    pub color: ColorMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            rotation: RotationAngle::None,
            color: ColorMode::Gray,
        }
    }
}

impl RenderOptions {
    /// Grayscale rendering at the given scale
    pub fn grayscale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// Full color rendering at a resolution in dots per inch
    pub fn color_at_dpi(dpi: u32, rotation: RotationAngle) -> Self {
        Self {
            scale: dpi as f32 / POINTS_PER_INCH,
            rotation,
            color: ColorMode::Rgb,
        }
    }
}

/// Something that can render the pages of one document
pub trait PageRasterizer {
    /// Number of pages available for rendering
    fn page_count(&self) -> usize;

    /// Render a page (0-based) to an image
    fn render_page(&self, index: usize, options: &RenderOptions) -> Result<DynamicImage>;
}

/// Pdfium bindings used to open documents for rendering
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to the Pdfium library
    ///
    /// `library_dir` is tried first, then the current directory, then the
    /// system library search path.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let mut search_dirs: Vec<PathBuf> = Vec::new();
        if let Some(dir) = library_dir {
            search_dirs.push(dir.to_path_buf());
        }
        search_dirs.push(PathBuf::from("./"));

        for dir in &search_dirs {
            let library = Pdfium::pdfium_platform_library_name_at_path(dir);
            match Pdfium::bind_to_library(&library) {
                Ok(bindings) => {
                    debug!(library = %library.display(), "bound pdfium");
                    return Ok(Self {
                        pdfium: Pdfium::new(bindings),
                    });
                }
                Err(e) => debug!(library = %library.display(), error = %e, "pdfium not found"),
            }
        }

        Pdfium::bind_to_system_library()
            .map(|bindings| Self {
                pdfium: Pdfium::new(bindings),
            })
            .map_err(|e| PdfError::Library(format!("could not bind to pdfium: {e}")))
    }

    /// Open a document for rendering
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<PdfiumDocument<'_>> {
        let document = self
            .pdfium
            .load_pdf_from_file(path.as_ref(), None)
            .map_err(|e| PdfError::Render(format!("{}: {e}", path.as_ref().display())))?;
        Ok(PdfiumDocument { document })
    }
}

/// A document opened by Pdfium
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PageRasterizer for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, index: usize, options: &RenderOptions) -> Result<DynamicImage> {
        let page_index = u16::try_from(index)
            .map_err(|_| PdfError::Render(format!("page index {index} out of range")))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| PdfError::Render(format!("page {}: {e}", index + 1)))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(options.scale)
            .rotate(render_rotation(options.rotation), true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render(format!("page {}: {e}", index + 1)))?;

        let image = bitmap.as_image();
        Ok(match options.color {
            ColorMode::Gray => DynamicImage::ImageLuma8(image.to_luma8()),
            ColorMode::Rgb => DynamicImage::ImageRgb8(image.to_rgb8()),
        })
    }
}

fn render_rotation(angle: RotationAngle) -> PdfPageRenderRotation {
    match angle {
        RotationAngle::None => PdfPageRenderRotation::None,
        RotationAngle::Clockwise90 => PdfPageRenderRotation::Degrees90,
        RotationAngle::Rotate180 => PdfPageRenderRotation::Degrees180,
        RotationAngle::Clockwise270 => PdfPageRenderRotation::Degrees270,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render_options() {
        let options = RenderOptions::default();
        assert_eq!(options.scale, 2.0);
        assert_eq!(options.rotation, RotationAngle::None);
        assert_eq!(options.color, ColorMode::Gray);
    }

    #[test]
    fn test_color_at_dpi_scale() {
        let options = RenderOptions::color_at_dpi(144, RotationAngle::Rotate180);
        assert_eq!(options.scale, 2.0);
        assert_eq!(options.color, ColorMode::Rgb);
        assert_eq!(options.rotation, RotationAngle::Rotate180);
    }

    #[test]
    fn test_render_rotation_mapping() {
        assert!(matches!(
            render_rotation(RotationAngle::Clockwise90),
            PdfPageRenderRotation::Degrees90
        ));
        assert!(matches!(
            render_rotation(RotationAngle::Clockwise270),
            PdfPageRenderRotation::Degrees270
        ));
    }
}
