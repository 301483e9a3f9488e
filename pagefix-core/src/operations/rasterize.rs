//! Rebuild a PDF from rendered page images
//!
//! Every page is rendered in full color with a rotation applied and placed as
//! a single image on a new page of the same physical size. The result looks
//! like the source but carries no text, vectors or fonts, which flattens
//! anything a viewer might otherwise render differently.

use super::rotate::RotationAngle;
use super::{ensure_input_exists, OperationError, OperationResult};
use crate::error::PdfError;
use crate::render::{PageRasterizer, PdfiumRenderer, RenderOptions, POINTS_PER_INCH};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for rasterizing a document
#[derive(Debug, Clone)]
pub struct RasterizeOptions {
    /// Rotation applied while rendering (clockwise)
    pub angle: RotationAngle,
    /// Render resolution in dots per inch
    pub resolution: u32,
}

impl Default for RasterizeOptions {
    fn default() -> Self {
        Self {
            angle: RotationAngle::None,
            resolution: 200,
        }
    }
}

impl RasterizeOptions {
    pub fn with_angle(mut self, angle: RotationAngle) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_resolution(mut self, dpi: u32) -> Self {
        self.resolution = dpi;
        self
    }

    pub fn validate(&self) -> OperationResult<()> {
        if self.resolution == 0 {
            return Err(OperationError::InvalidResolution(self.resolution));
        }
        Ok(())
    }
}

/// Output path used by batch runs: `<stem>_raster<angle>.pdf` next to `source`
pub fn raster_output_path(source: &Path, angle: RotationAngle) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}_raster{}.pdf", angle.to_degrees()))
}

/// Render every page of `rasterizer` into a new image-only document
pub fn rasterize_document<R: PageRasterizer + ?Sized>(
    rasterizer: &R,
    options: &RasterizeOptions,
) -> OperationResult<Document> {
    options.validate()?;

    let page_count = rasterizer.page_count();
    if page_count == 0 {
        return Err(OperationError::NoPagesToProcess);
    }

    let render_options = RenderOptions::color_at_dpi(options.resolution, options.angle);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(page_count);

    for index in 0..page_count {
        let image = rasterizer.render_page(index, &render_options)?.to_rgb8();
        let page_id = add_image_page(&mut doc, pages_id, &image, options.resolution)?;
        debug!(
            page = index + 1,
            width = image.width(),
            height = image.height(),
            "rasterized page"
        );
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: &RgbImage,
    resolution: u32,
) -> OperationResult<ObjectId> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidImage("rendered page is empty".to_string()).into());
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.as_raw())?;
    let data = encoder.finish()?;

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        data,
    ));

    let points_per_pixel = POINTS_PER_INCH / resolution as f32;
    let page_width = width as f32 * points_per_pixel;
    let page_height = height as f32 * points_per_pixel;

    // The image space is the unit square; scale it to cover the page
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page_width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page_height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_width),
            Object::Real(page_height),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
        },
        "Contents" => Object::Reference(content_id),
    }))
}

/// Rasterize a PDF file and save the rebuilt document to `output_path`
///
/// Returns the number of pages written.
pub fn rasterize_pdf<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    options: &RasterizeOptions,
    renderer: &PdfiumRenderer,
) -> OperationResult<usize> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    ensure_input_exists(input_path)?;
    options.validate()?;

    let mut doc = {
        let source = renderer.open(input_path)?;
        rasterize_document(&source, options)?
    };
    let pages = doc.get_pages().len();
    doc.save(output_path)?;

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        pages,
        dpi = options.resolution,
        degrees = options.angle.to_degrees(),
        "rasterized document"
    );
    Ok(pages)
}

#[cfg(test)]
#[path = "rasterize_tests.rs"]
mod rasterize_tests;
