//! PDF page rotation baking
//!
//! Instead of relying on the `/Rotate` page attribute, the rotation is written
//! into the page itself: existing content streams are wrapped in a
//! transformation that turns them on the page, the media box is resized to the
//! rotated dimensions, and `/Rotate` is reset to zero. Viewers that ignore
//! `/Rotate` then show the same result as those that honor it.

use super::{ensure_input_exists, OperationError, OperationResult};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::{debug, info};

/// Rotation angle, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationAngle {
    /// No rotation (0 degrees)
    #[default]
    None,
    /// 90 degrees clockwise
    Clockwise90,
    /// 180 degrees
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Clockwise270,
}

impl RotationAngle {
    /// Create from degrees
    ///
    /// Any multiple of 90 is accepted, including negative values and values
    /// of a full turn or more.
    pub fn from_degrees(degrees: i32) -> Result<Self, OperationError> {
        match degrees.rem_euclid(360) {
            0 => Ok(RotationAngle::None),
            90 => Ok(RotationAngle::Clockwise90),
            180 => Ok(RotationAngle::Rotate180),
            270 => Ok(RotationAngle::Clockwise270),
            _ => Err(OperationError::InvalidRotation(degrees)),
        }
    }

    /// Convert to degrees
    pub fn to_degrees(self) -> i32 {
        match self {
            RotationAngle::None => 0,
            RotationAngle::Clockwise90 => 90,
            RotationAngle::Rotate180 => 180,
            RotationAngle::Clockwise270 => 270,
        }
    }

    /// Combine two rotations
    pub fn combine(self, other: RotationAngle) -> RotationAngle {
        match (self.to_degrees() + other.to_degrees()) % 360 {
            90 => RotationAngle::Clockwise90,
            180 => RotationAngle::Rotate180,
            270 => RotationAngle::Clockwise270,
            _ => RotationAngle::None,
        }
    }

    /// The same turn in the opposite direction
    pub fn inverse(self) -> RotationAngle {
        match self {
            RotationAngle::Clockwise90 => RotationAngle::Clockwise270,
            RotationAngle::Clockwise270 => RotationAngle::Clockwise90,
            other => other,
        }
    }

    /// Whether width and height trade places
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, RotationAngle::Clockwise90 | RotationAngle::Clockwise270)
    }
}

/// Options for baking rotations
#[derive(Debug, Clone)]
pub struct BakeRotationOptions {
    /// Extra rotation applied to every page, counter-clockwise like a
    /// content transformation (`from_degrees(90)` turns the content left)
    pub angle: RotationAngle,
    /// Also bake the rotation already declared by each page's `/Rotate`
    pub include_page_rotation: bool,
}

impl Default for BakeRotationOptions {
    fn default() -> Self {
        Self {
            angle: RotationAngle::None,
            include_page_rotation: true,
        }
    }
}

impl BakeRotationOptions {
    pub fn with_angle(mut self, angle: RotationAngle) -> Self {
        self.angle = angle;
        self
    }

    pub fn include_page_rotation(mut self, include: bool) -> Self {
        self.include_page_rotation = include;
        self
    }
}

/// Affine matrix `[a b c d e f]` as used by the `cm` operator
pub type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Page boundary normalized so that `x0 <= x1` and `y0 <= y1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageBox {
    fn from_object(object: &Object) -> OperationResult<Self> {
        let values = object
            .as_array()
            .map_err(|_| invalid_box("MediaBox is not an array"))?;
        if values.len() != 4 {
            return Err(invalid_box("MediaBox must have four numbers"));
        }
        let mut numbers = [0.0f32; 4];
        for (slot, value) in numbers.iter_mut().zip(values) {
            *slot = value
                .as_float()
                .map_err(|_| invalid_box("MediaBox entry is not a number"))?;
        }
        Ok(Self {
            x0: numbers[0].min(numbers[2]),
            y0: numbers[1].min(numbers[3]),
            x1: numbers[0].max(numbers[2]),
            y1: numbers[1].max(numbers[3]),
        })
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

fn invalid_box(message: &str) -> OperationError {
    OperationError::PdfError(crate::error::PdfError::InvalidStructure(message.to_string()))
}

/// Matrix that rotates the content of `page_box` clockwise by `angle` and moves
/// the result onto `[0 0 w' h']`
pub fn rotation_matrix(angle: RotationAngle, page_box: &PageBox) -> Matrix {
    let (w, h) = (page_box.width(), page_box.height());
    let [a, b, c, d, e, f] = match angle {
        RotationAngle::None => IDENTITY,
        RotationAngle::Clockwise90 => [0.0, -1.0, 1.0, 0.0, 0.0, w],
        RotationAngle::Rotate180 => [-1.0, 0.0, 0.0, -1.0, w, h],
        RotationAngle::Clockwise270 => [0.0, 1.0, -1.0, 0.0, h, 0.0],
    };
    // Fold in the translation of the box origin to (0, 0)
    [
        a,
        b,
        c,
        d,
        e - a * page_box.x0 - c * page_box.y0,
        f - b * page_box.x0 - d * page_box.y0,
    ]
}

/// Map a point through a `cm` matrix
pub fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Look up a page attribute, following `/Parent` links for inherited values
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Bounded walk in case of a cyclic page tree
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok().cloned(),
                direct => Some(direct.clone()),
            };
        }
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Bake rotations into every page of `doc`, returning the number of pages
pub fn bake_rotation(doc: &mut Document, options: &BakeRotationOptions) -> OperationResult<usize> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(OperationError::NoPagesToProcess);
    }

    for (index, page_id) in page_ids.iter().enumerate() {
        let effective = bake_page(doc, *page_id, options)?;
        debug!(
            page = index + 1,
            degrees = effective.to_degrees(),
            "baked page rotation"
        );
    }

    Ok(page_ids.len())
}

fn bake_page(
    doc: &mut Document,
    page_id: ObjectId,
    options: &BakeRotationOptions,
) -> OperationResult<RotationAngle> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .ok_or_else(|| invalid_box("page has no MediaBox"))
        .and_then(|object| PageBox::from_object(&object))?;

    let declared = if options.include_page_rotation {
        let degrees = inherited_attribute(doc, page_id, b"Rotate")
            .and_then(|object| match object {
                Object::Integer(degrees) => Some(degrees),
                Object::Real(degrees) => Some(degrees.round() as i64),
                _ => None,
            })
            .unwrap_or(0);
        RotationAngle::from_degrees(degrees as i32)?
    } else {
        RotationAngle::None
    };
    // `/Rotate` turns clockwise, the extra angle counter-clockwise
    let effective = options.angle.inverse().combine(declared);

    let (new_width, new_height) = if effective.swaps_dimensions() {
        (media_box.height(), media_box.width())
    } else {
        (media_box.width(), media_box.height())
    };

    let matrix = rotation_matrix(effective, &media_box);
    let contents = existing_contents(doc, page_id)?;

    let new_contents = if matrix != IDENTITY && !contents.is_empty() {
        let prefix = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("cm", matrix.iter().map(|v| Object::Real(*v)).collect()),
            ],
        };
        let suffix = Content {
            operations: vec![Operation::new("Q", vec![])],
        };
        let prefix_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), prefix.encode()?));
        let suffix_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), suffix.encode()?));

        let mut wrapped = Vec::with_capacity(contents.len() + 2);
        wrapped.push(Object::Reference(prefix_id));
        wrapped.extend(contents);
        wrapped.push(Object::Reference(suffix_id));
        Some(wrapped)
    } else {
        None
    };

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    if let Some(wrapped) = new_contents {
        page.set("Contents", Object::Array(wrapped));
    }
    page.set(
        "MediaBox",
        vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(new_width),
            Object::Real(new_height),
        ],
    );
    for key in [&b"CropBox"[..], b"BleedBox", b"TrimBox", b"ArtBox"] {
        page.remove(key);
    }
    page.set("Rotate", Object::Integer(0));

    Ok(effective)
}

/// Content stream entries of a page, flattened into a list of objects
fn existing_contents(doc: &Document, page_id: ObjectId) -> OperationResult<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    Ok(match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    })
}

/// Bake rotations in a PDF file and save the result to `output_path`
///
/// `output_path` may equal `input_path`; the input is fully loaded before
/// anything is written.
pub fn bake_rotation_pdf<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    options: &BakeRotationOptions,
) -> OperationResult<usize> {
    let input_path = input_path.as_ref();
    ensure_input_exists(input_path)?;

    let mut doc = Document::load(input_path)?;
    let pages = bake_rotation(&mut doc, options)?;
    doc.save(output_path.as_ref())?;

    info!(
        input = %input_path.display(),
        output = %output_path.as_ref().display(),
        pages,
        "baked rotation"
    );
    Ok(pages)
}

#[cfg(test)]
#[path = "rotate_tests.rs"]
mod rotate_tests;
