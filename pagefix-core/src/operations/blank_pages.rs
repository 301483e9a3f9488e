//! Blank page detection and removal
//!
//! A page is considered blank when it has no content stream at all, or when
//! the share of white pixels in a grayscale rendering of the page reaches a
//! threshold. Rendering is what makes the check robust: a page may carry
//! operators (an empty text object, a white rectangle, a scanner's
//! near-white background) and still show nothing on paper.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pagefix::operations::blank_pages::{remove_blank_pages, BlankPageOptions};
//! use pagefix::render::PdfiumRenderer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = PdfiumRenderer::bind(None)?;
//! let options = BlankPageOptions::default().with_threshold(0.99);
//!
//! let report = remove_blank_pages("scan.pdf", "scan_clean.pdf", &options, &renderer)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

use super::page_selection::retain_pages;
use super::{ensure_input_exists, OperationError, OperationResult};
use crate::content::{page_content_state, ContentState};
use crate::error::PdfError;
use crate::raster::{PixelStats, WhiteLevels};
use crate::render::{PageRasterizer, PdfiumRenderer, RenderOptions};
use image::DynamicImage;
use lopdf::{Document, ObjectId};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// What to do when a page's content stream cannot be inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentQueryFallback {
    /// Treat the page as having content and decide from its pixels
    #[default]
    AssumeContent,
    /// Surface the error to the caller
    Fail,
}

/// Configuration options for blank page detection
#[derive(Debug, Clone)]
pub struct BlankPageOptions {
    /// Minimum fraction of white pixels for a page to be blank (0.0 to 1.0)
    pub threshold: f64,
    /// Render scale relative to 72 dpi; higher is slower but more precise
    pub scale: f32,
    /// Intensity levels counted as white
    pub white_levels: WhiteLevels,
    /// Policy for pages whose content stream cannot be read
    pub content_fallback: ContentQueryFallback,
}

impl Default for BlankPageOptions {
    fn default() -> Self {
        Self {
            threshold: 0.995,
            scale: 2.0,
            white_levels: WhiteLevels::default(),
            content_fallback: ContentQueryFallback::AssumeContent,
        }
    }
}

impl BlankPageOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_white_levels(mut self, levels: WhiteLevels) -> Self {
        self.white_levels = levels;
        self
    }

    pub fn with_content_fallback(mut self, fallback: ContentQueryFallback) -> Self {
        self.content_fallback = fallback;
        self
    }

    /// Check that every option is within its allowed range
    pub fn validate(&self) -> OperationResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(OperationError::InvalidThreshold(self.threshold));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(OperationError::InvalidScale(self.scale));
        }
        if !self.white_levels.is_valid() {
            return Err(OperationError::InvalidWhiteLevels {
                exact: self.white_levels.exact,
                near: self.white_levels.near,
            });
        }
        Ok(())
    }
}

/// A page that can be checked for blankness
pub trait ClassifiablePage {
    /// Whether the page has any content operators
    fn content_state(&self) -> OperationResult<ContentState>;

    /// Render the page in grayscale at `scale` times 72 dpi
    fn render_grayscale(&self, scale: f32) -> OperationResult<DynamicImage>;
}

/// Why a page was classified the way it was
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlankReason {
    /// The page has no content stream
    EmptyContent,
    /// Decided from the rendered pixels
    Pixels(PixelStats),
}

/// Classification of a single page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageVerdict {
    /// Page number (1-based)
    pub page_number: usize,
    /// Whether the page counts as blank
    pub is_blank: bool,
    /// Evidence behind the decision
    pub reason: BlankReason,
}

impl PageVerdict {
    /// White pixel ratio, or 1.0 for pages without content
    pub fn white_ratio(&self) -> f64 {
        match &self.reason {
            BlankReason::EmptyContent => 1.0,
            BlankReason::Pixels(stats) => stats.white_ratio(),
        }
    }
}

/// Decides whether rendered pages are blank
#[derive(Debug, Clone)]
pub struct BlankPageClassifier {
    options: BlankPageOptions,
}

impl BlankPageClassifier {
    /// Create a classifier, validating the options
    pub fn new(options: BlankPageOptions) -> OperationResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &BlankPageOptions {
        &self.options
    }

    /// Returns true if the page is blank
    pub fn classify<P: ClassifiablePage + ?Sized>(&self, page: &P) -> OperationResult<bool> {
        Ok(self.evaluate(0, page)?.is_blank)
    }

    /// Classify a page and keep the evidence
    ///
    /// `page_number` is only used for reporting and logging.
    pub fn evaluate<P: ClassifiablePage + ?Sized>(
        &self,
        page_number: usize,
        page: &P,
    ) -> OperationResult<PageVerdict> {
        match page.content_state() {
            Ok(ContentState::Empty) => {
                debug!(page = page_number, "no content stream, blank");
                return Ok(PageVerdict {
                    page_number,
                    is_blank: true,
                    reason: BlankReason::EmptyContent,
                });
            }
            Ok(ContentState::HasContent) => {}
            Err(error) => match self.options.content_fallback {
                ContentQueryFallback::AssumeContent => {
                    warn!(
                        page = page_number,
                        %error,
                        "content stream query failed, falling back to pixel analysis"
                    );
                }
                ContentQueryFallback::Fail => return Err(error),
            },
        }

        let image = page.render_grayscale(self.options.scale)?;
        let stats = PixelStats::from_image(&image, self.options.white_levels);
        let ratio = stats.white_ratio();
        let is_blank = ratio >= self.options.threshold;

        debug!(
            page = page_number,
            exact_white = stats.exact_white,
            near_white = stats.near_white,
            total = stats.total,
            ratio,
            is_blank,
            "analyzed page pixels"
        );

        Ok(PageVerdict {
            page_number,
            is_blank,
            reason: BlankReason::Pixels(stats),
        })
    }
}

/// Returns true if `page` is blank under `threshold` at render `scale`
///
/// Uses the default white levels and content query fallback.
pub fn is_blank_page<P: ClassifiablePage + ?Sized>(
    page: &P,
    threshold: f64,
    scale: f32,
) -> OperationResult<bool> {
    let options = BlankPageOptions::default()
        .with_threshold(threshold)
        .with_scale(scale);
    BlankPageClassifier::new(options)?.classify(page)
}

/// A page of a `lopdf` document rendered through a [`PageRasterizer`]
pub struct DocumentPage<'a, R: PageRasterizer + ?Sized> {
    document: &'a Document,
    page_id: ObjectId,
    index: usize,
    rasterizer: &'a R,
}

impl<'a, R: PageRasterizer + ?Sized> DocumentPage<'a, R> {
    pub fn new(document: &'a Document, page_id: ObjectId, index: usize, rasterizer: &'a R) -> Self {
        Self {
            document,
            page_id,
            index,
            rasterizer,
        }
    }
}

impl<R: PageRasterizer + ?Sized> ClassifiablePage for DocumentPage<'_, R> {
    fn content_state(&self) -> OperationResult<ContentState> {
        page_content_state(self.document, self.page_id)
            .map_err(|e| OperationError::ContentQuery(e.to_string()))
    }

    fn render_grayscale(&self, scale: f32) -> OperationResult<DynamicImage> {
        Ok(self
            .rasterizer
            .render_page(self.index, &RenderOptions::grayscale(scale))?)
    }
}

/// Outcome of a blank page removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Pages in the input document
    pub total: usize,
    /// Pages written to the output
    pub kept: usize,
    /// Pages dropped as blank
    pub removed: usize,
    /// Page numbers (1-based) that were kept
    pub kept_pages: Vec<u32>,
    /// Page numbers (1-based) that were removed
    pub removed_pages: Vec<u32>,
}

impl fmt::Display for RemovalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total pages: {}", self.total)?;
        writeln!(f, "Kept pages: {}", self.kept)?;
        write!(f, "Removed pages: {}", self.removed)
    }
}

/// Finds and removes blank pages of a document
pub struct BlankPageRemover<'r, R: PageRasterizer + ?Sized> {
    classifier: BlankPageClassifier,
    rasterizer: &'r R,
}

impl<'r, R: PageRasterizer + ?Sized> BlankPageRemover<'r, R> {
    /// Create a remover; `rasterizer` must render the same document that is
    /// later passed to [`classify_pages`](Self::classify_pages)
    pub fn new(options: BlankPageOptions, rasterizer: &'r R) -> OperationResult<Self> {
        Ok(Self {
            classifier: BlankPageClassifier::new(options)?,
            rasterizer,
        })
    }

    /// Classify every page, in document order
    pub fn classify_pages(&self, doc: &Document) -> OperationResult<Vec<PageVerdict>> {
        let pages = doc.get_pages();
        let rendered = self.rasterizer.page_count();
        if rendered != pages.len() {
            return Err(OperationError::PdfError(PdfError::InvalidStructure(format!(
                "renderer sees {rendered} pages, document has {}",
                pages.len()
            ))));
        }

        pages
            .values()
            .enumerate()
            .map(|(index, page_id)| {
                let page = DocumentPage::new(doc, *page_id, index, self.rasterizer);
                self.classifier.evaluate(index + 1, &page)
            })
            .collect()
    }

    /// Remove blank pages from `doc` in place
    ///
    /// Fails with `NoPagesToProcess`, leaving `doc` untouched, when every page
    /// is blank.
    pub fn remove_from(&self, doc: &mut Document) -> OperationResult<RemovalReport> {
        let verdicts = self.classify_pages(doc)?;

        let (blank, kept): (Vec<&PageVerdict>, Vec<&PageVerdict>) =
            verdicts.iter().partition(|verdict| verdict.is_blank);
        let kept_pages: Vec<u32> = kept.iter().map(|v| v.page_number as u32).collect();
        let removed_pages: Vec<u32> = blank.iter().map(|v| v.page_number as u32).collect();

        if kept_pages.is_empty() {
            return Err(OperationError::NoPagesToProcess);
        }

        retain_pages(doc, &kept_pages)?;

        Ok(RemovalReport {
            total: verdicts.len(),
            kept: kept_pages.len(),
            removed: removed_pages.len(),
            kept_pages,
            removed_pages,
        })
    }
}

/// Classify every page of a PDF file without modifying it
pub fn classify_pdf_pages<P: AsRef<Path>>(
    input_path: P,
    options: &BlankPageOptions,
    renderer: &PdfiumRenderer,
) -> OperationResult<Vec<PageVerdict>> {
    let input_path = input_path.as_ref();
    ensure_input_exists(input_path)?;

    let doc = Document::load(input_path)?;
    let rendered = renderer.open(input_path)?;
    BlankPageRemover::new(options.clone(), &rendered)?.classify_pages(&doc)
}

/// Remove blank pages from a PDF file
///
/// The input is left untouched; kept pages are written to `output_path` in
/// their original order.
pub fn remove_blank_pages<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    options: &BlankPageOptions,
    renderer: &PdfiumRenderer,
) -> OperationResult<RemovalReport> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    ensure_input_exists(input_path)?;

    let mut doc = Document::load(input_path)?;
    let report = {
        let rendered = renderer.open(input_path)?;
        BlankPageRemover::new(options.clone(), &rendered)?.remove_from(&mut doc)?
    };
    doc.save(output_path)?;

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        total = report.total,
        kept = report.kept,
        removed = report.removed,
        "removed blank pages"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "blank_pages_tests.rs"]
mod blank_pages_tests;
