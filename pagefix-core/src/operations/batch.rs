//! Run an operation over a list of files
//!
//! Files are processed in the order given. A file that does not exist is
//! skipped and reported; any other failure stops the batch and is returned to
//! the caller, so a broken engine is never silently ignored.

use super::rasterize::{raster_output_path, rasterize_pdf, RasterizeOptions};
use super::rotate::{bake_rotation_pdf, BakeRotationOptions, RotationAngle};
use super::OperationResult;
use crate::render::PdfiumRenderer;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Files to process, in order
    pub files: Vec<PathBuf>,
    /// Rotation applied to every page (clockwise)
    pub angle: RotationAngle,
    /// Render resolution in dots per inch, for rasterizing batches
    pub resolution: u32,
    /// Write `<stem><suffix>.pdf` instead of overwriting, for rotation batches
    pub output_suffix: Option<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            angle: RotationAngle::None,
            resolution: 200,
            output_suffix: None,
        }
    }
}

impl BatchOptions {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_angle(mut self, angle: RotationAngle) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_resolution(mut self, dpi: u32) -> Self {
        self.resolution = dpi;
        self
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = Some(suffix.into());
        self
    }
}

/// What happened to one file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file does not exist
    Skipped { source: PathBuf },
    /// The file was processed
    Converted {
        source: PathBuf,
        output: PathBuf,
        pages: usize,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Skipped { source } | FileOutcome::Converted { source, .. } => source,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, FileOutcome::Skipped { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Skipped { source } => {
                write!(f, "Skip (not found): {}", source.display())
            }
            FileOutcome::Converted {
                source,
                output,
                pages,
            } => write!(
                f,
                "{} -> {} ({pages} pages)",
                source.display(),
                output.display()
            ),
        }
    }
}

/// Outcomes of a batch run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_skipped()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// Total pages written across all converted files
    pub fn pages(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                FileOutcome::Converted { pages, .. } => *pages,
                FileOutcome::Skipped { .. } => 0,
            })
            .sum()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} file(s), {} page(s); skipped {}",
            self.converted(),
            self.pages(),
            self.skipped()
        )
    }
}

/// Apply `convert` to every existing file in `files`
///
/// `convert` returns the output path and page count for one source file.
/// Missing files become [`FileOutcome::Skipped`]; the first error returned by
/// `convert` ends the batch.
pub fn run_batch<F>(files: &[PathBuf], mut convert: F) -> OperationResult<BatchReport>
where
    F: FnMut(&Path) -> OperationResult<(PathBuf, usize)>,
{
    let mut report = BatchReport::default();

    for source in files {
        if !source.is_file() {
            warn!(path = %source.display(), "input not found, skipping");
            report.outcomes.push(FileOutcome::Skipped {
                source: source.clone(),
            });
            continue;
        }

        let (output, pages) = convert(source)?;
        report.outcomes.push(FileOutcome::Converted {
            source: source.clone(),
            output,
            pages,
        });
    }

    info!(
        converted = report.converted(),
        skipped = report.skipped(),
        pages = report.pages(),
        "batch finished"
    );
    Ok(report)
}

/// Output path of a rotation batch: the source itself, or `<stem><suffix>.pdf`
pub fn bake_output_path(source: &Path, suffix: Option<&str>) -> PathBuf {
    match suffix {
        None => source.to_path_buf(),
        Some(suffix) => {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            source.with_file_name(format!("{stem}{suffix}.pdf"))
        }
    }
}

/// Rasterize every file of the batch to `<stem>_raster<angle>.pdf`
pub fn rasterize_batch(
    options: &BatchOptions,
    renderer: &PdfiumRenderer,
) -> OperationResult<BatchReport> {
    let raster_options = RasterizeOptions::default()
        .with_angle(options.angle)
        .with_resolution(options.resolution);
    raster_options.validate()?;

    run_batch(&options.files, |source| {
        let output = raster_output_path(source, options.angle);
        let pages = rasterize_pdf(source, &output, &raster_options, renderer)?;
        Ok((output, pages))
    })
}

/// Bake rotations into every file of the batch
///
/// Files are rewritten in place unless the options carry an output suffix.
pub fn bake_rotation_batch(
    options: &BatchOptions,
    include_page_rotation: bool,
) -> OperationResult<BatchReport> {
    let bake_options = BakeRotationOptions::default()
        .with_angle(options.angle)
        .include_page_rotation(include_page_rotation);

    run_batch(&options.files, |source| {
        let output = bake_output_path(source, options.output_suffix.as_deref());
        let pages = bake_rotation_pdf(source, &output, &bake_options)?;
        Ok((output, pages))
    })
}
