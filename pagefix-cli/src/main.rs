use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use pagefix::operations::{
    bake_rotation_batch, classify_pdf_pages, ensure_input_exists, rasterize_batch,
    remove_blank_pages, BatchOptions, BatchReport, BlankPageOptions, BlankReason,
    ContentQueryFallback, FileOutcome, RotationAngle,
};
use pagefix::{PdfiumRenderer, WhiteLevels};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "pagefix",
    about = "Remove blank pages, bake rotations and rasterize PDF files",
    version,
    author
)]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory containing the Pdfium library
    #[arg(long, env = "PAGEFIX_PDFIUM_LIB", global = true)]
    pdfium_lib: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Blank page detection settings shared by `remove-blank` and `analyze`
#[derive(Args)]
struct DetectionArgs {
    /// Minimum fraction of white pixels for a page to count as blank
    #[arg(short, long, default_value_t = 0.995)]
    threshold: f64,

    /// Render scale relative to 72 dpi
    #[arg(short, long, default_value_t = 2.0)]
    zoom: f32,

    /// Gray level counted as exactly white
    #[arg(long, default_value_t = 255)]
    exact_white: u8,

    /// Lowest gray level counted as near white
    #[arg(long, default_value_t = 250)]
    near_white: u8,

    /// Fail instead of falling back to pixels when a content stream is unreadable
    #[arg(long)]
    strict_content: bool,
}

impl DetectionArgs {
    fn options(&self) -> BlankPageOptions {
        let fallback = if self.strict_content {
            ContentQueryFallback::Fail
        } else {
            ContentQueryFallback::AssumeContent
        };
        BlankPageOptions::default()
            .with_threshold(self.threshold)
            .with_scale(self.zoom)
            .with_white_levels(WhiteLevels::new(self.exact_white, self.near_white))
            .with_content_fallback(fallback)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Remove blank pages from a PDF
    RemoveBlank {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Show which pages of a PDF would be removed as blank
    Analyze {
        /// Input PDF file
        input: PathBuf,

        #[command(flatten)]
        detection: DetectionArgs,

        /// Print the verdicts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rebuild PDFs from rotated page images, writing <name>_raster<angle>.pdf
    Rasterize {
        /// Input PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Clockwise rotation in degrees (multiple of 90)
        #[arg(short, long, default_value_t = 180, allow_negative_numbers = true)]
        angle: i32,

        /// Render resolution in dots per inch
        #[arg(short, long, default_value_t = 200)]
        dpi: u32,
    },

    /// Bake page rotations into the page content, in place by default
    BakeRotation {
        /// Input PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Extra counter-clockwise rotation in degrees (multiple of 90)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        angle: i32,

        /// Write <name><suffix>.pdf instead of overwriting the input
        #[arg(short, long)]
        suffix: Option<String>,

        /// Leave each page's own /Rotate out of the baked rotation
        #[arg(long)]
        ignore_page_rotation: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_angle(degrees: i32) -> RotationAngle {
    match RotationAngle::from_degrees(degrees) {
        Ok(angle) => angle,
        Err(e) => {
            eprintln!("Error: {e}. Valid angles are 0, 90, 180, 270");
            std::process::exit(1);
        }
    }
}

fn bind_renderer(library_dir: Option<&Path>) -> Result<PdfiumRenderer> {
    let renderer = PdfiumRenderer::bind(library_dir).context(
        "Pdfium is required for rendering; pass --pdfium-lib or set PAGEFIX_PDFIUM_LIB",
    )?;
    info!(library_dir = ?library_dir, "pdfium ready");
    Ok(renderer)
}

fn print_batch(report: &BatchReport) {
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Skipped { .. } => println!("{outcome}"),
            FileOutcome::Converted { .. } => println!("✓ {outcome}"),
        }
    }
    println!("{report}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let library_dir = cli.pdfium_lib.as_deref();

    match cli.command {
        Commands::RemoveBlank {
            input,
            output,
            detection,
        } => {
            let options = detection.options();
            if let Err(e) = options.validate() {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            if let Err(e) = ensure_input_exists(&input) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }

            let renderer = bind_renderer(library_dir)?;
            let report = remove_blank_pages(&input, &output, &options, &renderer)
                .with_context(|| format!("Failed to remove blank pages from {}", input.display()))?;

            println!("{report}");
            println!("Output written to: {}", output.display());
        }

        Commands::Analyze {
            input,
            detection,
            json,
        } => {
            let options = detection.options();
            if let Err(e) = options.validate() {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            if let Err(e) = ensure_input_exists(&input) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }

            let renderer = bind_renderer(library_dir)?;
            let verdicts = classify_pdf_pages(&input, &options, &renderer)
                .with_context(|| format!("Failed to analyze {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&verdicts)?);
            } else {
                println!("Blank page analysis for: {}", input.display());
                println!("==========================================");
                for verdict in &verdicts {
                    let label = if verdict.is_blank { "blank" } else { "content" };
                    match verdict.reason {
                        BlankReason::EmptyContent => {
                            println!("Page {}: {label} (no content stream)", verdict.page_number)
                        }
                        BlankReason::Pixels(_) => println!(
                            "Page {}: {label} ({:.2}% white)",
                            verdict.page_number,
                            verdict.white_ratio() * 100.0
                        ),
                    }
                }
                let blank = verdicts.iter().filter(|v| v.is_blank).count();
                println!("\n{blank} of {} pages are blank", verdicts.len());
            }
        }

        Commands::Rasterize { files, angle, dpi } => {
            let angle = parse_angle(angle);
            if dpi == 0 {
                eprintln!("Error: DPI must be greater than 0");
                std::process::exit(1);
            }

            let renderer = bind_renderer(library_dir)?;
            let options = BatchOptions::new(files)
                .with_angle(angle)
                .with_resolution(dpi);
            let report = rasterize_batch(&options, &renderer).context("Rasterization failed")?;
            print_batch(&report);
        }

        Commands::BakeRotation {
            files,
            angle,
            suffix,
            ignore_page_rotation,
        } => {
            let rotation = parse_angle(angle);
            info!(
                files = files.len(),
                degrees = rotation.to_degrees(),
                include_page_rotation = !ignore_page_rotation,
                "starting rotation batch"
            );
            let mut options = BatchOptions::new(files).with_angle(rotation);
            if let Some(suffix) = suffix {
                options = options.with_output_suffix(suffix);
            }

            let report = bake_rotation_batch(&options, !ignore_page_rotation)
                .context("Rotation baking failed")?;
            print_batch(&report);
        }
    }

    Ok(())
}
