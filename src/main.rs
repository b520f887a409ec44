use clap::{Parser, Subcommand};
use darkroom::config::{self, PipelineConfig};
use darkroom::format::ImageFormat;
use darkroom::imaging::{ImageBackend, ImageHandle, RustBackend};
use darkroom::pipeline::Pipeline;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Apply image transformation pipelines to files in place")]
#[command(long_about = "\
Apply image transformation pipelines to files in place

Operations accumulate into a chain and run in one pass per file: decode,
transform, encode to a temp file, atomic rename over the original. A failed
run leaves the original file untouched.

Flags apply in a fixed order: --auto-orient, then the resize mode, then
--convert / --quality / --strip at encode time.

Examples:

  # 800x800 bounding-box thumbnails, sharpened, stripped of metadata
  darkroom apply --limit 800x800 --strip photos/*.jpg

  # Exact 400x400 crops converted to PNG
  darkroom apply --fill 400x400 --convert png avatars/*.jpg

  # Respect EXIF orientation, cap quality
  darkroom apply --auto-orient --quality 85 upload.jpg

Run 'darkroom gen-config' to generate a documented darkroom.toml.")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a transformation chain to one or more files, in place
    Apply(ApplyArgs),
    /// Print dimensions, format, and EXIF orientation per file
    Identify {
        /// Image files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stock darkroom.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Fit within WxH, preserving aspect ratio
    #[arg(long, value_name = "WxH", value_parser = parse_geometry)]
    fit: Option<(u32, u32)>,

    /// Cover and center-crop to exactly WxH
    #[arg(long, value_name = "WxH", value_parser = parse_geometry)]
    fill: Option<(u32, u32)>,

    /// Like --fit, but never upscale
    #[arg(long, value_name = "WxH", value_parser = parse_geometry)]
    limit: Option<(u32, u32)>,

    /// Fit, then pad to exactly WxH with the background color
    #[arg(long, value_name = "WxH", value_parser = parse_geometry)]
    pad: Option<(u32, u32)>,

    /// Convert to this format (must be in the configured allowed set)
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    convert: Option<ImageFormat>,

    /// JPEG quality (1-100)
    #[arg(long, value_name = "N")]
    quality: Option<u32>,

    /// Omit EXIF/ICC metadata from the output
    #[arg(long)]
    strip: bool,

    /// Rotate per the EXIF orientation tag and clear it
    #[arg(long)]
    auto_orient: bool,

    /// Path to darkroom.toml (defaults to built-in settings)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Image files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn parse_geometry(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let width: u32 = w.parse().map_err(|_| format!("bad width in '{s}'"))?;
    let height: u32 = h.parse().map_err(|_| format!("bad height in '{s}'"))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be at least 1".to_string());
    }
    Ok((width, height))
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    ImageFormat::parse(s).ok_or_else(|| format!("unknown format '{s}' (jpeg, png, webp, gif)"))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Apply(args) => apply(args),
        Command::Identify { files } => identify(&files),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
    }
}

fn apply(args: ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let resize_flags = [args.fit, args.fill, args.limit, args.pad]
        .iter()
        .filter(|f| f.is_some())
        .count();
    if resize_flags > 1 {
        return Err("use at most one of --fit, --fill, --limit, --pad".into());
    }

    let pipeline = Pipeline::new(RustBackend::new(), config);

    // One chain per file: no shared mutable image state between runs.
    let failures: Vec<String> = args
        .files
        .par_iter()
        .filter_map(|file| {
            let result = build_chain(&pipeline, &args)
                .and_then(|mut chain| pipeline.run(file, &mut chain).map_err(Into::into));
            match result {
                Ok(published) => {
                    println!("{}", published.display());
                    None
                }
                Err(e) => Some(format!("{}: {e}", file.display())),
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        for failure in &failures {
            eprintln!("error: {failure}");
        }
        Err(format!("{} of {} files failed", failures.len(), args.files.len()).into())
    }
}

fn build_chain(
    pipeline: &Pipeline<RustBackend>,
    args: &ApplyArgs,
) -> Result<darkroom::chain::OperationChain, Box<dyn std::error::Error + Send + Sync>> {
    let mut chain = pipeline.chain();
    if args.auto_orient {
        chain.auto_orient();
    }
    if let Some((w, h)) = args.fit {
        chain.resize_to_fit(w, h);
    } else if let Some((w, h)) = args.fill {
        chain.resize_to_fill(w, h);
    } else if let Some((w, h)) = args.limit {
        chain.resize_to_limit(w, h);
    } else if let Some((w, h)) = args.pad {
        chain.resize_and_pad(w, h, None);
    }
    if let Some(format) = args.convert {
        chain.convert(format)?;
    }
    if let Some(percent) = args.quality {
        chain.quality(percent);
    }
    if args.strip {
        chain.strip();
    }
    Ok(chain)
}

fn identify(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let mut failed = false;
    for file in files {
        match backend.decode(file) {
            Ok(img) => {
                let orientation = img
                    .orientation()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}: {}x{} {} orientation={}",
                    file.display(),
                    img.width(),
                    img.height(),
                    img.source_format(),
                    orientation
                );
            }
            Err(e) => {
                eprintln!("error: {}: {e}", file.display());
                failed = true;
            }
        }
    }
    if failed {
        return Err("some files could not be identified".into());
    }
    Ok(())
}
