use clap::{Parser, Subcommand};
use pixport::imaging::{DecoderRegistry, first_supported, probe_formats};
use pixport::options::{Background, ConversionOptions, MetadataMode, OutputFormat, Quality};
use pixport::pipeline::Session;
use pixport::{archive, output};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Input extensions picked up when a directory is given.
const IMAGE_EXTENSIONS: [&str; 12] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "ico", "heic", "heif", "avif",
];

#[derive(Parser)]
#[command(name = "pixport")]
#[command(about = "Batch image converter")]
#[command(long_about = "\
Batch image converter

Converts a set of images to one target encoding (jpg, png, webp or avif),
optionally resized to a maximum dimension, with EXIF carried over for
JPEG→JPEG conversions. A file that cannot be converted produces a
<name>.ERROR.txt next to the successful outputs instead of aborting the
batch.

Which target encodings are available is probed at startup; run
'pixport formats' to see the probe for this build.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert files (and files inside directories) to the target format
    Convert(ConvertArgs),
    /// List the output encodings this build supports
    Formats,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input files and/or directories (directories are walked recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target encoding; defaults to the first supported one
    #[arg(long, short = 'f', value_enum)]
    format: Option<OutputFormat>,

    /// Quality for lossy encodings, 1-100 (ignored for lossless)
    #[arg(long, short = 'q', default_value_t = 90)]
    quality: u8,

    /// Maximum output dimension on the longer side, 0 = keep original size
    #[arg(long, default_value_t = 0)]
    max_side: u32,

    /// Background color ("R,G,B") flattened under transparency for JPEG output
    #[arg(long, default_value = "255,255,255")]
    background: String,

    /// What to do with source metadata
    #[arg(long, value_enum, default_value = "discard")]
    metadata: MetadataMode,

    /// Directory to write results into
    #[arg(long, short = 'o', default_value = ".")]
    out_dir: PathBuf,

    /// Also bundle all results into a ZIP archive at this path
    #[arg(long)]
    zip: Option<PathBuf>,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Formats => {
            output::print_probe(&probe_formats());
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let supports = probe_formats();
    let format = match args.format {
        Some(format) => {
            let supported = supports
                .iter()
                .any(|s| s.format == format && s.supported);
            if !supported {
                return Err(format!(
                    "{} output is not supported by this build; run 'pixport formats'",
                    format.label()
                )
                .into());
            }
            format
        }
        None => first_supported(&supports)
            .ok_or("this build supports no output encodings at all")?,
    };

    let options = ConversionOptions {
        format,
        quality: Quality::new(args.quality),
        max_side: args.max_side,
        background: Background::parse(&args.background),
        metadata: args.metadata,
    };

    let mut session = Session::new();
    for path in collect_inputs(&args.inputs) {
        session.enqueue_path(&path)?;
    }
    if session.queue_len() == 0 {
        return Err("no image files found in the given inputs".into());
    }

    let registry = DecoderRegistry::default();
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{line}");
            }
        }
    });
    session.run(&options, &registry, Some(tx));
    printer.join().ok();

    std::fs::create_dir_all(&args.out_dir)?;
    for result in session.results() {
        std::fs::write(args.out_dir.join(result.name()), result.payload())?;
    }

    if let Some(zip_path) = &args.zip {
        let bytes = archive::bundle(session.results())?;
        std::fs::write(zip_path, bytes)?;
        println!("Archive: {}", zip_path.display());
    }

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(session.results())?;
        std::fs::write(report_path, json)?;
    }

    output::print_summary(session.results());
    Ok(())
}

/// Expand the input list: files pass through, directories are walked
/// recursively for known image extensions, in sorted order.
fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file() && has_image_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let lower = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&lower.as_str())
        })
}
