use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "photostrip", version)]
struct Cli {
    /// Booth config JSON (defaults plus PHOTOSTRIP_* environment overrides when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the vintage filter to one image and write a JPEG.
    Filter(FilterArgs),
    /// Compose a strip from already-filtered photos (photo count = number of inputs).
    Compose(ComposeArgs),
    /// Drive a booth session stored under the configured storage root.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Input image (any format the decoder understands).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Layout name printed in the caption.
    #[arg(long)]
    layout_name: String,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Filtered photos, in strip order.
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a session for a preset layout (`layout-a`..`layout-d`) or a custom one.
    Create {
        #[arg(long, conflicts_with_all = ["layout_name", "photo_count"])]
        layout: Option<String>,
        #[arg(long, requires = "photo_count")]
        layout_name: Option<String>,
        #[arg(long, requires = "layout_name")]
        photo_count: Option<u32>,
    },
    /// Filter and store one photo of a session.
    Capture {
        #[arg(long)]
        session: String,
        /// 0-based photo index.
        #[arg(long)]
        index: u32,
        #[arg(long = "in")]
        in_path: PathBuf,
    },
    /// Compose the strip once every photo is captured.
    Generate {
        #[arg(long)]
        session: String,
    },
    /// Print the session document as JSON.
    Show {
        #[arg(long)]
        session: String,
    },
    /// Copy the finished strip out of the store.
    Download {
        #[arg(long)]
        session: String,
        /// Output path; defaults to `photobooth_strip_<id>.jpg` in the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = photostrip::BoothConfig::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Filter(args) => cmd_filter(args),
        Command::Compose(args) => cmd_compose(&config, args),
        Command::Session(cmd) => cmd_session(&config, cmd),
    }
}

fn cmd_filter(args: FilterArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let raw = photostrip::decode_image(&bytes)?;
    let filtered = photostrip::apply_filter(&raw)?;
    let jpeg = photostrip::encode_jpeg(&filtered, photostrip::PHOTO_JPEG_QUALITY)?;
    write_output(&args.out, &jpeg)
}

fn cmd_compose(config: &photostrip::BoothConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let blobs = args
        .photos
        .iter()
        .map(|p| std::fs::read(p).with_context(|| format!("read photo '{}'", p.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let photo_count = u32::try_from(blobs.len()).context("too many photos")?;
    let layout = photostrip::LayoutSpec::new(photo_count, args.layout_name);

    let fonts = photostrip::CaptionFonts::load(
        config.caption_fonts.as_slice(),
        config.load_system_fonts,
    );
    let composer = photostrip::StripComposer::new(fonts);
    let jpeg = composer.compose_jpeg(&blobs, &layout)?;
    write_output(&args.out, &jpeg)
}

fn cmd_session(config: &photostrip::BoothConfig, cmd: SessionCommand) -> anyhow::Result<()> {
    let booth = photostrip::Booth::from_config(config)?;
    match cmd {
        SessionCommand::Create {
            layout,
            layout_name,
            photo_count,
        } => {
            let new = match (layout, layout_name, photo_count) {
                (Some(id), _, _) => {
                    let preset = photostrip::LayoutSpec::preset(&id)
                        .with_context(|| format!("unknown layout preset '{id}'"))?;
                    photostrip::NewSession::from(&preset)
                }
                (None, Some(name), Some(count)) => photostrip::NewSession {
                    layout_id: String::new(),
                    layout_name: name,
                    photo_count: count,
                },
                _ => anyhow::bail!("pass --layout or both --layout-name and --photo-count"),
            };
            let session = booth.create_session(new)?;
            println!("{}", session.id);
        }
        SessionCommand::Capture {
            session,
            index,
            in_path,
        } => {
            let bytes = std::fs::read(&in_path)
                .with_context(|| format!("read capture '{}'", in_path.display()))?;
            let record = booth.capture_photo_bytes(&session, index, &bytes)?;
            println!("{}", record.file_path.display());
        }
        SessionCommand::Generate { session } => {
            let outcome = booth.generate_strip(&session)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        SessionCommand::Show { session } => {
            let session = booth.session(&session)?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        SessionCommand::Download { session, out } => {
            let bytes = booth.download_strip(&session)?;
            let out = match out {
                Some(out) => out,
                None => PathBuf::from(booth.session(&session)?.download_filename()),
            };
            write_output(&out, &bytes)?;
        }
    }
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
