use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "twibbon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo under a twibbon frame and write the watermarked PNG.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// User photo (PNG, JPEG, ...).
    #[arg(long)]
    photo: PathBuf,

    /// Frame image; defaults to the configured frame asset path.
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Canvas configuration JSON (defaults to the built-in 1024x1024 layout).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Photo zoom factor, clamped to the interactive range.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Photo pan offset, x.
    #[arg(long, default_value_t = 0.0)]
    offset_x: f64,

    /// Photo pan offset, y.
    #[arg(long, default_value_t = 0.0)]
    offset_y: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => read_config_json(path)?,
        None => twibbon::CanvasConfig::default(),
    };
    config.validate()?;

    let photo = read_raster(&args.photo)?;
    let frame_path = args
        .frame
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.frame.source));
    let frame = read_raster(&frame_path)?;

    let mut transform = twibbon::ViewTransform::default();
    transform.apply_pan(args.offset_x, args.offset_y);
    transform.apply_zoom(args.scale);

    let artifact =
        twibbon::exporter::export_download(&config, Some(&photo), Some(&frame), transform)?;

    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    fs::write(&args.out, &artifact.png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn read_config_json(path: &Path) -> anyhow::Result<twibbon::CanvasConfig> {
    let body =
        fs::read(path).with_context(|| format!("open config '{}'", path.display()))?;
    let config: twibbon::CanvasConfig =
        serde_json::from_slice(&body).context("parse config JSON")?;
    Ok(config)
}

fn read_raster(path: &Path) -> anyhow::Result<twibbon::Raster> {
    let bytes = fs::read(path).with_context(|| format!("open image '{}'", path.display()))?;
    let raster = twibbon::Raster::decode(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(raster)
}
