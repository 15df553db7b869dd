use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use probador::album::{self, AlbumStyle};
use probador::config::{self, AppConfig};
use probador::edit::{EditClient, GeminiTransport};
use probador::state::{StepId, StepStatus};
use probador::storage::{DownloadTarget, StorageService};
use probador::{FittingRoom, ImageRef};

#[derive(Parser, Debug)]
#[command(
    name = "probador",
    version,
    about = "Virtual fitting room backed by a remote image model"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all three steps on a photo of yourself and a photo of an outfit.
    TryOn(TryOnArgs),
    /// Compose existing images into an album page.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct TryOnArgs {
    /// Photo of the person (PNG, JPEG or WEBP).
    #[arg(long)]
    model: PathBuf,

    /// Photo of the outfit (PNG, JPEG or WEBP).
    #[arg(long)]
    outfit: PathBuf,

    /// Where step results are written. Defaults to the configured directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Save the final look to the album and write the album page.
    #[arg(long)]
    album: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Images to lay out, in order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output JPEG path.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    probador::logging::init();
    let cli = Cli::parse();
    let config = config::load_app_config();
    match cli.cmd {
        Command::TryOn(args) => cmd_try_on(args, &config),
        Command::Compose(args) => cmd_compose(args, &config),
    }
}

fn storage_for(output_dir: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<StorageService> {
    match output_dir.or_else(|| config.output_dir.clone()) {
        Some(dir) => Ok(StorageService::with_paths(dir)),
        None => StorageService::with_default_paths().context("resolve default output directory"),
    }
}

fn cmd_try_on(args: TryOnArgs, config: &AppConfig) -> anyhow::Result<()> {
    let api_key = config::api_key_from_env()?;
    let transport = GeminiTransport::new(&config.api_base, api_key, config.request_timeout());
    let client = EditClient::new(transport, config.model.clone());
    let storage = storage_for(args.output_dir, config)?;
    let mut room = FittingRoom::new(client, storage, config.album_style());

    let inputs = [
        (StepId::ModelPrep, Some(args.model.as_path())),
        (StepId::OutfitPrep, Some(args.outfit.as_path())),
        (StepId::Fusion, None),
    ];
    for (step, input) in inputs {
        if let Some(path) = input {
            room.upload_file(step, path)
                .with_context(|| format!("load '{}' for step {step}", path.display()))?;
        }
        run_step(&mut room, step)?;
        if let Some(saved) = room.download_step(step)? {
            println!("step {step}: {}", saved.display());
        }
        if step != StepId::Fusion || args.album {
            room.approve(step)?;
        }
    }

    if args.album {
        let page = room.download_album().context("write album page")?;
        println!("album: {}", page.display());
    }
    Ok(())
}

fn run_step<E: probador::edit::ImageEditor>(
    room: &mut FittingRoom<E>,
    step: StepId,
) -> anyhow::Result<()> {
    match room.process(step)? {
        StepStatus::Done => Ok(()),
        StepStatus::Error => {
            let message = room
                .workflow()
                .step(step)
                .error
                .clone()
                .unwrap_or_default();
            bail!("step {step} failed: {message}")
        }
        status => bail!("step {step} did not run (status {status:?})"),
    }
}

fn cmd_compose(args: ComposeArgs, config: &AppConfig) -> anyhow::Result<()> {
    let images = args
        .images
        .iter()
        .map(|path| load_image(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let style: AlbumStyle = config.album_style();
    let page = album::compose(&images, &style).context("compose album page")?;

    let path = match args.output {
        Some(path) => {
            let bytes = page.decode_bytes()?;
            std::fs::write(&path, bytes)
                .with_context(|| format!("write album page '{}'", path.display()))?;
            path
        }
        None => storage_for(None, config)?.save_image(&page, DownloadTarget::Album)?,
    };
    println!("album: {}", path.display());
    Ok(())
}

fn load_image(path: &Path) -> anyhow::Result<ImageRef> {
    ImageRef::from_file(path).with_context(|| format!("load image '{}'", path.display()))
}
