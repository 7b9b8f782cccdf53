use clap::Parser;
use std::path::PathBuf;
use thasinn::catalog::Catalog;

/// THASINN69 music showcase for the terminal.
#[derive(Parser, Debug)]
#[command(name = "thasinn", version, about)]
struct Args {
    /// JSON catalog to play instead of the built-in songs
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory relative song and cover locators are resolved against
    #[arg(long, default_value = ".")]
    media_dir: PathBuf,

    /// Run without an audio device
    #[arg(long)]
    no_audio: bool,

    /// Seed for the shuffle order
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logging is best effort; the player works without it.
    let _log_guard = thasinn::logging::init().ok();

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::builtin(),
    }
    .resolve_sources(&args.media_dir);
    tracing::info!(songs = catalog.len(), media_dir = %args.media_dir.display(), "catalog ready");

    thasinn::app::run_with_startup(thasinn::app::AppStartupOptions {
        catalog,
        force_null_audio: args.no_audio,
        seed: args.seed,
    })
}
