//! Switchyard CLI - check dispatcher settings and push files through them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use switchyard_common::{Chunk, Error, FileDescriptor};
use switchyard_dispatch::{DispatchSettings, Dispatcher};
use switchyard_storage::create_default_catalog;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Switchyard - multi-provider upload dispatcher")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load settings and resolve every provider.
    Check {
        /// Dispatcher settings file (JSON).
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Show which provider a file would be dispatched to.
    Route {
        /// Dispatcher settings file (JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// File to route.
        #[arg(short, long)]
        file: PathBuf,

        /// MIME type of the file.
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Stream a file through the dispatcher.
    Upload {
        /// Dispatcher settings file (JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// File to upload.
        #[arg(short, long)]
        file: PathBuf,

        /// MIME type of the file.
        #[arg(short, long)]
        mime: Option<String>,

        /// Print "null" instead of failing when the dispatch fails.
        #[arg(long)]
        lenient: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check { config } => cmd_check(&config),

        Commands::Route { config, file, mime } => cmd_route(&config, &file, mime).await,

        Commands::Upload {
            config,
            file,
            mime,
            lenient,
        } => cmd_upload(&config, &file, mime, lenient).await,
    }
}

/// Build a dispatcher from a settings file.
fn open_dispatcher(config: &Path) -> Result<Dispatcher> {
    info!("Loading settings from: {}", config.display());

    let settings = DispatchSettings::from_path(config).context("Failed to load settings")?;
    let dispatcher = Dispatcher::with_tracing(settings.into_config(), &create_default_catalog())
        .context("Failed to initialize dispatcher")?;

    Ok(dispatcher)
}

/// Describe a local file without reading its contents.
async fn describe_file(path: &Path, mime: Option<String>) -> Result<FileDescriptor> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("File path has no file name")?;
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    let mut file = FileDescriptor::new(name).with_size(size);
    file.mime = mime;
    Ok(file)
}

/// Validate settings.
fn cmd_check(config: &Path) -> Result<()> {
    let dispatcher = open_dispatcher(config)?;

    println!("Settings OK");
    for key in dispatcher.registry().keys() {
        println!("  provider: {}", key);
    }

    Ok(())
}

/// Print the provider key for a file.
async fn cmd_route(config: &Path, path: &Path, mime: Option<String>) -> Result<()> {
    let dispatcher = open_dispatcher(config)?;
    let file = describe_file(path, mime).await?;

    let key = dispatcher.route(&file).context("Failed to route file")?;
    println!("{}", key);

    Ok(())
}

/// Stream a file to its provider and print the provider's response.
async fn cmd_upload(config: &Path, path: &Path, mime: Option<String>, lenient: bool) -> Result<()> {
    let dispatcher = open_dispatcher(config)?;
    let mut file = describe_file(path, mime).await?;

    let reader = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let stream = ReaderStream::new(reader).map(|chunk| chunk.map(Chunk::Bytes).map_err(Error::from));
    file.stream = Some(Box::pin(stream));

    info!("Uploading {}", file.name);
    let output = if lenient {
        dispatcher.lenient().upload_stream(&mut file).await
    } else {
        Some(
            dispatcher
                .upload_stream(&mut file)
                .await
                .context("Upload failed")?,
        )
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if let Some(url) = &file.url {
        info!("Stored at {}", url);
    }

    Ok(())
}
