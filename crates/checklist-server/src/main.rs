//! Tab Checklist Binary
//!
//! Runs the loopback document service, or inspects the document file
//! directly the way the desktop widget does.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use checklist_core::{validate_shape, Checklist, ServerConfig, Store};
use checklist_server::{report, serve};

#[derive(Parser)]
#[command(name = "tab-checklist", version, about = "Tab checklist document service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the document on the loopback interface (default)
    Serve(ServeArgs),
    /// Print the stored checklist
    Show(FileArgs),
    /// Check that the stored document follows the item layout
    Check(FileArgs),
}

#[derive(Args, Default)]
struct FileArgs {
    /// Config file (defaults to <config dir>/tab-checklist/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document path (defaults to ~/.tab-checklist-data.json)
    #[arg(long)]
    data_file: Option<PathBuf>,
}

#[derive(Args, Default)]
struct ServeArgs {
    #[command(flatten)]
    file: FileArgs,

    /// Loopback port (defaults to 17432)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default()))).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Serve(args) => {
            let mut config = load_config(&args.file)?;
            if let Some(port) = args.port {
                config.port = port;
                config.validate()?;
            }
            serve(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show(args) => {
            let store = Store::new(load_config(&args)?.data_path()?);
            let checklist = Checklist::parse(&store.read_or_empty());
            print!("{}", report::render(&checklist));
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => {
            let store = Store::new(load_config(&args)?.data_path()?);
            let bytes = store.read()?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)?;
            match validate_shape(&value) {
                Ok(()) => {
                    println!("{}: ok", store.path().display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}: {}", store.path().display(), e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn load_config(args: &FileArgs) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = match (&args.config, ServerConfig::default_path()) {
        (Some(path), _) => ServerConfig::load_existing(path)?,
        (None, Some(path)) => ServerConfig::load(path)?,
        (None, None) => {
            let mut config = ServerConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    };
    if let Some(path) = &args.data_file {
        config.data_file = Some(path.clone());
    }
    Ok(config)
}
