// ABOUTME: Entry point for the letterbox binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and prints stored users as JSON lines.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use letterbox_store::{StoreConfig, UserStore};

#[derive(Debug, Parser)]
#[command(name = "letterbox", version, about = "Inspect the letterbox user store")]
struct Cli {
    /// Directory holding user files (overrides LETTERBOX_USER_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// User file extension (overrides LETTERBOX_USER_EXT)
    #[arg(long, global = true)]
    ext: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every stored user as one JSON line
    List {
        /// Report unreadable user files and continue instead of stopping
        #[arg(long)]
        keep_going: bool,
    },
    /// Print one user as JSON
    Show { handle: String },
    /// Print the handle of every stored user
    Handles,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("letterbox=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config.dir = dir;
    }
    if let Some(ext) = cli.ext {
        config = StoreConfig::new(config.dir, &ext)?;
    }
    tracing::debug!("using user directory {}", config.dir.display());

    let store = UserStore::new(config);

    match cli.command {
        Command::List { keep_going: false } => {
            for user in store.all_users()? {
                println!("{}", serde_json::to_string(&user)?);
            }
        }
        Command::List { keep_going: true } => {
            let mut failed = 0usize;
            for (handle, result) in store.iter_users()? {
                match result {
                    Ok(user) => println!("{}", serde_json::to_string(&user)?),
                    Err(e) => {
                        tracing::error!("skipping user {}: {}", handle, e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{} user file(s) could not be loaded", failed);
            }
        }
        Command::Show { handle } => {
            let user = store.load(&handle)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Handles => {
            for handle in store.handles()? {
                println!("{}", handle);
            }
        }
    }

    Ok(())
}
