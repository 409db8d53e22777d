//! zepwatch: chat message notifier runtime binary.
//! Reads a render feed from a host bridge on stdin, runs it through the
//! detection pipeline and emits notifications.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use zepwatch_store::{FileStore, KvStore, MemoryStore, default_store_path};

mod cli;
mod commands;
mod feed;
mod run;
mod session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_logging();

    match args.command {
        cli::Command::Run(opts) => {
            tracing::info!("zepwatch starting");
            let store: Arc<dyn KvStore> = if opts.ephemeral {
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(open_store(args.store)?)
            };
            run::run(opts, store).await?;
        }
        cli::Command::Config(cmd) => {
            let store = open_store(args.store)?;
            println!("{}", commands::config(&store, cmd)?);
        }
        cli::Command::Identity(cmd) => {
            let store = open_store(args.store)?;
            println!("{}", commands::identity(&store, cmd)?);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the host protocol.
fn init_logging() {
    let filter = std::env::var("ZEPWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(path: Option<PathBuf>) -> anyhow::Result<FileStore> {
    let path = match path {
        Some(path) => path,
        None => default_store_path()?,
    };
    tracing::debug!(path = %path.display(), "opening store");
    Ok(FileStore::open(path)?)
}
