mod cli;

use crate::cli::{Cli, Command, StorageBackendArg};
use anyhow::Context;
use burrow_allocator::{AllocateParams, Allocator, AllocatorService};
use burrow_core::{CodeStore, SequenceSeed, SequenceStore, ShortPath};
use burrow_storage::{InMemoryCodeStore, InMemorySequenceStore, MySqlStore};
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    info!(storage = %cli.storage, "starting burrow");

    match cli.storage {
        StorageBackendArg::InMemory => {
            run(&cli, InMemorySequenceStore::new(), InMemoryCodeStore::new()).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = cli
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(mysql_dsn).await?;
            if matches!(cli.command, Command::Init) {
                store.create_schema().await?;
                info!("schema ready");
            }
            run(&cli, store.clone(), store).await
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run<S, C>(cli: &Cli, sequence: S, codes: C) -> anyhow::Result<()>
where
    S: SequenceStore,
    C: CodeStore,
{
    let service = AllocatorService::bootstrap(sequence, codes, cli.seed(), cli.settings()).await?;

    match &cli.command {
        Command::Init => {
            let lcg = service.lcg();
            let stored = SequenceSeed {
                a: lcg.a(),
                b: lcg.b(),
                state: service.sequence().read_state().await?,
            };
            println!("{}", serde_json::to_string(&stored)?);
        }
        Command::Shorten {
            payload,
            literal,
            path,
            base_url,
        } => {
            let params = AllocateParams {
                payload: payload.clone(),
                is_literal: *literal,
                custom_path: path.clone(),
            };
            let path = service.allocate(params).await?;
            let url = base_url.as_deref().map(|base| path.to_url(base));
            println!("{}", json!({ "path": path, "url": url }));
        }
        Command::Resolve { path } => {
            let path = ShortPath::new_unchecked(path.as_str());
            let record = service
                .resolve(&path)
                .await?
                .with_context(|| format!("path \"{path}\" not found"))?;
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    Ok(())
}
