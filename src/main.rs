//! CLI entry point for news-relay.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use news_relay_core::article::{ArticleStore, SqliteArticleStore};
use news_relay_core::cli::{Cli, Command, QueueCommand};
use news_relay_core::commands;
use news_relay_core::config::PublisherConfig;
use news_relay_core::crawler::{SourceAdapter, StaticAdapter};
use news_relay_core::db::Database;
use news_relay_core::enqueue::EnqueueFilter;
use news_relay_core::published_set::{PublishedSet, SqlitePublishedSet};
use news_relay_core::publisher::{ChatTarget, DiscordWebhookTarget, NullChatTarget};
use news_relay_core::queue::{QueueEngine, SqliteQueueStore};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?cli, "CLI arguments parsed");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            warn!(error = %err, "news-relay exited with an error");
            // Exit code 2 would be reserved for a cancellation that left a
            // claim unfailed; PublisherWorker::run always finishes its
            // claimed batch before honoring cancellation, so that path is
            // not reachable from this binary. Every other failure,
            // including an unhandled Error::Storage, exits 1.
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = PublisherConfig::from_env()?;
    info!(database_url = %config.database_url, "news-relay starting");

    let db = open_database(&config.database_url).await?;
    let articles: Arc<dyn ArticleStore> = Arc::new(SqliteArticleStore::new(db.clone()));
    let queue = QueueEngine::new(Arc::new(SqliteQueueStore::new(db.clone())));
    let published: Arc<dyn PublishedSet> = Arc::new(SqlitePublishedSet::new(db));

    match cli.command {
        Command::RunAll => {
            let adapters = configured_adapters();
            commands::run_all(adapters, articles, queue, published).await
        }
        Command::Publish => {
            let chat_target = configured_chat_target(&config);
            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("received interrupt, finishing in-flight batch before exit");
                    signal_cancel.cancel();
                }
            });
            commands::publish(queue, published, chat_target, config, cancel).await
        }
        Command::Queue { command } => run_queue_command(command, articles, queue, published, &config).await,
    }
}

async fn run_queue_command(
    command: QueueCommand,
    articles: Arc<dyn ArticleStore>,
    queue: QueueEngine,
    published: Arc<dyn PublishedSet>,
    config: &PublisherConfig,
) -> anyhow::Result<()> {
    match command {
        QueueCommand::Status => commands::queue_status(&queue).await,
        QueueCommand::Retry => commands::queue_retry(&queue, config.max_retries).await,
        QueueCommand::Clean => commands::queue_clean(&queue, config.clean_age()).await,
        QueueCommand::Add { platform, category, hours, limit } => {
            let filter = EnqueueFilter { platform, category, hours, limit };
            commands::queue_add(articles, queue, published, filter).await
        }
    }
}

/// Opens the Database at `database_url`, treating the literal `":memory:"`
/// as a request for an in-memory database (useful for local/demo runs with
/// no durable storage configured).
async fn open_database(database_url: &str) -> anyhow::Result<Database> {
    if database_url == ":memory:" {
        Ok(Database::new_in_memory().await?)
    } else {
        Ok(Database::new(Path::new(database_url)).await?)
    }
}

/// No real source adapters are wired into this binary: crawling a concrete
/// third-party feed is out of scope here. `run-all` exercises the fan-out
/// and Enqueue Service against a `StaticAdapter` seeded with nothing, so
/// the command is a safe no-op until a deployment supplies its own
/// `SourceAdapter` implementations.
fn configured_adapters() -> Vec<Arc<dyn SourceAdapter>> {
    vec![Arc::new(StaticAdapter::new("static", Vec::new()))]
}

fn configured_chat_target(config: &PublisherConfig) -> Arc<dyn ChatTarget> {
    match &config.discord_webhook_url {
        Some(url) => Arc::new(DiscordWebhookTarget::new(url.clone())),
        None => {
            warn!("no NEWS_RELAY_DISCORD_WEBHOOK_URL configured, dispatching to a no-op chat target");
            Arc::new(NullChatTarget)
        }
    }
}
