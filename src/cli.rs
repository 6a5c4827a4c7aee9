//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Durable work-queue and publishing pipeline for breaking-news articles.
#[derive(Parser, Debug)]
#[command(name = "news-relay")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one crawl cycle (fan-out + enqueue) and exit.
    RunAll,

    /// Start the Publisher Worker loop.
    Publish,

    /// Inspect or mutate the Queue Store.
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// Print a snapshot of item counts per status.
    Status,

    /// Move eligible FAILED items back to PENDING.
    Retry,

    /// Delete COMPLETED items older than `clean_age`.
    Clean,

    /// Run the Enqueue Service against the Article Store.
    Add {
        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Only consider articles collected within the last `hours` hours.
        #[arg(long)]
        hours: Option<i64>,

        #[arg(long)]
        limit: Option<u32>,
    },
}
