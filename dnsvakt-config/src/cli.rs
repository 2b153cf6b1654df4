//! Command-line flags. Every option can also come from `appsettings.json`;
//! a flag given here wins.

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "dnsvakt",
    about = "Captures DNS responses and queues unclassified domains for DGA analysis",
    disable_version_flag = true
)]
pub(crate) struct CliArgs {
    /// Interface to capture DNS responses on
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Total memory budget for the pipeline, in bytes
    #[arg(short, long)]
    pub size: Option<u64>,

    /// Classification store connection string
    #[arg(short, long)]
    pub database: Option<String>,

    /// Message broker connection string
    #[arg(short, long)]
    pub rabbitmq: Option<String>,

    /// Broker destination queue name
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Parser worker thread count
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Flush the pending batch at this many unique domains
    #[arg(short = 'b', long)]
    pub max_batch_size: Option<u64>,

    /// Flush the pending batch after this many accumulated observations
    #[arg(short = 'c', long)]
    pub max_cycle_count: Option<u64>,
}
