//! Command line definitions for the `leadpipe` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "leadpipe")]
#[command(about = "Run the lead generation pipeline and summarize its results")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    pub log_destination: LogTarget,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a pipeline run and wait for its results
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Description of the target audience, e.g. "SaaS startups in Berlin"
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Backend base URL (overrides LEADPIPE_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Milliseconds between status checks (overrides LEADPIPE_POLL_INTERVAL_MS)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Which summary to print once the run settles
    #[arg(long, value_enum, default_value_t = View::All)]
    pub view: View,
}

impl RunArgs {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Dashboard,
    Leads,
    Analytics,
    All,
}
