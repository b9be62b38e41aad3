use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use medreg_registry::DEFAULT_NAMESPACE;

#[derive(Parser)]
#[command(
    name = "medreg",
    about = "Capacity-bounded patient record registry",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the registry HTTP server
    Serve(ServeArgs),
    /// Check a record file against the shape rules
    Validate(ValidateArgs),
    /// List stored record identities
    List(ListArgs),
    /// Show one stored record
    Show(ShowArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, overriding the config file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Keep records on disk below this directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Maximum number of distinct records, overriding the config file
    #[arg(long)]
    pub capacity: Option<u64>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file holding one record
    pub file: PathBuf,
}

/// Location of an on-disk registry namespace.
#[derive(Args)]
pub struct StoreArgs {
    #[arg(long)]
    pub data_dir: PathBuf,
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
    #[command(flatten)]
    pub store: StoreArgs,
}
