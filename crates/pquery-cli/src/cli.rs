//! `pquery` command-line interface

use clap::{Args, Parser, Subcommand};
use pquery_core::ConnectionConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "pquery")]
#[command(version)]
#[command(about = "Build and run MySQL INSERT statements from the command line")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Server connection settings
#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Server host
    #[arg(long, env = "PQUERY_HOST", default_value = "localhost", global = true)]
    host: String,

    /// Server port (0 for the driver default)
    #[arg(long, env = "PQUERY_PORT", default_value_t = 0, global = true)]
    port: u16,

    /// Database to select after connecting
    #[arg(short, long, env = "PQUERY_DATABASE", global = true)]
    database: Option<String>,

    /// User name (falls back to $USER)
    #[arg(short, long, env = "PQUERY_USER", global = true)]
    user: Option<String>,

    /// Password (falls back to $PASSWORD)
    #[arg(long, env = "PQUERY_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
}

impl ConnectionArgs {
    fn to_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(&self.host, self.port);
        config.database = self.database.clone();
        config.username = self.user.clone().or_else(|| std::env::var("USER").ok());
        config.password = self
            .password
            .clone()
            .or_else(|| std::env::var("PASSWORD").ok());
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert values into a table
    Insert(commands::InsertArgs),
    /// Check that the server is reachable and report latency
    Ping {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List databases visible to the user
    Databases {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.connection.to_config();
    match cli.command {
        Command::Insert(args) => commands::insert(&config, args).await,
        Command::Ping { json } => commands::ping(&config, json).await,
        Command::Databases { json } => commands::databases(&config, json).await,
    }
}
