use anyhow::Result;
use clap::{Parser, Subcommand};

use credit_dashboard::context::DashboardContext;
use credit_dashboard::scoring::ScoringClient;
use credit_dashboard::{cli, config, web};

#[derive(Debug, Parser)]
#[command(name = "credit-dashboard")]
#[command(about = "Credit granting dashboard: client lookup, remote scoring and explanations")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the web dashboard
    Serve {
        /// Address to listen on (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Fetch the credit decision and default probability for a client
    Predict {
        /// 6-digit client identifier
        client_id: String,
    },
    /// Print the descriptive record of a client
    Client {
        /// 6-digit client identifier
        client_id: String,
    },
    /// Check data files, model artifact and scoring API
    Health,
    /// Show recent dashboard interactions
    History {
        /// Number of interactions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.credit-dashboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `scoring.url`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr } => {
            let cfg = config::load();
            let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
            let service = ScoringClient::from_config(&cfg.scoring);
            let ctx = DashboardContext::load(cfg)?;
            web::serve(&ctx, &service, &addr)
        }
        Commands::Predict { client_id } => cli::run_predict(&client_id),
        Commands::Client { client_id } => cli::run_client(&client_id),
        Commands::Health => cli::run_health(),
        Commands::History { limit } => cli::run_history(limit),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
