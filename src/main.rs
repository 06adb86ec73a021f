mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod server;
mod services;
#[cfg(test)]
mod test_support;
mod workflow;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::serve::{self, ServeCommandArgs};
use crate::cmd::ticket::{self, TicketCommandArgs};
use crate::config::{Settings, resolve_config_path};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::freshdesk::FreshdeskClient;

#[derive(Parser)]
#[command(
    name = "deskhook",
    author,
    version,
    about = "Relays issue tracker webhooks to Freshdesk tickets"
)]
struct Cli {
    /// YAML settings file merged over the FRESHDESK_* environment variables
    /// [default: config.yml beside the executable, else in the working directory]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for issue webhooks and forward them to the helpdesk.
    Serve(ServeArgs),
    /// List the helpdesk tickets linked to an issue.
    Ticket(TicketArgs),
    /// Inspect the resolved configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DESKHOOK_BIND", default_value = "0.0.0.0:4567")]
    bind: String,
}

#[derive(Args)]
struct TicketArgs {
    /// Repository full name, e.g. `org/app`.
    #[arg(long)]
    repo: String,
    /// Repository short name; defaults to the last segment of --repo.
    #[arg(long)]
    name: Option<String>,
    /// Issue number to look up.
    #[arg(long)]
    issue: u64,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,deskhook=debug,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command, &config_path),
        Commands::Serve(args) => {
            let context = build_context(&config_path)?;
            serve::run(context, ServeCommandArgs { bind: args.bind }).await
        }
        Commands::Ticket(args) => run_ticket(&config_path, args).await,
    }
}

fn build_context(config_path: &Path) -> AppResult<AppContext> {
    let settings = Settings::load(config_path)?;

    if settings.freshdesk_key.is_none() {
        warn!("Freshdesk API key not configured; helpdesk calls will fail");
    }
    if settings.freshdesk_domain.is_none() && settings.helpdesk_base_url.is_none() {
        warn!("Freshdesk domain not configured; helpdesk calls will fail");
    }
    if settings.freshdesk_custom_field.is_none() && settings.repositories.is_none() {
        warn!("no custom field configured; no ticket will ever match an issue");
    }

    let settings = Arc::new(settings);
    let helpdesk = Arc::new(FreshdeskClient::new(settings.clone())?);
    Ok(AppContext::new(settings, helpdesk))
}

async fn run_ticket(config_path: &Path, args: TicketArgs) -> AppResult<()> {
    let context = build_context(config_path)?;

    let outcome = ticket::run(
        &context,
        TicketCommandArgs {
            repo: args.repo.clone(),
            name: args.name,
            issue: args.issue,
        },
    )
    .await?;

    let field = outcome.field_name.as_deref().unwrap_or("<none>");
    if outcome.tickets.is_empty() {
        println!(
            "No tickets reference {}#{} (field {field}).",
            args.repo, args.issue
        );
        return Ok(());
    }

    println!(
        "{} ticket(s) reference {}#{} (field {field}):",
        outcome.tickets.len(),
        args.repo,
        args.issue
    );
    for located in &outcome.tickets {
        let subject = located.ticket.subject.as_deref().unwrap_or("<no subject>");
        println!("  #{} {subject}", located.display_id);
    }

    Ok(())
}
