use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use triggercmd_gateway::catalog::{CatalogCache, CatalogService};
use triggercmd_gateway::{
    ApiServerBuilder, Config, NodeRuntime, RelayClient, TriggerNode, TriggerNodeConfig,
};

/// TRIGGERcmd gateway - run remote commands from flows
#[derive(Parser)]
#[command(name = "triggercmd", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "TRIGGERCMD_CONFIG")]
    config: Option<PathBuf>,

    /// Port for the admin API
    #[arg(long, env = "TRIGGERCMD_API_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the admin API server
    Serve,
    /// Print the canonical command catalog for a configuration
    List {
        /// Configuration identity
        #[arg(long)]
        config: String,
    },
    /// Run a trigger once and print the outgoing message
    Trigger {
        /// Configuration identity
        #[arg(long)]
        config: String,
        /// Computer name
        #[arg(long, default_value = "")]
        computer: String,
        /// Trigger name
        #[arg(long, default_value = "")]
        trigger: String,
        /// Params value, parsed as JSON when possible
        #[arg(long)]
        params: Option<String>,
        /// Params type tag (str, num, bool, json, msg, flow, global, env, ...)
        #[arg(long)]
        params_type: Option<String>,
        /// Inbound message as a JSON object
        #[arg(long)]
        msg: Option<String>,
    },
    /// Check a token against the remote service
    Probe {
        /// Base URL of the service
        #[arg(long)]
        base_url: Option<String>,
        /// Access token
        #[arg(long, env = "TRIGGERCMD_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,triggercmd_gateway=info",
        1 => "info,triggercmd_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::List { config: id } => list(&config, &id).await,
        Command::Trigger {
            config: id,
            computer,
            trigger,
            params,
            params_type,
            msg,
        } => {
            let node = TriggerNodeConfig {
                id: "cli".to_string(),
                flow_id: "cli".to_string(),
                config: Some(id),
                computer,
                trigger,
                params: params.map(|p| parse_loose(&p)),
                params_type,
            };
            run_trigger(&config, node, msg.as_deref()).await
        }
        Command::Probe { base_url, token } => probe(base_url.as_deref(), &token).await,
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        port = config.api_server.port,
        relays = ?config.registry().ids(),
        "starting TRIGGERcmd gateway"
    );

    let server = ApiServerBuilder::new(config.registry())
        .port(config.api_server.port)
        .api_key(config.api_server.api_key.clone())
        .build();

    let handle = server.spawn();

    tokio::select! {
        result = handle => {
            result.context("API server task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn list(config: &Config, id: &str) -> anyhow::Result<()> {
    let service = CatalogService::new(config.registry(), RelayClient::new(), CatalogCache::new());
    let catalog = service.command_list(id).await?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

async fn run_trigger(
    config: &Config,
    node: TriggerNodeConfig,
    msg: Option<&str>,
) -> anyhow::Result<()> {
    let mut message: Value = match msg {
        Some(raw) => serde_json::from_str(raw).context("--msg must be JSON")?,
        None => json!({}),
    };
    if let Some(object) = message.as_object_mut() {
        object
            .entry("_msgid")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    }

    let runtime = NodeRuntime::new(config.registry(), RelayClient::new());
    let out = TriggerNode::new(node, runtime).on_input(message).await?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn probe(base_url: Option<&str>, token: &str) -> anyhow::Result<()> {
    let report = RelayClient::new().probe(base_url, Some(token)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.ok {
        anyhow::bail!("probe failed with status {}", report.status);
    }
    Ok(())
}

/// JSON when it parses, otherwise the raw string
fn parse_loose(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
