//! NIMBUS AI entry point.
//!
//! Serves the web UI by default; `--ask` answers a single query on
//! the terminal using the same dispatch path.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nimbus::agent::{dispatch, presets};
use nimbus::config::load_config;
use nimbus::inference::GroqClient;
use nimbus::server;
use nimbus::types::ToolContext;

/// NIMBUS AI -- web search + finance assistant
#[derive(Parser, Debug)]
#[command(
    name = "nimbus",
    version,
    about = "NIMBUS AI -- web search + finance assistant"
)]
struct Cli {
    /// Serve the web UI (default when no other flag is given)
    #[arg(long)]
    serve: bool,

    /// Answer a single query on stdout and exit
    #[arg(long, value_name = "QUERY")]
    ask: Option<String>,

    /// Bind host override
    #[arg(long)]
    host: Option<String>,

    /// Bind port override
    #[arg(long)]
    port: Option<u16>,
}

/// One-shot terminal mode: same guard and dispatch path as the UI.
async fn run_ask(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("Query must not be empty");
    }

    let config = load_config();
    let inference = GroqClient::new(&config);
    let tools = ToolContext::new();
    let team = presets::research_team();

    let answer = dispatch(&team, &inference, &tools, query).await?;
    println!("{}", answer);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Merge a .env file into the environment before reading config
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(ref query) = cli.ask {
        if let Err(e) = run_ask(query).await {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Default: serve the web UI
    let mut config = load_config();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if let Err(e) = server::serve(config).await {
        eprintln!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}
