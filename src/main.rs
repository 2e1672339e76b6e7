use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocketplan::stores::{Fixture, HttpStores, MemoryStore, Stores, UserIdentity};
use pocketplan::{Assistant, AssistantConfig, AssistantRequest};

#[derive(Parser)]
#[command(name = "pocketplan")]
#[command(about = "Turn a sentence into an expense, budget entry or scheduled task", long_about = None)]
#[command(version)]
struct Cli {
    /// Execute the planned intent instead of asking for confirmation
    #[arg(long)]
    execute: bool,

    /// Include the planner trace in the response
    #[arg(long)]
    debug: bool,

    /// JSON fixture seeding the in-memory stores
    #[arg(long, env = "POCKETPLAN_FIXTURE")]
    fixture: Option<PathBuf>,

    /// JSON config file; environment variables override it
    #[arg(long, env = "POCKETPLAN_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "POCKETPLAN_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "POCKETPLAN_EMAIL")]
    email: Option<String>,

    /// What to do, e.g. "add 20 for lunch to Roommates"
    #[arg(required = true, trailing_var_arg = true)]
    text: Vec<String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<AssistantConfig> {
    match path {
        Some(path) => AssistantConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?
            .with_env_overrides(|key| std::env::var(format!("POCKETPLAN_{key}")).ok())
            .context("applying environment overrides"),
        None => AssistantConfig::from_env().context("reading config from environment"),
    }
}

fn build_stores(config: &AssistantConfig, fixture: Option<&PathBuf>) -> Result<Stores> {
    if let Some(url) = &config.store_url {
        tracing::info!(%url, "using hosted document store");
        let http = HttpStores::new(url).context("configuring the document store client")?;
        return Ok(Stores::http(Arc::new(http)));
    }
    let memory = match fixture {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
            let fixture = Fixture::from_json(&raw).with_context(|| format!("parsing fixture {}", path.display()))?;
            MemoryStore::from_fixture(fixture)
        }
        None => MemoryStore::new(),
    };
    Ok(Stores::in_memory(Arc::new(memory)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let stores = build_stores(&config, cli.fixture.as_ref())?;
    let assistant = Assistant::packaged(config, stores).context("loading classifier models")?;

    let user = UserIdentity { id: cli.user_id, email: cli.email };
    let mut request = AssistantRequest::new(user, cli.text.join(" "));
    request.context.execute = cli.execute;
    request.context.debug = cli.debug;

    let response = assistant.handle(request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
