mod config;
mod graphql;
mod http;
#[cfg(test)]
mod test_support;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use platform_obs::{ObsConfig, init_tracing};
use platform_zoho::{DEFAULT_SCOPE, LeadCache, ZohoClient};
use products_leads::metrics;
use tracing::info;

use crate::{
    config::AppConfig,
    graphql::{Clock, GraphqlData},
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "lead-dashboard", version, about = "Zoho CRM lead dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Fetch every lead from the CRM once and write them as JSON.
    Fetch {
        #[arg(long, value_name = "FILE", help = "Destination file path (stdout when omitted)")]
        output: Option<PathBuf>,
    },
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
    /// Print the Zoho consent URL used to obtain a refresh token.
    AuthUrl {
        #[arg(long, default_value = DEFAULT_SCOPE)]
        scope: String,
    },
    /// Trade a one-time authorization code for a refresh token.
    ExchangeCode {
        #[arg(long)]
        code: String,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Load the lead snapshot before accepting requests")]
    warm: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _guard = init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, Arc::new(AppConfig::load()?)).await,
        Command::Fetch { output } => fetch(output, &AppConfig::load()?).await,
        Command::SchemaPrint { output } => schema_print(output),
        Command::AuthUrl { scope } => auth_url(&scope, &AppConfig::load()?),
        Command::ExchangeCode { code } => exchange_code(&code, &AppConfig::load()?).await,
    }
}

fn lead_cache(config: &AppConfig) -> Result<LeadCache> {
    config.require_refresh_token()?;
    let client = ZohoClient::new(config.zoho.clone())?;
    Ok(LeadCache::new(client, config.cache))
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let leads = lead_cache(&config)?;
    if cmd.warm {
        let snapshot = leads
            .snapshot()
            .await
            .context("failed to warm the lead cache")?;
        info!(leads = snapshot.len(), "lead cache warmed");
    }
    let schema = graphql::build_schema(GraphqlData {
        leads: leads.clone(),
        clock: Clock::default(),
    });
    let state = AppState {
        schema,
        leads,
        config,
    };
    http::serve((&cmd).into(), state).await
}

async fn fetch(path: Option<PathBuf>, config: &AppConfig) -> Result<()> {
    let snapshot = lead_cache(config)?.snapshot().await?;
    let all: Vec<_> = snapshot.leads.iter().collect();
    let summary = metrics(&all);
    info!(
        leads = summary.total_leads,
        owners = summary.owners,
        statuses = summary.statuses,
        sources = summary.sources,
        "fetched leads"
    );
    let body = serde_json::to_string_pretty(&snapshot.leads)?;
    match path {
        Some(path) => {
            std::fs::write(&path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "lead export written");
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::sdl();
    match path {
        Some(path) => {
            std::fs::write(&path, sdl)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "schema snapshot written");
        }
        None => print!("{sdl}"),
    }
    Ok(())
}

fn auth_url(scope: &str, config: &AppConfig) -> Result<()> {
    let client = ZohoClient::new(config.zoho.clone())?;
    let url = client.authorization_url(scope)?;
    println!("{url}");
    Ok(())
}

async fn exchange_code(code: &str, config: &AppConfig) -> Result<()> {
    let client = ZohoClient::new(config.zoho.clone())?;
    let grant = client.exchange_code(code).await?;
    let refresh_token = grant
        .refresh_token
        .ok_or_else(|| anyhow!("Zoho returned no refresh token; re-consent with access_type=offline"))?;
    info!(api_domain = ?grant.api_domain, "authorization code exchanged");
    println!("ZOHO_REFRESH_TOKEN={refresh_token}");
    Ok(())
}
