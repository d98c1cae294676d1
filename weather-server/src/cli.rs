use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::Text;
use serde_json::{Map, Value, json};
use tracing::info;
use weather_core::{Config, Dispatcher, Request, ToolName, config, provider_from_config};

use crate::server::WeatherServer;
use crate::stdio;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-mcp", version, about = "MCP server for US weather alerts and forecasts (NWS)")]
pub struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Override the upstream API base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the User-Agent sent upstream.
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Speak MCP over stdin/stdout.
    Serve,

    /// Print active alerts for a US state.
    Alerts {
        /// Two-letter state code, e.g. "CA".
        state: String,
    },

    /// Print the forecast for a location.
    Forecast {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Interactively store upstream settings.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?.with_overrides(self.base_url, self.user_agent);

        match self.command.unwrap_or(Command::Serve) {
            Command::Serve => {
                let server = WeatherServer::new(dispatcher(&config)?);
                stdio::run(server).await
            }
            Command::Alerts { state } => {
                one_shot(&dispatcher(&config)?, ToolName::GetAlerts, json!({ "state": state })).await
            }
            Command::Forecast { latitude, longitude } => {
                let arguments = json!({ "latitude": latitude, "longitude": longitude });
                one_shot(&dispatcher(&config)?, ToolName::GetForecast, arguments).await
            }
            Command::Configure => configure(config),
        }
    }
}

fn dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let gateway = config.gateway_config();
    info!(base_url = %gateway.base_url, user_agent = %gateway.user_agent, "upstream");
    Ok(Dispatcher::new(provider_from_config(&gateway)?))
}

/// Goes through the same validation and formatting as an MCP tool call.
async fn one_shot(dispatcher: &Dispatcher, tool: ToolName, arguments: Value) -> anyhow::Result<()> {
    let arguments: Map<String, Value> = match arguments {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    match dispatcher.dispatch(&Request::invoke(tool.as_str(), arguments)).await {
        Ok(reply) => {
            println!("{}", reply.into_text());
            Ok(())
        }
        Err(err) => bail!("{}", err.user_message(Some(tool))),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current = config.gateway_config();

    let base_url = Text::new("Upstream API base URL:")
        .with_default(&current.base_url)
        .with_help_message(&format!("Default: {}", config::NWS_API_BASE))
        .prompt()
        .context("Failed to read base URL")?;

    let user_agent = Text::new("User-Agent:")
        .with_default(&current.user_agent)
        .with_help_message("NWS asks for an identifying User-Agent, ideally with contact info")
        .prompt()
        .context("Failed to read User-Agent")?;

    config.base_url = Some(base_url.trim().to_string());
    config.user_agent = Some(user_agent.trim().to_string());

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
