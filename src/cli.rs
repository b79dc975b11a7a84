//! Command-line interface implementation.

use crate::client::BitwardenClient;
use crate::config::{ClientOptions, Credentials, CLI_PATH_ENV, DEFAULT_CLI};
use crate::error::{BitwardenError, Result};
use crate::models::VaultItem;
use crate::utils::{self, success, warning};
use clap::{Parser, Subcommand};
use colored::*;
use std::time::Duration;

/// Unlock a Bitwarden vault through the bw CLI and list its items.
///
/// The client secret and master password are only read from
/// `BW_CLIENT_SECRET` / `BW_PASSWORD` or a prompt, never from flags, so they
/// stay out of argv and shell history.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bitwarden server URL
    #[arg(long, global = true, help = "Bitwarden server URL (default: $BW_URL)")]
    pub url: Option<String>,

    /// API key client id
    #[arg(long, global = true, help = "API key client id (default: $BW_CLIENT_ID)")]
    pub client_id: Option<String>,

    /// Path to the bw executable
    #[arg(long, global = true, env = CLI_PATH_ENV, default_value = DEFAULT_CLI)]
    pub bw_path: String,

    /// Do not run `bw config server` before logging in
    #[arg(long, global = true)]
    pub skip_server_config: bool,

    /// Timeout for each bw invocation in seconds (0 waits forever)
    #[arg(long, global = true, default_value = "120")]
    pub timeout: u64,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(
        short = 'o',
        long,
        global = true,
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Unlock the vault and print the session token
    Unlock,

    /// List vault items
    List {
        /// Only show items whose name contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(&self) -> Result<()> {
        let mut client = BitwardenClient::new(self.credentials()?, self.client_options());
        client.init().await?;

        match &self.command {
            Commands::Unlock => self.print_session(&client),
            Commands::List { search } => self.list_items(&client, search.as_deref()).await,
        }
    }

    /// Resolve credentials from flags, then the environment, then a prompt.
    pub fn credentials(&self) -> Result<Credentials> {
        let credentials = Credentials::new(self.url.clone(), self.client_id.clone(), None, None)
        .with_env_fallback();

        if credentials.has_password() {
            return Ok(credentials);
        }

        if !utils::is_interactive() {
            if !self.quiet {
                warning("No master password given; set BW_PASSWORD");
            }
            return Ok(credentials);
        }

        let password = utils::prompt_password("Master password")?;
        Ok(credentials.with_password(password))
    }

    /// Client options derived from the global flags.
    pub fn client_options(&self) -> ClientOptions {
        let timeout = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        ClientOptions::default()
            .with_bw_path(self.bw_path.as_str())
            .with_server_config(!self.skip_server_config)
            .with_timeout(timeout)
            .with_progress(!self.quiet)
    }

    fn print_session(&self, client: &BitwardenClient) -> Result<()> {
        let token = client
            .current_session()
            .ok_or_else(|| BitwardenError::Other("Vault is still locked".to_string()))?;

        match self.output {
            OutputFormat::Text => println!("{token}"),
            OutputFormat::Json => {
                let json = serde_json::json!({ "session": token });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }

        if !self.quiet {
            success("Vault unlocked");
        }
        Ok(())
    }

    async fn list_items(&self, client: &BitwardenClient, search: Option<&str>) -> Result<()> {
        let mut items = client.list_items().await?;

        if let Some(query) = search {
            items = filter_items(items, query);
        }

        match self.output {
            OutputFormat::Text => {
                if items.is_empty() {
                    println!("No items found");
                } else {
                    for line in format_items(&items) {
                        println!("{line}");
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
        }

        if !self.quiet {
            success(&format!("Listed {} items", items.len()));
        }
        Ok(())
    }
}

/// Keep items whose name contains `query`, ignoring case.
pub fn filter_items(items: Vec<VaultItem>, query: &str) -> Vec<VaultItem> {
    let query = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains(&query))
        .collect()
}

/// Render items as an aligned text table, one line per item.
pub fn format_items(items: &[VaultItem]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<32} {:<28} {}",
        "NAME".bold(),
        "USERNAME".bold(),
        "ID".bold()
    )];

    for item in items {
        let name = utils::truncate(&item.name, 32);
        let username = utils::truncate(item.username().unwrap_or("-"), 28);
        let mut line = format!("{name:<32} {username:<28} {}", item.id.dimmed());
        if item.is_favorite() {
            line.push_str(&format!(" {}", "★".yellow()));
        }
        lines.push(line);
    }

    lines
}
