//! Orchestration of the Bitwarden CLI.
//!
//! [`BitwardenClient`] runs `bw` through the fixed sequence
//! install check → server config → login → unlock, keeps the session token
//! in memory and lists vault items with it.

use crate::config::{ClientOptions, Credentials};
use crate::error::{BitwardenError, Result};
use crate::models::{self, SessionToken, VaultItem};
use crate::process::{
    CommandRunner, Invocation, ProcessRunner, CLIENT_ID_VAR, CLIENT_SECRET_VAR, PASSWORD_VAR,
    SESSION_VAR,
};
use crate::utils;
use tracing::{debug, info};

/// Marker `bw login` prints when a session already exists.
const ALREADY_LOGGED_IN: &str = "already logged in";

/// Drives the `bw` executable for one vault.
pub struct BitwardenClient<R = ProcessRunner> {
    credentials: Credentials,
    options: ClientOptions,
    runner: R,
    session: Option<SessionToken>,
}

impl BitwardenClient<ProcessRunner> {
    /// Create a client that spawns real processes.
    pub fn new(credentials: Credentials, options: ClientOptions) -> Self {
        let runner = ProcessRunner::new(options.timeout);
        Self::with_runner(credentials, options, runner)
    }

    /// Create a client from environment variables and default options.
    pub fn from_env() -> Self {
        Self::new(Credentials::from_env(), ClientOptions::from_env())
    }
}

impl<R: CommandRunner> BitwardenClient<R> {
    /// Create a client that executes invocations through `runner`.
    pub fn with_runner(credentials: Credentials, options: ClientOptions, runner: R) -> Self {
        Self {
            credentials,
            options,
            runner,
            session: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the full sequence, stopping at the first failing step.
    pub async fn init(&mut self) -> Result<()> {
        self.check_tool_installed().await?;
        if self.options.configure_server {
            self.set_server_url().await?;
        }
        self.login().await?;
        self.unlock().await?;
        Ok(())
    }

    /// Verify that `bw --version` runs and exits cleanly.
    pub async fn check_tool_installed(&self) -> Result<()> {
        self.progress("Checking Bitwarden CLI installation");
        let invocation = self.invocation().arg("--version");

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BitwardenError::ToolNotInstalled(e.to_string()))?;

        if !output.success() {
            return Err(BitwardenError::ToolNotInstalled(output.failure_message()));
        }

        debug!(version = %output.stdout.trim(), "bw is installed");
        Ok(())
    }

    /// Point `bw` at the configured server.
    pub async fn set_server_url(&self) -> Result<()> {
        let url = match self.credentials.server_url() {
            Some(url) if !url.trim().is_empty() => url.trim(),
            _ => {
                return Err(BitwardenError::Configuration(
                    "Bitwarden server URL is not provided".to_string(),
                ))
            }
        };

        self.progress(&format!("Setting server URL to {url}"));
        let invocation = self.invocation().args(["config", "server", url]);

        let output = self.runner.run(&invocation).await.map_err(|e| {
            BitwardenError::Configuration(format!("Failed to set Bitwarden server URL: {e}"))
        })?;

        if !output.success() {
            return Err(BitwardenError::Configuration(format!(
                "Failed to set Bitwarden server URL: {}",
                output.failure_message()
            )));
        }

        info!(url, "server URL configured");
        Ok(())
    }

    /// Log in with the API key.
    ///
    /// Returns the CLI's output on a fresh login and `None` when a session
    /// already existed.
    pub async fn login(&self) -> Result<Option<String>> {
        self.progress("Logging in with API key");
        let mut invocation = self.invocation().args(["login", "--apikey"]);
        if let Some(id) = self.credentials.client_id() {
            invocation = invocation.env(CLIENT_ID_VAR, id);
        }
        if let Some(secret) = self.credentials.client_secret() {
            invocation = invocation.env(CLIENT_SECRET_VAR, secret);
        }

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BitwardenError::LoginFailed(e.to_string()))?;

        if output.success() {
            info!("logged in");
            return Ok(Some(output.stdout));
        }

        if output.mentions(ALREADY_LOGGED_IN) {
            info!("bw reports an existing login, reusing it");
            return Ok(None);
        }

        Err(BitwardenError::LoginFailed(output.failure_message()))
    }

    /// Unlock the vault and keep the returned session token.
    pub async fn unlock(&mut self) -> Result<&str> {
        self.progress("Unlocking vault");
        let invocation = self
            .invocation()
            .args(["unlock", "--passwordenv", PASSWORD_VAR, "--raw"])
            .env(PASSWORD_VAR, self.credentials.password().unwrap_or_default());

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BitwardenError::AuthenticationFailed(e.to_string()))?;

        if !output.success() {
            return Err(BitwardenError::AuthenticationFailed(
                output.failure_message(),
            ));
        }

        let token = output.stdout.trim();
        if token.is_empty() {
            return Err(BitwardenError::AuthenticationFailed(
                "bw unlock returned an empty session token".to_string(),
            ));
        }

        info!("vault unlocked");
        let session = self.session.insert(SessionToken::new(token));
        Ok(session.as_str())
    }

    /// List every item in the vault using the current session.
    ///
    /// The session is not checked beforehand: without one, `BW_SESSION` is
    /// sent empty and `bw` decides.
    pub async fn list_items(&self) -> Result<Vec<VaultItem>> {
        self.progress("Listing vault items");
        let token = self.current_session().unwrap_or_default();
        let invocation = self
            .invocation()
            .args(["list", "items"])
            .env(SESSION_VAR, token);

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BitwardenError::ItemListingFailed(e.to_string()))?;

        if !output.success() {
            return Err(BitwardenError::ItemListingFailed(output.failure_message()));
        }

        let items = models::parse_items(&output.stdout).map_err(|e| {
            BitwardenError::ItemListingFailed(format!("invalid JSON from bw: {e}"))
        })?;

        debug!(count = items.len(), "listed vault items");
        Ok(items)
    }

    /// Session token from the last successful unlock.
    pub fn current_session(&self) -> Option<&str> {
        self.session.as_ref().map(SessionToken::as_str)
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.options.bw_path.as_str())
    }

    fn progress(&self, message: &str) {
        debug!(step = message);
        if self.options.progress {
            utils::step(message);
        }
    }
}
