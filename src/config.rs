//! Credentials and client options.
//!
//! Every credential can be given explicitly or picked up from the process
//! environment. Explicit, non-empty values always win over the environment.

use std::fmt;
use std::time::Duration;
use zeroize::Zeroize;

/// Environment variable holding the Bitwarden server URL.
pub const URL_ENV: &str = "BW_URL";
/// Environment variable holding the API key client id.
pub const CLIENT_ID_ENV: &str = "BW_CLIENT_ID";
/// Environment variable holding the API key client secret.
pub const CLIENT_SECRET_ENV: &str = "BW_CLIENT_SECRET";
/// Environment variable holding the master password.
pub const PASSWORD_ENV: &str = "BW_PASSWORD";
/// Environment variable overriding the `bw` executable path.
pub const CLI_PATH_ENV: &str = "BW_CLI_PATH";

/// Executable looked up on `PATH` when no override is given.
pub const DEFAULT_CLI: &str = "bw";
/// Upper bound on a single `bw` invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Credentials handed to the Bitwarden CLI.
#[derive(Clone, Default, Zeroize)]
pub struct Credentials {
    server_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    password: Option<String>,
}

impl Credentials {
    /// Build credentials from explicit values only.
    pub fn new(
        server_url: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            server_url,
            client_id,
            client_secret,
            password,
        }
    }

    /// Build credentials purely from `BW_URL`, `BW_CLIENT_ID`,
    /// `BW_CLIENT_SECRET` and `BW_PASSWORD`.
    pub fn from_env() -> Self {
        Self::default().with_env_fallback()
    }

    /// Fill every missing or empty value from the process environment.
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill every missing or empty value through `lookup`, keyed by the
    /// environment variable name.
    pub fn with_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server_url = pick(self.server_url.take(), URL_ENV, &lookup);
        self.client_id = pick(self.client_id.take(), CLIENT_ID_ENV, &lookup);
        self.client_secret = pick(self.client_secret.take(), CLIENT_SECRET_ENV, &lookup);
        self.password = pick(self.password.take(), PASSWORD_ENV, &lookup);
        self
    }

    /// Replace the master password, e.g. after prompting for it.
    pub fn with_password(mut self, password: String) -> Self {
        if let Some(old) = self.password.as_mut() {
            old.zeroize();
        }
        self.password = Some(password);
        self
    }

    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Whether a master password is available.
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

fn pick<F>(explicit: Option<String>, key: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(key).filter(|value| !value.is_empty()))
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("password", &redacted(&self.password))
            .finish()
    }
}

/// How the client drives the `bw` executable.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Program to spawn for every invocation.
    pub bw_path: String,
    /// Run `bw config server <url>` before logging in.
    pub configure_server: bool,
    /// Per-invocation timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Print progress lines to stderr.
    pub progress: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            bw_path: DEFAULT_CLI.to_string(),
            configure_server: true,
            timeout: Some(DEFAULT_TIMEOUT),
            progress: false,
        }
    }
}

impl ClientOptions {
    /// Defaults, with the executable taken from `BW_CLI_PATH` when set.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(path) = std::env::var(CLI_PATH_ENV) {
            if !path.is_empty() {
                options.bw_path = path;
            }
        }
        options
    }

    pub fn with_bw_path(mut self, path: impl Into<String>) -> Self {
        self.bw_path = path.into();
        self
    }

    pub fn with_server_config(mut self, enabled: bool) -> Self {
        self.configure_server = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }
}
