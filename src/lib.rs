//! bwclient: drive the Bitwarden CLI to unlock a vault and list its items.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod process;
pub mod utils;

// Re-export commonly used types
pub use client::BitwardenClient;
pub use config::{ClientOptions, Credentials};
pub use error::{BitwardenError, Result};
pub use models::{Field, LoginUri, SessionToken, VaultItem, VaultItemLogin};
pub use process::{CommandOutput, CommandRunner, Invocation, ProcessError, ProcessRunner};
