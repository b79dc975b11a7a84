//! Terminal helpers shared by the client and the CLI.

use crate::error::{BitwardenError, Result};
use colored::*;

/// Print an error message and exit.
pub fn error_exit(message: &str, code: i32) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(code);
}

/// Print a success message.
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow(), message);
}

/// Print a progress line for a step that is about to run.
pub fn step(message: &str) {
    eprintln!("{} {}...", "→".cyan(), message);
}

/// Whether both stdin and stderr are attached to a terminal.
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stderr)
}

/// Prompt for the master password with masked input.
pub fn prompt_password(prompt: &str) -> Result<String> {
    use dialoguer::Password;

    let password = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(false)
        .interact()
        .map_err(|e| BitwardenError::Other(e.to_string()))?;

    Ok(password)
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("a much longer name", 8), "a much …");
        assert_eq!(truncate("ünïcödé names", 4), "ünï…");
    }
}
