//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SwitchboardError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions requires an OpenAI API key.
    Ask,
    /// Listing agents has no external requirements.
    Inspect,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ask => check_api_key(),
        Operation::Inspect => Ok(()),
    }
}

/// Optional capabilities that are missing. Agents still run without them,
/// but their tools will report errors.
pub fn degraded_capabilities(settings: &Settings) -> Vec<String> {
    let mut missing = Vec::new();
    if settings.tools.tavily_key().is_none() {
        missing.push("Web search disabled: TAVILY_API_KEY not set".to_string());
    }
    if !tool_available("yt-dlp") {
        missing.push("YouTube tools disabled: yt-dlp not found".to_string());
    }
    missing
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SwitchboardError::Configuration(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SwitchboardError::Configuration(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn tool_available(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
