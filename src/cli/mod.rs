//! CLI module for Switchboard.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::MemoryScope;
use clap::{Parser, Subcommand};

/// Switchboard - multi-agent question router
///
/// Routes questions to specialist agents (web research, explanation, YouTube
/// transcripts, podcast episodes) and returns one answer.
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SWITCHBOARD_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Model for agents that do not pin their own
        #[arg(short, long)]
        model: Option<String>,

        /// Show which agents handled the question and the tools they called
        #[arg(short, long)]
        trace: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Model for agents that do not pin their own
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the agents and how they can hand off to each other
    Agents,

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Share catalog memory across sessions (global) or keep it per session
        #[arg(long)]
        memory_scope: Option<MemoryScope>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_flags() {
        let cli = Cli::parse_from(["switchboard", "-vv", "ask", "what is new?", "--trace"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, trace, model } => {
                assert_eq!(question, "what is new?");
                assert!(trace);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["switchboard", "serve"]);
        match cli.command {
            Commands::Serve { host, port, memory_scope } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
                assert!(memory_scope.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_memory_scope() {
        let cli = Cli::parse_from(["switchboard", "serve", "--memory-scope", "global"]);
        assert!(matches!(
            cli.command,
            Commands::Serve { memory_scope: Some(MemoryScope::Global), .. }
        ));
    }
}
