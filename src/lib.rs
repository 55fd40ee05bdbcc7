//! Switchboard - multi-agent question router
//!
//! Routes a natural-language question among specialist language-model agents
//! (web research, explanation, YouTube transcripts, podcast episodes) and
//! returns a single answer.
//!
//! # Overview
//!
//! A coordinating agent reads the question and the recent conversation and
//! either answers it or transfers control to a specialist. Specialists fetch
//! data through tool adapters and can hand off once more (for example, the
//! podcast agent fetches an episode list and hands it to the episode analyzer).
//! Fetched episode lists are kept in a catalog memory so later questions can
//! refer back to them.
//!
//! # Architecture
//!
//! - `conversation` - Role-tagged messages and the bounded history window
//! - `memory` - Catalog memory of fetched podcast episodes
//! - `tools` - Data tools and their external adapters
//! - `agent` - Agent registry and the delegation loop
//! - `backend` - Language model backends
//! - `session` - Sessions and the session store
//! - `orchestrator` - Wiring from settings
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use switchboard::config::Settings;
//! use switchboard::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let mut session = orchestrator.session();
//!     let answer = session.answer("What is the latest episode of PodcastX about?").await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod backend;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod memory;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod tools;

pub use error::{AdapterError, Result, SwitchboardError};
