//! CLI command implementations.

mod agents;
mod ask;
mod chat;
mod config;
mod doctor;
mod serve;

pub use agents::run_agents;
pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
