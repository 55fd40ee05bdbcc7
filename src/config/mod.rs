//! Configuration module for Switchboard.
//!
//! Handles loading and managing application settings and agent instructions.

mod prompts;
mod settings;

pub use prompts::{AgentPrompt, AgentPrompts, Prompts};
pub use settings::{
    BackendSettings, DispatcherSettings, GeneralSettings, MemoryScope, MemorySettings,
    PromptSettings, Settings, ToolSettings,
};
