//! Agents and the delegation loop that routes requests between them.
//!
//! The [`AgentRegistry`] fixes which specialists exist and which tools each can
//! call. The [`Dispatcher`] runs one request through that graph, starting at the
//! entry agent and following transfers until an agent answers.

mod dispatcher;
mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher, ToolCallRecord, DEFAULT_MAX_STEPS};
pub use registry::{names, transfer_tool_name, Agent, AgentRegistry, RegistryBuilder, Tool};
