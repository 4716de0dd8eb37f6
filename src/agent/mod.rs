//! Agent loop and its tool-source seam.

pub mod agent_loop;
pub mod source;

pub use agent_loop::{AgentLoop, LoopOutcome, RunReport};
pub use source::ToolSource;
