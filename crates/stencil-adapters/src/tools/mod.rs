//! Tool adapters: real processes and scripted stand-ins.

mod scripted;
mod system;

pub use scripted::{RecordedCall, ScriptedTool, ScriptedTools};
pub use system::{ProcessTool, SystemTools};
