//! Command implementations for the shredscan CLI
//!
//! Each command lives in its own module and returns a [`CommandStatus`];
//! fatal problems are returned as errors.

pub mod config;
pub mod delete;
pub mod scan;
pub mod version;

/// How a command that ran to completion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Sensitive data was found, or some work could not be completed
    NeedsAttention,
}

impl CommandStatus {
    pub fn code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::NeedsAttention => 1,
        }
    }
}
