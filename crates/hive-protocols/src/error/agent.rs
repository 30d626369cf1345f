//! Agent errors.

use thiserror::Error;

use super::KernelError;
use crate::agent::AgentLifeState;

/// Recoverable failure raised by an agent lifecycle hook.
///
/// The activator converts these into failure statuses and keeps the round
/// going for the other agents.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Agent behaviour failed: {0}")]
    ExecutionFailed(String),

    #[error("Agent destruction failed: {0}")]
    DestructionFailed(String),

    #[error("Agent in state {actual:?}, expected {expected}")]
    InvalidState {
        expected: String,
        actual: AgentLifeState,
    },

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("{0}")]
    Custom(String),
}
