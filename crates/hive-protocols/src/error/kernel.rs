//! Kernel errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("No kernel bound to the agent")]
    NoKernel,

    #[error("Kernel is not running")]
    NotRunning,

    #[error("Invalid kernel state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Lifecycle hook failed: {0}")]
    HookFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_not_found_display() {
        let err = KernelError::AgentNotFound("seller@42".to_string());
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("seller@42"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = KernelError::InvalidStateTransition {
            from: "Stopped".to_string(),
            to: "Running".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Stopped"));
        assert!(display.contains("Running"));
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<KernelError> = vec![
            KernelError::AgentNotFound("a".to_string()),
            KernelError::AlreadyRegistered("b".to_string()),
            KernelError::NoKernel,
            KernelError::NotRunning,
            KernelError::InvalidStateTransition {
                from: "c".to_string(),
                to: "d".to_string(),
            },
            KernelError::HookFailed("e".to_string()),
            KernelError::Timeout,
            KernelError::Custom("f".to_string()),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
