//! Agent lifecycle contracts.
//!
//! [`AgentHandle`] is the activator's view of a schedulable agent.
//! [`KernelCollaborator`] is what an agent's owning kernel must provide.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::AgentAddress;
use crate::error::{AgentError, KernelError};
use crate::message::Message;
use crate::status::Status;

/// Lifecycle state of an agent.
///
/// ```text
/// Unborn -> Born -> Alive -> Dying -> BreakingDown -> Died
///                     \_________________^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLifeState {
    /// Created, initialization not started.
    #[default]
    Unborn,
    /// Initialization in progress.
    Born,
    /// Scheduled every behaviour phase.
    Alive,
    /// Kill requested, removal happens in the next behaviour phase.
    Dying,
    /// Destruction in progress.
    BreakingDown,
    Died,
}

impl AgentLifeState {
    /// Alive or dying: the agent still owns live resources.
    pub fn is_alive(self) -> bool {
        matches!(self, AgentLifeState::Alive | AgentLifeState::Dying)
    }

    /// Destruction started or finished.
    pub fn is_terminated(self) -> bool {
        matches!(self, AgentLifeState::BreakingDown | AgentLifeState::Died)
    }
}

impl fmt::Display for AgentLifeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AgentLifeState::Unborn => "unborn",
            AgentLifeState::Born => "born",
            AgentLifeState::Alive => "alive",
            AgentLifeState::Dying => "dying",
            AgentLifeState::BreakingDown => "breaking_down",
            AgentLifeState::Died => "died",
        };
        f.write_str(text)
    }
}

/// A schedulable agent, as seen by the activator.
///
/// The `proceed_private_*` hooks may fail with an [`AgentError`]; the
/// activator records the error and moves on. A hook that panics takes the
/// whole round down.
#[async_trait]
pub trait AgentHandle: Send + Sync {
    fn address(&self) -> &AgentAddress;

    fn state(&self) -> AgentLifeState;

    fn is_sleeping(&self) -> bool;

    fn is_migrating(&self) -> bool;

    /// Store parameters consumed by the next initialization.
    /// `None` means the phase parameters are used.
    fn set_init_parameters(&self, parameters: Option<Vec<serde_json::Value>>);

    /// Resolve the owning kernel, if it is still reachable.
    fn kernel(&self) -> Option<Arc<dyn KernelCollaborator>>;

    async fn proceed_private_initialization(
        &self,
        parameters: &[serde_json::Value],
    ) -> Result<Status, AgentError>;

    async fn proceed_private_behaviour(&self) -> Result<Status, AgentError>;

    async fn proceed_private_destruction(&self) -> Result<Status, AgentError>;
}

/// Kernel-side services an agent relies on.
#[async_trait]
pub trait KernelCollaborator: Send + Sync {
    /// Remove `agent` from every kernel registry.
    ///
    /// Must be idempotent and report failures through the returned status.
    async fn remove_agent_from_kernel(&self, agent: &dyn AgentHandle) -> Status;

    /// Deliver `message` into its receiver's mailbox.
    fn route_message(&self, message: Message) -> Result<(), KernelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_unborn() {
        assert_eq!(AgentLifeState::default(), AgentLifeState::Unborn);
    }

    #[test]
    fn test_is_alive() {
        assert!(!AgentLifeState::Unborn.is_alive());
        assert!(!AgentLifeState::Born.is_alive());
        assert!(AgentLifeState::Alive.is_alive());
        assert!(AgentLifeState::Dying.is_alive());
        assert!(!AgentLifeState::BreakingDown.is_alive());
        assert!(!AgentLifeState::Died.is_alive());
    }

    #[test]
    fn test_is_terminated() {
        assert!(AgentLifeState::BreakingDown.is_terminated());
        assert!(AgentLifeState::Died.is_terminated());
        assert!(!AgentLifeState::Dying.is_terminated());
    }

    #[test]
    fn test_state_serde_name() {
        let json = serde_json::to_string(&AgentLifeState::BreakingDown).unwrap();
        assert_eq!(json, "\"breaking_down\"");
        assert_eq!(AgentLifeState::BreakingDown.to_string(), "breaking_down");
    }
}
