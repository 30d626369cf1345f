//! Registry of the agents hosted by a kernel.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use hive_protocols::{AgentAddress, AgentHandle, KernelError};

use crate::agent::Agent;

/// Thread-safe map from address to agent.
///
/// - Register/unregister with duplicate checking
/// - Lookup by address, used for message routing
/// - Snapshot listing
pub struct AgentRegistry {
    agents: DashMap<AgentAddress, Arc<Agent>>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            agents: DashMap::new(),
        }
    }

    /// Register an agent.
    ///
    /// Returns an error if an agent with the same address is already registered.
    pub fn register(&self, agent: Arc<Agent>) -> Result<(), KernelError> {
        let address = agent.address().clone();
        match self.agents.entry(address) {
            Entry::Occupied(entry) => {
                Err(KernelError::AlreadyRegistered(entry.key().to_string()))
            }
            Entry::Vacant(entry) => {
                entry.insert(agent);
                Ok(())
            }
        }
    }

    /// Unregister an agent, returning it if it was registered.
    pub fn unregister(&self, address: &AgentAddress) -> Option<Arc<Agent>> {
        self.agents.remove(address).map(|(_, agent)| agent)
    }

    pub fn get(&self, address: &AgentAddress) -> Option<Arc<Agent>> {
        self.agents.get(address).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, address: &AgentAddress) -> bool {
        self.agents.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Addresses of all registered agents, sorted.
    pub fn addresses(&self) -> Vec<AgentAddress> {
        let mut addresses: Vec<_> = self.agents.iter().map(|e| e.key().clone()).collect();
        addresses.sort();
        addresses
    }

    /// Snapshot of all registered agents.
    pub fn agents(&self) -> Vec<Arc<Agent>> {
        self.agents.iter().map(|e| e.value().clone()).collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
