//! Round-based agent activator.
//!
//! An activator owns a set of agents and drives them through three phases:
//! initialization, behaviour and destruction. Each phase visits the agents
//! sequentially, in address order, and reports one packed [`Status`].
//!
//! A hook returning `Err` is recorded against the agent and the round goes
//! on. A hook that panics is a bug and unwinds through the phase.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use hive_protocols::{
    AgentAddress, AgentHandle, AgentLifeState, MultipleStatus, Status, StatusCode,
};

/// Scheduler of a population of agents.
pub struct AgentActivator {
    name: String,
    agents: Mutex<BTreeMap<AgentAddress, Arc<dyn AgentHandle>>>,
    yield_between_agents: bool,
}

impl AgentActivator {
    /// Create an empty activator. `name` is the provider of its packed statuses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agents: Mutex::new(BTreeMap::new()),
            yield_between_agents: true,
        }
    }

    /// Toggle the voluntary yield after each agent of a behaviour phase.
    pub fn with_yield(mut self, yield_between_agents: bool) -> Self {
        self.yield_between_agents = yield_between_agents;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manage `agent`, storing `init_parameters` for its next initialization.
    ///
    /// Empty parameters clear any previously stored ones. Returns `false` when
    /// an agent with the same address was already managed (it is replaced).
    pub fn add_agent(
        &self,
        agent: Arc<dyn AgentHandle>,
        init_parameters: Vec<serde_json::Value>,
    ) -> bool {
        let parameters = (!init_parameters.is_empty()).then_some(init_parameters);
        agent.set_init_parameters(parameters);
        let address = agent.address().clone();
        debug!("Activator {} now manages {}", self.name, address);
        self.agents.lock().insert(address, agent).is_none()
    }

    /// Stop managing an agent. Returns `false` when it was not managed.
    pub fn remove_agent(&self, address: &AgentAddress) -> bool {
        self.agents.lock().remove(address).is_some()
    }

    pub fn remove_all_agents(&self) {
        self.agents.lock().clear();
    }

    pub fn contains(&self, address: &AgentAddress) -> bool {
        self.agents.lock().contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }

    /// Addresses of the managed agents, in scheduling order.
    pub fn addresses(&self) -> Vec<AgentAddress> {
        self.agents.lock().keys().cloned().collect()
    }

    /// Initialize every unborn agent that is not migrating.
    ///
    /// Other agents contribute an OK entry without their hook being called.
    pub async fn run_init_phase(&self, parameters: &[serde_json::Value]) -> Status {
        let mut statuses = MultipleStatus::new();
        for agent in self.snapshot() {
            let provider = agent.address().to_string();
            if agent.state() != AgentLifeState::Unborn || agent.is_migrating() {
                statuses.add_status(Status::ok(provider));
                continue;
            }
            match agent.proceed_private_initialization(parameters).await {
                Ok(status) => statuses.add_status(status),
                Err(e) => {
                    error!("Initialization of {} failed: {}", provider, e);
                    statuses.add_status(Status::exception(provider, &e));
                }
            }
        }
        let status = statuses.pack(self.name.as_str());
        debug!("Init phase of {}: {}", self.name, status);
        status
    }

    /// Run one behaviour step for every managed agent.
    ///
    /// - alive and awake: behaviour hook; a failure also kills the agent
    /// - dying: killed
    /// - unborn or born, breaking down or died: warning, dropped from the set
    pub async fn run_behavior_phase(&self) -> Status {
        let mut statuses = MultipleStatus::new();
        for agent in self.snapshot() {
            // An earlier agent of this round may have removed it.
            if !self.contains(agent.address()) {
                continue;
            }
            let provider = agent.address().to_string();
            match agent.state() {
                AgentLifeState::Alive => {
                    if !agent.is_sleeping() {
                        match agent.proceed_private_behaviour().await {
                            Ok(status) => statuses.add_status(status),
                            Err(e) => {
                                error!("Behaviour of {} failed: {}", provider, e);
                                statuses.add_status(Status::exception(provider, &e));
                                statuses.add_status(self.kill_agent(&agent).await);
                            }
                        }
                    }
                }
                AgentLifeState::Dying => {
                    statuses.add_status(self.kill_agent(&agent).await);
                }
                state @ (AgentLifeState::Unborn | AgentLifeState::Born) => {
                    warn!("Agent {} is {} during a behaviour phase, dropping it", provider, state);
                    self.remove_agent(agent.address());
                    statuses.add_status(Status::warning(
                        provider,
                        StatusCode::UnexpectedAgentStateDuringActivation,
                    ));
                }
                state @ (AgentLifeState::BreakingDown | AgentLifeState::Died) => {
                    warn!("Agent {} is {} during a behaviour phase, dropping it", provider, state);
                    self.remove_agent(agent.address());
                    statuses.add_status(Status::warning(
                        provider,
                        StatusCode::UnexpectedAgentStateDuringDestruction,
                    ));
                }
            }
            if self.yield_between_agents {
                tokio::task::yield_now().await;
            }
        }
        statuses.pack(self.name.as_str())
    }

    /// Destroy every living agent that is not migrating.
    pub async fn run_destroy_phase(&self) -> Status {
        let mut statuses = MultipleStatus::new();
        for agent in self.snapshot() {
            let provider = agent.address().to_string();
            if !agent.state().is_alive() || agent.is_migrating() {
                statuses.add_status(Status::ok(provider));
                continue;
            }
            match agent.proceed_private_destruction().await {
                Ok(status) => statuses.add_status(status),
                Err(e) => {
                    error!("Destruction of {} failed: {}", provider, e);
                    statuses.add_status(Status::exception(provider, &e));
                }
            }
        }
        let status = statuses.pack(self.name.as_str());
        info!("Destroy phase of {}: {}", self.name, status);
        status
    }

    /// Drop the agent from this activator and have its kernel forget it.
    ///
    /// The agent leaves the managed set even when its kernel is gone.
    async fn kill_agent(&self, agent: &Arc<dyn AgentHandle>) -> Status {
        self.remove_agent(agent.address());
        match agent.kernel() {
            Some(kernel) => {
                debug!("Removing {} from its kernel", agent.address());
                kernel.remove_agent_from_kernel(agent.as_ref()).await
            }
            None => {
                warn!("Agent {} has no reachable kernel", agent.address());
                Status::failure(agent.address().to_string(), StatusCode::NoKernelAgent)
            }
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn AgentHandle>> {
        self.agents.lock().values().cloned().collect()
    }
}

impl std::fmt::Debug for AgentActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentActivator")
            .field("name", &self.name)
            .field("agents", &self.len())
            .field("yield_between_agents", &self.yield_between_agents)
            .finish()
    }
}

#[cfg(test)]
#[path = "activator_tests.rs"]
mod tests;
