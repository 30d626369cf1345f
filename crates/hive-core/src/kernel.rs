//! In-process kernel hosting a population of agents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use hive_config::Config;
use hive_protocols::{
    AgentAddress, AgentHandle, KernelCollaborator, KernelError, Message, MultipleStatus, Signal,
    Status, StatusSeverity,
};

use crate::activator::AgentActivator;
use crate::agent::{Agent, AgentBehavior};
use crate::lifecycle::{KernelState, LifecycleHook, LifecycleManager, ShutdownSignal};
use crate::mailbox::create_mailbox;
use crate::registry::AgentRegistry;
use crate::signal_manager::SignalManager;

const EVENT_CAPACITY: usize = 256;

/// Notable changes in the kernel population.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelEvent {
    AgentLaunched(AgentAddress),
    AgentRemoved(AgentAddress),
    RoundCompleted { round: u64, severity: StatusSeverity },
}

/// The kernel: agent registry, activator, root signal scope and lifecycle.
pub struct Kernel {
    this: Weak<Kernel>,
    config: Config,
    address: AgentAddress,
    registry: AgentRegistry,
    activator: AgentActivator,
    signals: Arc<SignalManager>,
    lifecycle: LifecycleManager,
    events: broadcast::Sender<KernelEvent>,
    rounds: AtomicU64,
}

impl Kernel {
    /// Create a kernel from configuration.
    pub fn new(config: Config) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new_cyclic(|this| Kernel {
            this: this.clone(),
            address: AgentAddress::named(config.kernel.name.clone()),
            registry: AgentRegistry::new(),
            activator: AgentActivator::new(config.kernel.name.clone())
                .with_yield(config.activator.yield_between_agents),
            signals: SignalManager::new(config.signal.policy),
            lifecycle: LifecycleManager::new(config.kernel.shutdown_timeout()),
            events,
            rounds: AtomicU64::new(0),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address used as sender of kernel-originated messages.
    pub fn address(&self) -> &AgentAddress {
        &self.address
    }

    pub fn state(&self) -> KernelState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        self.lifecycle.shutdown_signal()
    }

    /// Root of the signal hierarchy; every agent's manager is a child of it.
    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.events.subscribe()
    }

    pub fn agent(&self, address: &AgentAddress) -> Option<Arc<Agent>> {
        self.registry.get(address)
    }

    pub fn agent_addresses(&self) -> Vec<AgentAddress> {
        self.registry.addresses()
    }

    pub fn agent_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of rounds run so far.
    pub fn round_count(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }

    pub async fn register_lifecycle_hook(&self, hook: Arc<dyn LifecycleHook>) {
        self.lifecycle.register_hook(hook).await;
    }

    pub async fn start(&self) -> Result<(), KernelError> {
        self.lifecycle.start().await
    }

    /// Build an unborn agent wired to this kernel's mailbox kind and signal tree.
    pub fn create_agent(
        &self,
        name: impl Into<String>,
        behavior: impl AgentBehavior + 'static,
    ) -> Agent {
        Agent::new(name, behavior)
            .with_mailbox(create_mailbox(self.config.mailbox.kind))
            .with_signal_manager(SignalManager::with_parent(&self.signals))
    }

    /// Create and launch an agent in one step.
    pub fn spawn_agent(
        &self,
        name: impl Into<String>,
        behavior: impl AgentBehavior + 'static,
        init_parameters: Vec<Value>,
    ) -> Result<Arc<Agent>, KernelError> {
        self.launch_agent(self.create_agent(name, behavior), init_parameters)
    }

    /// Register an agent and schedule it for initialization in the next round.
    pub fn launch_agent(
        &self,
        agent: Agent,
        init_parameters: Vec<Value>,
    ) -> Result<Arc<Agent>, KernelError> {
        if matches!(
            self.state(),
            KernelState::ShuttingDown | KernelState::Stopped
        ) {
            return Err(KernelError::NotRunning);
        }
        let me: Weak<dyn KernelCollaborator> = self.this.clone();
        agent.bind_kernel(me);

        let agent = Arc::new(agent);
        self.registry.register(agent.clone())?;
        self.activator.add_agent(agent.clone(), init_parameters);

        info!("Agent launched: {}", agent.address());
        let _ = self
            .events
            .send(KernelEvent::AgentLaunched(agent.address().clone()));
        Ok(agent)
    }

    /// Request an agent's death. It is removed at the next behaviour phase.
    ///
    /// Returns `false` when the agent was not alive. A kill signal is fired
    /// into the signal tree on success.
    pub fn kill_agent(&self, address: &AgentAddress) -> Result<bool, KernelError> {
        let agent = self
            .registry
            .get(address)
            .ok_or_else(|| KernelError::AgentNotFound(address.to_string()))?;
        if !agent.kill_me() {
            debug!("Agent {} not alive, kill ignored", address);
            return Ok(false);
        }
        self.signals.fire_signal(Signal::kill(address.clone()));
        Ok(true)
    }

    /// Send a message from the kernel itself. Returns the message id.
    pub fn post(
        &self,
        receiver: &AgentAddress,
        payload: impl Into<Value>,
    ) -> Result<Uuid, KernelError> {
        let message = Message::new(self.address.clone(), receiver.clone(), payload);
        let id = message.id();
        self.route_message(message)?;
        Ok(id)
    }

    /// Initialize newcomers, then run one behaviour step for every agent.
    pub async fn run_round(&self) -> Result<Status, KernelError> {
        if !self.is_running() {
            return Err(KernelError::NotRunning);
        }
        let mut statuses = MultipleStatus::new();
        statuses.add_status(self.activator.run_init_phase(&[]).await);
        statuses.add_status(self.activator.run_behavior_phase().await);
        let status = statuses.pack(self.config.kernel.name.as_str());

        let round = self.rounds.fetch_add(1, Ordering::SeqCst) + 1;
        if status.is_failure() {
            warn!("Round {} completed: {}", round, status);
        } else {
            debug!("Round {} completed: {}", round, status);
        }
        let _ = self.events.send(KernelEvent::RoundCompleted {
            round,
            severity: status.severity(),
        });
        Ok(status)
    }

    /// Run rounds until no agent is left, `max_rounds` is reached or shutdown
    /// is requested. Returns the number of rounds run by this call.
    pub async fn run(&self) -> Result<u64, KernelError> {
        let mut shutdown = self.shutdown_signal().subscribe();
        let max_rounds = self.config.kernel.max_rounds;
        let interval = self.config.kernel.round_interval();
        let mut executed = 0;

        while self.is_running() && !self.registry.is_empty() {
            if max_rounds > 0 && executed >= max_rounds {
                break;
            }
            self.run_round().await?;
            executed += 1;

            if interval.is_zero() {
                if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }
            } else {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }
        info!("Kernel ran {} rounds, {} agents left", executed, self.agent_count());
        Ok(executed)
    }

    /// Destroy every agent, empty the registry and stop the lifecycle hooks.
    ///
    /// Returns the status of the destroy phase.
    pub async fn stop(&self) -> Result<Status, KernelError> {
        if !self.is_running() {
            return Err(KernelError::NotRunning);
        }
        info!("Stopping kernel {}...", self.config.kernel.name);
        let status = self.activator.run_destroy_phase().await;

        self.activator.remove_all_agents();
        for address in self.registry.addresses() {
            if let Some(agent) = self.registry.unregister(&address) {
                // Agents never initialized still hold a link in the signal tree.
                agent.signals().reset();
                let _ = self.events.send(KernelEvent::AgentRemoved(address));
            }
        }
        self.lifecycle.stop().await?;
        Ok(status)
    }
}

#[async_trait]
impl KernelCollaborator for Kernel {
    /// Forget the agent everywhere, destroying it first if still alive.
    ///
    /// Removing an unknown agent is OK.
    async fn remove_agent_from_kernel(&self, agent: &dyn AgentHandle) -> Status {
        let address = agent.address().clone();
        self.activator.remove_agent(&address);
        let Some(registered) = self.registry.unregister(&address) else {
            trace!("Agent {} already removed", address);
            return Status::ok(address.to_string());
        };

        let status = if registered.is_alive() {
            match registered.proceed_private_destruction().await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Destruction of {} failed: {}", address, e);
                    Status::exception(address.to_string(), &e)
                }
            }
        } else {
            Status::ok(address.to_string())
        };

        info!("Agent removed: {}", address);
        let _ = self.events.send(KernelEvent::AgentRemoved(address));
        status
    }

    fn route_message(&self, message: Message) -> Result<(), KernelError> {
        let receiver = self
            .registry
            .get(message.receiver())
            .ok_or_else(|| KernelError::AgentNotFound(message.receiver().to_string()))?;
        trace!("Routing {} from {}", message.id(), message.sender());
        receiver.mailbox().add(message);
        Ok(())
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.config.kernel.name)
            .field("state", &self.state())
            .field("agents", &self.agent_count())
            .field("rounds", &self.round_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
