//! Concrete agent driven by a user supplied [`AgentBehavior`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hive_protocols::{
    AgentAddress, AgentError, AgentHandle, AgentLifeState, KernelCollaborator, KernelError,
    Mailbox, Message, Signal, Status,
};

use crate::mailbox::LinkedListMailbox;
use crate::signal_manager::SignalManager;

/// Application logic of an agent.
///
/// Every hook receives the [`Agent`] it runs in, giving access to the
/// mailbox, the signal manager and messaging. Returning `Err` is a recoverable
/// failure; panicking aborts the whole round.
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    /// Called once when the agent is initialized.
    async fn activate(
        &mut self,
        agent: &Agent,
        _parameters: &[Value],
    ) -> Result<Status, AgentError> {
        Ok(Status::ok(agent.address().to_string()))
    }

    /// Called at every behaviour phase while the agent is alive and awake.
    async fn live(&mut self, agent: &Agent) -> Result<Status, AgentError>;

    /// Called once when the agent is destroyed.
    async fn end(&mut self, agent: &Agent) -> Result<Status, AgentError> {
        Ok(Status::ok(agent.address().to_string()))
    }
}

/// An agent: lifecycle state, mailbox, signal scope and behaviour.
pub struct Agent {
    address: AgentAddress,
    state: RwLock<AgentLifeState>,
    migrating: AtomicBool,
    sleep_until: Mutex<Option<Instant>>,
    init_parameters: Mutex<Option<Vec<Value>>>,
    kernel: RwLock<Option<Weak<dyn KernelCollaborator>>>,
    mailbox: Arc<dyn Mailbox>,
    signals: Arc<SignalManager>,
    behavior: tokio::sync::Mutex<Box<dyn AgentBehavior>>,
}

impl Agent {
    /// Create an unborn agent with a linked-list mailbox and a root signal
    /// manager using the default policy.
    pub fn new(name: impl Into<String>, behavior: impl AgentBehavior + 'static) -> Self {
        Self {
            address: AgentAddress::named(name),
            state: RwLock::new(AgentLifeState::Unborn),
            migrating: AtomicBool::new(false),
            sleep_until: Mutex::new(None),
            init_parameters: Mutex::new(None),
            kernel: RwLock::new(None),
            mailbox: Arc::new(LinkedListMailbox::new()),
            signals: SignalManager::new(Default::default()),
            behavior: tokio::sync::Mutex::new(Box::new(behavior)),
        }
    }

    pub fn with_address(mut self, address: AgentAddress) -> Self {
        self.address = address;
        self
    }

    pub fn with_mailbox(mut self, mailbox: Arc<dyn Mailbox>) -> Self {
        self.mailbox = mailbox;
        self
    }

    pub fn with_signal_manager(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = signals;
        self
    }

    /// Attach the agent to its owning kernel. The agent never keeps it alive.
    pub fn bind_kernel(&self, kernel: Weak<dyn KernelCollaborator>) {
        *self.kernel.write() = Some(kernel);
    }

    pub fn mailbox(&self) -> &Arc<dyn Mailbox> {
        &self.mailbox
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    /// Ask for this agent's removal at the next behaviour phase.
    ///
    /// Returns `false` when the agent is not alive.
    pub fn kill_me(&self) -> bool {
        let mut state = self.state.write();
        if *state != AgentLifeState::Alive {
            return false;
        }
        *state = AgentLifeState::Dying;
        info!("Agent {} asked to die", self.address);
        true
    }

    /// Skip behaviour phases for `duration`.
    pub fn sleep_for(&self, duration: Duration) {
        *self.sleep_until.lock() = Some(Instant::now() + duration);
    }

    pub fn wake_up(&self) {
        self.sleep_until.lock().take();
    }

    /// Exclude the agent from init and destroy processing while it moves.
    pub fn set_migrating(&self, migrating: bool) {
        self.migrating.store(migrating, Ordering::SeqCst);
    }

    /// Send a message through the owning kernel. Returns the message id.
    pub fn send_message(
        &self,
        receiver: &AgentAddress,
        payload: impl Into<Value>,
    ) -> Result<Uuid, KernelError> {
        let kernel = self.kernel().ok_or(KernelError::NoKernel)?;
        let message = Message::new(self.address.clone(), receiver.clone(), payload);
        let id = message.id();
        kernel.route_message(message)?;
        Ok(id)
    }

    /// Next visible message of the mailbox.
    pub fn get_message(&self) -> Option<Message> {
        self.mailbox.get()
    }

    /// Fire a signal tagged with this agent as source.
    pub fn fire_signal(&self, signal: Signal) {
        self.signals.fire_signal(signal.with_source(self.address.clone()));
    }

    fn set_state(&self, state: AgentLifeState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        debug!("Agent {}: {} -> {}", self.address, previous, state);
    }

    fn expect_state(&self, expected: &str, accepted: bool) -> Result<(), AgentError> {
        if accepted {
            Ok(())
        } else {
            Err(AgentError::InvalidState {
                expected: expected.to_string(),
                actual: self.state(),
            })
        }
    }
}

#[async_trait]
impl AgentHandle for Agent {
    fn address(&self) -> &AgentAddress {
        &self.address
    }

    fn state(&self) -> AgentLifeState {
        *self.state.read()
    }

    fn is_sleeping(&self) -> bool {
        let mut sleep_until = self.sleep_until.lock();
        match *sleep_until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                *sleep_until = None;
                false
            }
            None => false,
        }
    }

    fn is_migrating(&self) -> bool {
        self.migrating.load(Ordering::SeqCst)
    }

    fn set_init_parameters(&self, parameters: Option<Vec<Value>>) {
        *self.init_parameters.lock() = parameters;
    }

    fn kernel(&self) -> Option<Arc<dyn KernelCollaborator>> {
        self.kernel.read().as_ref().and_then(Weak::upgrade)
    }

    /// Born, then alive. A failed activation leaves the agent dying.
    async fn proceed_private_initialization(
        &self,
        parameters: &[Value],
    ) -> Result<Status, AgentError> {
        self.expect_state("unborn", self.state() == AgentLifeState::Unborn)?;
        self.set_state(AgentLifeState::Born);

        let personal = self.init_parameters.lock().take();
        let parameters = personal.as_deref().unwrap_or(parameters);

        let result = {
            let mut behavior = self.behavior.lock().await;
            behavior.activate(self, parameters).await
        };
        match &result {
            Ok(status) if status.is_success() => {
                self.set_state(AgentLifeState::Alive);
                info!("Agent {} is alive", self.address);
            }
            Ok(status) => {
                warn!("Agent {} failed to activate: {}", self.address, status);
                self.set_state(AgentLifeState::Dying);
            }
            Err(e) => {
                warn!("Agent {} failed to activate: {}", self.address, e);
                self.set_state(AgentLifeState::Dying);
            }
        }
        result
    }

    async fn proceed_private_behaviour(&self) -> Result<Status, AgentError> {
        self.expect_state("alive", self.state() == AgentLifeState::Alive)?;
        if let Some(buffered) = self.mailbox.as_buffered() {
            buffered.synchronize_messages();
        }
        let mut behavior = self.behavior.lock().await;
        behavior.live(self).await
    }

    /// Breaking down, then died; the mailbox and signal scope are released.
    async fn proceed_private_destruction(&self) -> Result<Status, AgentError> {
        self.expect_state("alive or dying", self.state().is_alive())?;
        self.set_state(AgentLifeState::BreakingDown);

        let result = {
            let mut behavior = self.behavior.lock().await;
            behavior.end(self).await
        };

        self.signals.reset();
        self.mailbox.clear();
        if let Some(buffered) = self.mailbox.as_buffered() {
            buffered.clear_buffer();
        }
        self.set_state(AgentLifeState::Died);
        info!("Agent {} died", self.address);
        result
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("address", &self.address)
            .field("state", &self.state())
            .field("migrating", &self.is_migrating())
            .field("mailbox_size", &self.mailbox.size())
            .finish()
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
