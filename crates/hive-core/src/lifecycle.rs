//! Kernel lifecycle management.
//!
//! - Hook startup/shutdown ordering via priority
//! - Rollback of started hooks when one fails to start
//! - Graceful shutdown with a per-hook timeout

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use tokio::time::timeout;
use tracing::{error, info, warn};

use hive_protocols::KernelError;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

/// Kernel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KernelState {
    /// Initial state, not started.
    Created = 0,
    Starting = 1,
    /// Running rounds.
    Running = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl From<u8> for KernelState {
    fn from(v: u8) -> Self {
        match v {
            1 => KernelState::Starting,
            2 => KernelState::Running,
            3 => KernelState::ShuttingDown,
            4 => KernelState::Stopped,
            _ => KernelState::Created,
        }
    }
}

impl fmt::Display for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            KernelState::Created => "created",
            KernelState::Starting => "starting",
            KernelState::Running => "running",
            KernelState::ShuttingDown => "shutting_down",
            KernelState::Stopped => "stopped",
        };
        f.write_str(text)
    }
}

/// Broadcast shutdown request.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    /// Trigger shutdown. A no-op when nobody listens.
    pub fn trigger(&self) {
        let _ = self.sender.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Component started with the kernel and stopped with it.
#[async_trait::async_trait]
pub trait LifecycleHook: Send + Sync {
    fn name(&self) -> &str;

    async fn on_start(&self) -> Result<(), KernelError>;

    async fn on_stop(&self) -> Result<(), KernelError>;

    /// Higher starts earlier and stops later.
    fn priority(&self) -> i32 {
        priority::DEFAULT
    }
}

/// Drives the kernel state machine and its hooks.
pub struct LifecycleManager {
    state: AtomicU8,
    hooks: RwLock<Vec<Arc<dyn LifecycleHook>>>,
    shutdown_signal: ShutdownSignal,
    shutdown_timeout: Duration,
}

impl LifecycleManager {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            state: AtomicU8::new(KernelState::Created as u8),
            hooks: RwLock::new(Vec::new()),
            shutdown_signal: ShutdownSignal::new(),
            shutdown_timeout,
        }
    }

    pub fn state(&self) -> KernelState {
        KernelState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == KernelState::Running
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown_signal
    }

    pub async fn register_hook(&self, hook: Arc<dyn LifecycleHook>) {
        let mut hooks = self.hooks.write().await;
        hooks.push(hook);
        hooks.sort_by_key(|h| std::cmp::Reverse(h.priority()));
    }

    pub async fn hook_count(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Created -> Starting -> Running, starting hooks by priority.
    ///
    /// A failing hook stops the ones already started, in reverse order, and
    /// leaves the kernel stopped.
    pub async fn start(&self) -> Result<(), KernelError> {
        self.transition(KernelState::Created, KernelState::Starting)?;
        info!("Kernel starting...");

        let hooks = self.hooks.read().await;
        for (i, hook) in hooks.iter().enumerate() {
            if let Err(e) = hook.on_start().await {
                error!("Failed to start hook {}: {}", hook.name(), e);
                for started in hooks.iter().take(i).rev() {
                    if let Err(e) = started.on_stop().await {
                        warn!("Rollback of hook {} failed: {}", started.name(), e);
                    }
                }
                self.set_state(KernelState::Stopped);
                return Err(KernelError::HookFailed(format!("{}: {}", hook.name(), e)));
            }
        }

        self.set_state(KernelState::Running);
        info!("Kernel started");
        Ok(())
    }

    /// Running -> ShuttingDown -> Stopped, stopping hooks in reverse order.
    ///
    /// Every hook gets a chance to stop even if an earlier one failed.
    pub async fn stop(&self) -> Result<(), KernelError> {
        self.transition(KernelState::Running, KernelState::ShuttingDown)?;
        info!("Kernel shutting down...");
        self.shutdown_signal.trigger();

        let hooks = self.hooks.read().await;
        let mut failures = Vec::new();
        for hook in hooks.iter().rev() {
            match timeout(self.shutdown_timeout, hook.on_stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Hook {} stop error: {}", hook.name(), e);
                    failures.push(hook.name().to_string());
                }
                Err(_) => {
                    warn!("Hook {} stop timeout", hook.name());
                    failures.push(hook.name().to_string());
                }
            }
        }

        self.set_state(KernelState::Stopped);
        info!("Kernel stopped");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(KernelError::HookFailed(failures.join(", ")))
        }
    }

    fn transition(&self, from: KernelState, to: KernelState) -> Result<(), KernelError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|actual| KernelError::InvalidStateTransition {
                from: KernelState::from(actual).to_string(),
                to: to.to_string(),
            })
    }

    fn set_state(&self, state: KernelState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Priority levels for lifecycle hooks (higher = starts earlier, stops later).
pub mod priority {
    pub const INFRASTRUCTURE: i32 = 1000;
    pub const MONITOR: i32 = 800;
    pub const AGENTS: i32 = 500;
    pub const DEFAULT: i32 = 0;
}
