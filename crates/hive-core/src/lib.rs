//! # Hive Core
//!
//! Execution kernel for populations of autonomous agents.
//!
//! ## Components
//!
//! - [`AgentActivator`] - Round-based scheduler driving init/behaviour/destroy phases
//! - [`mailbox`] - Direct and buffered mailboxes
//! - [`SignalManager`] - Hierarchical, policy-driven signal propagation
//! - [`Agent`] - Concrete agent wrapping a user [`AgentBehavior`]
//! - [`Kernel`] - In-process kernel owning a registry and an activator
//! - [`LifecycleManager`] - Kernel lifecycle hooks and shutdown signalling

pub mod activator;
pub mod agent;
pub mod kernel;
pub mod lifecycle;
pub mod mailbox;
pub mod registry;
pub mod signal_manager;

pub use activator::AgentActivator;
pub use agent::{Agent, AgentBehavior};
pub use kernel::{Kernel, KernelEvent};
pub use lifecycle::{KernelState, LifecycleHook, LifecycleManager, ShutdownSignal};
pub use mailbox::create_mailbox;
pub use registry::AgentRegistry;
pub use signal_manager::SignalManager;
