//! # Hive Protocols
//!
//! Core protocol definitions for the hive agent kernel.
//! Contains the shared data types and the contracts between the kernel
//! and its collaborators - no scheduling or storage implementations.
//!
//! ## Core Traits
//!
//! - [`AgentHandle`] - What the activator needs from a schedulable agent
//! - [`KernelCollaborator`] - Kernel-side deregistration and message routing
//! - [`Mailbox`] / [`BufferedMailbox`] - Per-agent message stores
//! - [`SignalListener`] - Receivers of out-of-band signals
//!
//! ## Core Types
//!
//! - [`Status`] - Composable outcome of an operation or a whole round
//! - [`Message`] - Unit of inter-agent communication
//! - [`Signal`] / [`SignalKind`] - Typed lightweight notifications

pub mod address;
pub mod agent;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod signal;
pub mod status;

pub use address::AgentAddress;
pub use agent::{AgentHandle, AgentLifeState, KernelCollaborator};
pub use error::{AgentError, KernelError};
pub use mailbox::{BufferedMailbox, Mailbox, MailboxKind};
pub use message::Message;
pub use signal::{Signal, SignalKind, SignalListener, SignalPolicy};
pub use status::{MultipleStatus, PackedStatus, SingleStatus, Status, StatusCode, StatusSeverity};
