//! Signals: typed out-of-band notifications.
//!
//! Signal kinds form a fixed tree rooted at [`SignalKind::Any`]. A listener
//! declares the kind it supports and receives every signal whose kind is that
//! kind or one of its descendants.
//!
//! ```text
//! Any
//! ├── Lifecycle
//! │   ├── Kill
//! │   ├── Sleep
//! │   ├── Wake
//! │   └── Migrate
//! ├── Organization
//! │   ├── RoleTaken
//! │   └── RoleReleased
//! └── Application
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::AgentAddress;

/// Kind of a signal, a node of the signal tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Root kind, accepts everything.
    Any,
    Lifecycle,
    Kill,
    Sleep,
    Wake,
    Migrate,
    Organization,
    RoleTaken,
    RoleReleased,
    /// User defined signals, distinguished by [`Signal::name`].
    Application,
}

impl SignalKind {
    /// Every kind, parents before children.
    pub const ALL: [SignalKind; 10] = [
        SignalKind::Any,
        SignalKind::Lifecycle,
        SignalKind::Kill,
        SignalKind::Sleep,
        SignalKind::Wake,
        SignalKind::Migrate,
        SignalKind::Organization,
        SignalKind::RoleTaken,
        SignalKind::RoleReleased,
        SignalKind::Application,
    ];

    /// Direct ancestor, `None` for the root.
    pub const fn parent(self) -> Option<SignalKind> {
        match self {
            SignalKind::Any => None,
            SignalKind::Lifecycle | SignalKind::Organization | SignalKind::Application => {
                Some(SignalKind::Any)
            }
            SignalKind::Kill | SignalKind::Sleep | SignalKind::Wake | SignalKind::Migrate => {
                Some(SignalKind::Lifecycle)
            }
            SignalKind::RoleTaken | SignalKind::RoleReleased => Some(SignalKind::Organization),
        }
    }

    /// Distance to the root.
    pub fn depth(self) -> usize {
        self.ancestors().count() - 1
    }

    /// This kind followed by its ancestors up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = SignalKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// True when a signal of this kind can be handed to a listener of `target`.
    pub fn is_assignable_to(self, target: SignalKind) -> bool {
        self.ancestors().any(|kind| kind == target)
    }

    /// Nearest kind both `self` and `other` are assignable to.
    ///
    /// Always defined since every kind descends from [`SignalKind::Any`].
    pub fn common_ancestor(self, other: SignalKind) -> SignalKind {
        self.ancestors()
            .find(|kind| other.is_assignable_to(*kind))
            .unwrap_or(SignalKind::Any)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignalKind::Any => "any",
            SignalKind::Lifecycle => "lifecycle",
            SignalKind::Kill => "kill",
            SignalKind::Sleep => "sleep",
            SignalKind::Wake => "wake",
            SignalKind::Migrate => "migrate",
            SignalKind::Organization => "organization",
            SignalKind::RoleTaken => "role_taken",
            SignalKind::RoleReleased => "role_released",
            SignalKind::Application => "application",
        };
        f.write_str(text)
    }
}

/// A lightweight notification, distinct from mailbox messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    id: Uuid,
    kind: SignalKind,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    source: Option<AgentAddress>,
    #[serde(default)]
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl Signal {
    /// Create a signal named after its kind.
    pub fn new(kind: SignalKind) -> Self {
        Self::named(kind, kind.to_string())
    }

    /// Create a signal with an explicit name.
    pub fn named(kind: SignalKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            source: None,
            payload: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Kill request targeting `agent`.
    pub fn kill(agent: AgentAddress) -> Self {
        Self::new(SignalKind::Kill).with_source(agent)
    }

    pub fn with_source(mut self, source: AgentAddress) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<serde_json::Value>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the signal is about (the emitter, or the target of a kill).
    pub fn source(&self) -> Option<&AgentAddress> {
        self.source.as_ref()
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Delivery discipline of a signal manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPolicy {
    /// Drop every signal.
    IgnoreAll,
    /// Call listeners synchronously from the root of the hierarchy.
    #[default]
    FireSignal,
    /// Queue signals at the root for polling.
    StoreInQueue,
}

impl fmt::Display for SignalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalPolicy::IgnoreAll => write!(f, "ignore_all"),
            SignalPolicy::FireSignal => write!(f, "fire_signal"),
            SignalPolicy::StoreInQueue => write!(f, "store_in_queue"),
        }
    }
}

/// Receiver of signals.
pub trait SignalListener: Send + Sync {
    /// Most general signal kind this listener wants.
    fn supported_signal_type(&self) -> SignalKind;

    /// Handle a signal. Called synchronously from the firing thread.
    fn on_signal(&self, signal: &Signal);
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
