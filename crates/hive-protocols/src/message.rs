//! Inter-agent messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::AgentAddress;

/// A message travelling from one agent to another.
///
/// Sender, receiver and creation date are fixed when the message is built
/// by the sending side; there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    sender: AgentAddress,
    receiver: AgentAddress,
    creation_date: DateTime<Utc>,
    payload: serde_json::Value,
}

impl Message {
    /// Build a message sent now.
    pub fn new(
        sender: AgentAddress,
        receiver: AgentAddress,
        payload: impl Into<serde_json::Value>,
    ) -> Self {
        Self::sent_at(sender, receiver, payload, Utc::now())
    }

    /// Build a message with an explicit send time.
    pub fn sent_at(
        sender: AgentAddress,
        receiver: AgentAddress,
        payload: impl Into<serde_json::Value>,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            receiver,
            creation_date,
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> &AgentAddress {
        &self.sender
    }

    pub fn receiver(&self) -> &AgentAddress {
        &self.receiver
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Consume the message, keeping its payload.
    pub fn into_payload(self) -> serde_json::Value {
        self.payload
    }
}
