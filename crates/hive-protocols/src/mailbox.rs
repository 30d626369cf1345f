//! Mailbox contracts.
//!
//! A mailbox is the per-agent store of inbound messages. Producers only ever
//! call [`Mailbox::add`]; the owning agent drains or inspects the store.
//! Buffered mailboxes stage additions separately and expose them to the
//! consumer only when [`BufferedMailbox::synchronize_messages`] runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::AgentAddress;
use crate::message::Message;

/// Thread-safe store of inbound messages for one agent.
///
/// Reads never fail: an empty mailbox answers `None` or an empty vector.
pub trait Mailbox: Send + Sync {
    /// Store a message. Holds only a short critical section.
    fn add(&self, message: Message) -> bool;

    /// Remove and return the next message.
    fn get(&self) -> Option<Message>;

    /// Remove and return the next message from `sender`.
    fn get_from(&self, sender: &AgentAddress) -> Option<Message>;

    /// Return a copy of the next message without removing it.
    fn peek(&self) -> Option<Message>;

    /// Return a copy of the next message from `sender` without removing it.
    fn peek_from(&self, sender: &AgentAddress) -> Option<Message>;

    /// Copy every visible message, in retrieval order.
    fn peek_all(&self) -> Vec<Message>;

    /// Remove the message with the given id.
    fn remove(&self, id: Uuid) -> bool;

    /// Check whether the message with the given id is visible.
    fn contains(&self, id: Uuid) -> bool;

    /// Number of visible messages.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every visible message.
    fn clear(&self);

    /// Downcast to the buffered contract, if supported.
    fn as_buffered(&self) -> Option<&dyn BufferedMailbox> {
        None
    }
}

/// Mailbox whose additions are staged until the owner synchronizes.
pub trait BufferedMailbox: Mailbox {
    /// Move every staged message into the visible store.
    ///
    /// This is the only operation that touches both the staging buffer and
    /// the visible store.
    fn synchronize_messages(&self);

    /// Drop staged messages without exposing them.
    fn clear_buffer(&self);

    /// Number of staged messages.
    fn buffer_size(&self) -> usize;

    fn is_buffer_empty(&self) -> bool {
        self.buffer_size() == 0
    }
}

/// Mailbox implementations selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailboxKind {
    /// Insertion order.
    #[default]
    LinkedList,
    /// Ordered by message creation date.
    TreeSet,
    /// One slot per sender, newest message wins.
    PerSender,
    BufferedLinkedList,
    BufferedTreeSet,
    BufferedPerSender,
}

impl MailboxKind {
    pub fn is_buffered(self) -> bool {
        matches!(
            self,
            MailboxKind::BufferedLinkedList
                | MailboxKind::BufferedTreeSet
                | MailboxKind::BufferedPerSender
        )
    }

    /// Whether the visible store keeps a single message per sender.
    pub fn collapses_per_sender(self) -> bool {
        matches!(self, MailboxKind::PerSender | MailboxKind::BufferedPerSender)
    }
}

impl fmt::Display for MailboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MailboxKind::LinkedList => "linked_list",
            MailboxKind::TreeSet => "tree_set",
            MailboxKind::PerSender => "per_sender",
            MailboxKind::BufferedLinkedList => "buffered_linked_list",
            MailboxKind::BufferedTreeSet => "buffered_tree_set",
            MailboxKind::BufferedPerSender => "buffered_per_sender",
        };
        f.write_str(text)
    }
}
