//! One-slot-per-sender mailbox.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use uuid::Uuid;

use hive_protocols::{AgentAddress, Mailbox, Message};

/// Direct mailbox keeping only the latest message of each sender.
///
/// Adding a message from a sender that already has a slot replaces the
/// older message. Retrieval follows sender address order.
#[derive(Default)]
pub struct PerSenderMailbox {
    inbox: Mutex<BTreeMap<AgentAddress, Message>>,
}

impl PerSenderMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for PerSenderMailbox {
    fn add(&self, message: Message) -> bool {
        self.inbox.lock().insert(message.sender().clone(), message);
        true
    }

    fn get(&self) -> Option<Message> {
        self.inbox.lock().pop_first().map(|(_, m)| m)
    }

    fn get_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox.lock().remove(sender)
    }

    fn peek(&self) -> Option<Message> {
        self.inbox.lock().first_key_value().map(|(_, m)| m.clone())
    }

    fn peek_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox.lock().get(sender).cloned()
    }

    fn peek_all(&self) -> Vec<Message> {
        self.inbox.lock().values().cloned().collect()
    }

    fn remove(&self, id: Uuid) -> bool {
        let mut inbox = self.inbox.lock();
        let before = inbox.len();
        inbox.retain(|_, m| m.id() != id);
        inbox.len() != before
    }

    fn contains(&self, id: Uuid) -> bool {
        self.inbox.lock().values().any(|m| m.id() == id)
    }

    fn size(&self) -> usize {
        self.inbox.lock().len()
    }

    fn clear(&self) {
        self.inbox.lock().clear();
    }
}
