//! Mailbox ordered by message creation date.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use hive_protocols::{AgentAddress, Mailbox, Message};

type Key = (DateTime<Utc>, Uuid);

fn key_of(message: &Message) -> Key {
    (message.creation_date(), message.id())
}

/// Direct mailbox returning the oldest message first, whatever the arrival
/// order. Messages created at the same instant are ordered by id.
#[derive(Default)]
pub struct TreeSetMailbox {
    inbox: Mutex<BTreeMap<Key, Message>>,
}

impl TreeSetMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for TreeSetMailbox {
    fn add(&self, message: Message) -> bool {
        self.inbox.lock().insert(key_of(&message), message);
        true
    }

    fn get(&self) -> Option<Message> {
        self.inbox.lock().pop_first().map(|(_, m)| m)
    }

    fn get_from(&self, sender: &AgentAddress) -> Option<Message> {
        let mut inbox = self.inbox.lock();
        let key = inbox
            .iter()
            .find(|(_, m)| m.sender() == sender)
            .map(|(k, _)| *k)?;
        inbox.remove(&key)
    }

    fn peek(&self) -> Option<Message> {
        self.inbox.lock().first_key_value().map(|(_, m)| m.clone())
    }

    fn peek_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox
            .lock()
            .values()
            .find(|m| m.sender() == sender)
            .cloned()
    }

    fn peek_all(&self) -> Vec<Message> {
        self.inbox.lock().values().cloned().collect()
    }

    fn remove(&self, id: Uuid) -> bool {
        let mut inbox = self.inbox.lock();
        let key = inbox.keys().find(|(_, mid)| *mid == id).copied();
        match key {
            Some(key) => inbox.remove(&key).is_some(),
            None => false,
        }
    }

    fn contains(&self, id: Uuid) -> bool {
        self.inbox.lock().keys().any(|(_, mid)| *mid == id)
    }

    fn size(&self) -> usize {
        self.inbox.lock().len()
    }

    fn clear(&self) {
        self.inbox.lock().clear();
    }
}
