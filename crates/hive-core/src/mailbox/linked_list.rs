//! Insertion-ordered mailbox.

use std::collections::VecDeque;

use parking_lot::Mutex;
use uuid::Uuid;

use hive_protocols::{AgentAddress, Mailbox, Message};

/// Direct mailbox returning messages in arrival order.
#[derive(Default)]
pub struct LinkedListMailbox {
    inbox: Mutex<VecDeque<Message>>,
}

impl LinkedListMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for LinkedListMailbox {
    fn add(&self, message: Message) -> bool {
        self.inbox.lock().push_back(message);
        true
    }

    fn get(&self) -> Option<Message> {
        self.inbox.lock().pop_front()
    }

    fn get_from(&self, sender: &AgentAddress) -> Option<Message> {
        let mut inbox = self.inbox.lock();
        let index = inbox.iter().position(|m| m.sender() == sender)?;
        inbox.remove(index)
    }

    fn peek(&self) -> Option<Message> {
        self.inbox.lock().front().cloned()
    }

    fn peek_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox
            .lock()
            .iter()
            .find(|m| m.sender() == sender)
            .cloned()
    }

    fn peek_all(&self) -> Vec<Message> {
        self.inbox.lock().iter().cloned().collect()
    }

    fn remove(&self, id: Uuid) -> bool {
        let mut inbox = self.inbox.lock();
        match inbox.iter().position(|m| m.id() == id) {
            Some(index) => inbox.remove(index).is_some(),
            None => false,
        }
    }

    fn contains(&self, id: Uuid) -> bool {
        self.inbox.lock().iter().any(|m| m.id() == id)
    }

    fn size(&self) -> usize {
        self.inbox.lock().len()
    }

    fn clear(&self) {
        self.inbox.lock().clear();
    }
}
