//! Staging wrapper turning a direct mailbox into a buffered one.

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use hive_protocols::{AgentAddress, BufferedMailbox, Mailbox, Message};

use super::{LinkedListMailbox, PerSenderMailbox, TreeSetMailbox};

/// Buffered mailbox over an insertion-ordered store.
pub type BufferedLinkedListMailbox = Buffered<LinkedListMailbox>;

/// Buffered mailbox over a creation-date-ordered store.
pub type BufferedTreeSetMailbox = Buffered<TreeSetMailbox>;

/// Buffered mailbox over a per-sender store: each synchronization keeps only
/// the latest staged message of every sender.
pub type BufferedPerSenderMailbox = Buffered<PerSenderMailbox>;

/// Buffered mailbox.
///
/// Producers append to `buffer` and never touch the visible store.
/// The consumer reads the visible store and merges the buffer into it with
/// [`BufferedMailbox::synchronize_messages`]. Lock order is always
/// buffer then store.
pub struct Buffered<M> {
    buffer: Mutex<Vec<Message>>,
    inbox: M,
}

impl<M: Mailbox> Buffered<M> {
    /// Wrap an (empty or pre-filled) visible store.
    pub fn new(inbox: M) -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            inbox,
        }
    }

    /// The visible store.
    pub fn inbox(&self) -> &M {
        &self.inbox
    }
}

impl<M: Mailbox + Default> Default for Buffered<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: Mailbox> Mailbox for Buffered<M> {
    fn add(&self, message: Message) -> bool {
        self.buffer.lock().push(message);
        true
    }

    fn get(&self) -> Option<Message> {
        self.inbox.get()
    }

    fn get_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox.get_from(sender)
    }

    fn peek(&self) -> Option<Message> {
        self.inbox.peek()
    }

    fn peek_from(&self, sender: &AgentAddress) -> Option<Message> {
        self.inbox.peek_from(sender)
    }

    fn peek_all(&self) -> Vec<Message> {
        self.inbox.peek_all()
    }

    fn remove(&self, id: Uuid) -> bool {
        self.inbox.remove(id)
    }

    fn contains(&self, id: Uuid) -> bool {
        self.inbox.contains(id)
    }

    fn size(&self) -> usize {
        self.inbox.size()
    }

    fn clear(&self) {
        self.inbox.clear();
    }

    fn as_buffered(&self) -> Option<&dyn BufferedMailbox> {
        Some(self)
    }
}

impl<M: Mailbox> BufferedMailbox for Buffered<M> {
    fn synchronize_messages(&self) {
        let mut buffer = self.buffer.lock();
        if buffer.is_empty() {
            return;
        }
        let staged = buffer.len();
        for message in buffer.drain(..) {
            self.inbox.add(message);
        }
        debug!(
            "Synchronized {} staged messages, {} visible",
            staged,
            self.inbox.size()
        );
    }

    fn clear_buffer(&self) {
        self.buffer.lock().clear();
    }

    fn buffer_size(&self) -> usize {
        self.buffer.lock().len()
    }
}
