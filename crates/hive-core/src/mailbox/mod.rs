//! Mailbox implementations.
//!
//! Direct mailboxes expose additions immediately and guard their store with a
//! single lock. Buffered mailboxes ([`Buffered`]) stage additions behind a
//! second lock and merge them into a direct store on
//! [`BufferedMailbox::synchronize_messages`].

mod buffered;
mod linked_list;
mod per_sender;
mod tree_set;

use std::sync::Arc;

use hive_protocols::{Mailbox, MailboxKind};

pub use buffered::{
    Buffered, BufferedLinkedListMailbox, BufferedPerSenderMailbox, BufferedTreeSetMailbox,
};
pub use hive_protocols::BufferedMailbox;
pub use linked_list::LinkedListMailbox;
pub use per_sender::PerSenderMailbox;
pub use tree_set::TreeSetMailbox;

/// Build an empty mailbox of the requested kind.
pub fn create_mailbox(kind: MailboxKind) -> Arc<dyn Mailbox> {
    match kind {
        MailboxKind::LinkedList => Arc::new(LinkedListMailbox::new()),
        MailboxKind::TreeSet => Arc::new(TreeSetMailbox::new()),
        MailboxKind::PerSender => Arc::new(PerSenderMailbox::new()),
        MailboxKind::BufferedLinkedList => Arc::new(BufferedLinkedListMailbox::default()),
        MailboxKind::BufferedTreeSet => Arc::new(BufferedTreeSetMailbox::default()),
        MailboxKind::BufferedPerSender => Arc::new(BufferedPerSenderMailbox::default()),
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
