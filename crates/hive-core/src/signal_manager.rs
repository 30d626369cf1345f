//! Hierarchical signal manager.
//!
//! Managers form a tree through non-owning parent links. Firing always
//! travels to the root, which applies its [`SignalPolicy`]: listeners are
//! called synchronously, or the signal is queued for polling. A manager
//! registers itself as a listener of its parent when it receives its first
//! listener, so dispatch from the root flows back down the tree.
//!
//! Each node tracks the narrowest [`SignalKind`] covering all of its
//! listeners; parents use it to skip subtrees that cannot handle a signal.
//!
//! Lock order is parent then child. A node never calls its parent while
//! holding its own state lock, and listeners are invoked on a snapshot.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use hive_protocols::{Signal, SignalKind, SignalListener, SignalPolicy};

struct ManagerState {
    policy: SignalPolicy,
    parent: Option<Weak<SignalManager>>,
    listeners: Vec<Arc<dyn SignalListener>>,
    queue: VecDeque<Signal>,
    /// `None` while there are no listeners.
    supported: Option<SignalKind>,
}

/// A node of the signal hierarchy.
pub struct SignalManager {
    this: Weak<SignalManager>,
    state: Mutex<ManagerState>,
}

fn same_listener(a: &Arc<dyn SignalListener>, b: &Arc<dyn SignalListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn narrowest_kind(listeners: &[Arc<dyn SignalListener>]) -> Option<SignalKind> {
    listeners
        .iter()
        .map(|l| l.supported_signal_type())
        .reduce(SignalKind::common_ancestor)
}

impl SignalManager {
    /// Create a root manager.
    pub fn new(policy: SignalPolicy) -> Arc<Self> {
        Self::build(policy, None)
    }

    /// Create a child manager inheriting the parent's current policy.
    pub fn with_parent(parent: &Arc<SignalManager>) -> Arc<Self> {
        Self::build(parent.policy(), Some(Arc::downgrade(parent)))
    }

    fn build(policy: SignalPolicy, parent: Option<Weak<SignalManager>>) -> Arc<Self> {
        Arc::new_cyclic(|this| SignalManager {
            this: this.clone(),
            state: Mutex::new(ManagerState {
                policy,
                parent,
                listeners: Vec::new(),
                queue: VecDeque::new(),
                supported: None,
            }),
        })
    }

    /// The parent node, if it is still alive and linked.
    pub fn parent(&self) -> Option<Arc<SignalManager>> {
        self.state.lock().parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn policy(&self) -> SignalPolicy {
        self.state.lock().policy
    }

    /// Change the policy of this node only.
    ///
    /// Signals already queued stay available to [`get_signal`](Self::get_signal)
    /// unless the new policy is not [`SignalPolicy::StoreInQueue`].
    pub fn set_policy(&self, policy: SignalPolicy) {
        let mut state = self.state.lock();
        if state.policy != policy {
            debug!("Signal policy changed from {} to {}", state.policy, policy);
        }
        state.policy = policy;
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.state.lock().listeners.is_empty()
    }

    /// Register a listener and narrow the supported kind.
    ///
    /// The first listener links this node into its parent's listeners.
    pub fn add_signal_listener(&self, listener: Arc<dyn SignalListener>) {
        let kind = listener.supported_signal_type();
        let (first, changed, parent) = {
            let mut state = self.state.lock();
            let first = state.listeners.is_empty();
            state.listeners.push(listener);
            let previous = state.supported;
            let narrowed = match previous {
                Some(current) => current.common_ancestor(kind),
                None => kind,
            };
            state.supported = Some(narrowed);
            trace!("Signal listener added, supported kind now {}", narrowed);
            (first, previous != Some(narrowed), self.parent_of(&state))
        };

        let Some(parent) = parent else { return };
        if first {
            if let Some(me) = self.as_listener() {
                parent.add_signal_listener(me);
            }
        } else if changed {
            parent.refresh();
        }
    }

    /// Unregister a listener. Returns `false` when it was not registered.
    ///
    /// The supported kind is recomputed from the remaining listeners; the
    /// last removal unlinks this node from its parent.
    pub fn remove_signal_listener(&self, listener: &Arc<dyn SignalListener>) -> bool {
        let (now_empty, changed, parent) = {
            let mut state = self.state.lock();
            let Some(index) = state
                .listeners
                .iter()
                .position(|l| same_listener(l, listener))
            else {
                return false;
            };
            state.listeners.remove(index);
            let previous = state.supported;
            let narrowed = narrowest_kind(&state.listeners);
            state.supported = narrowed;
            (
                state.listeners.is_empty(),
                previous != state.supported,
                self.parent_of(&state),
            )
        };

        if let Some(parent) = parent {
            if now_empty {
                if let Some(me) = self.as_listener() {
                    parent.remove_signal_listener(&me);
                }
            } else if changed {
                parent.refresh();
            }
        }
        true
    }

    /// Recompute the supported kind after a listener's own kind changed.
    pub fn refresh(&self) {
        let parent = {
            let mut state = self.state.lock();
            let narrowed = narrowest_kind(&state.listeners);
            if narrowed == state.supported {
                return;
            }
            state.supported = narrowed;
            self.parent_of(&state)
        };
        if let Some(parent) = parent {
            parent.refresh();
        }
    }

    /// Emit a signal into the hierarchy.
    ///
    /// Non-root nodes forward to their parent; the root applies its policy.
    /// A node whose policy is [`SignalPolicy::IgnoreAll`] drops the signal.
    pub fn fire_signal(&self, signal: Signal) {
        let (policy, parent) = {
            let state = self.state.lock();
            (state.policy, self.parent_of(&state))
        };
        if policy == SignalPolicy::IgnoreAll {
            trace!("Signal {} ignored", signal.name());
            return;
        }
        match parent {
            Some(parent) => parent.fire_signal(signal),
            None => self.handle(signal),
        }
    }

    /// Pop the oldest queued signal.
    pub fn get_signal(&self) -> Option<Signal> {
        let mut state = self.state.lock();
        match state.policy {
            SignalPolicy::StoreInQueue => state.queue.pop_front(),
            SignalPolicy::IgnoreAll | SignalPolicy::FireSignal => None,
        }
    }

    pub fn has_signal(&self) -> bool {
        let state = self.state.lock();
        state.policy == SignalPolicy::StoreInQueue && !state.queue.is_empty()
    }

    /// Whether a signal of `kind` can reach at least the narrowed listener kind.
    ///
    /// A node without listeners accepts everything.
    pub fn is_supported_signal_type(&self, kind: SignalKind) -> bool {
        match self.state.lock().supported {
            Some(supported) => kind.is_assignable_to(supported),
            None => true,
        }
    }

    /// Drop listeners, queued signals and the parent link.
    pub fn reset(&self) {
        let parent = {
            let mut state = self.state.lock();
            state.listeners.clear();
            state.queue.clear();
            state.supported = None;
            state.parent.take().and_then(|p| p.upgrade())
        };
        if let (Some(parent), Some(me)) = (parent, self.as_listener()) {
            parent.remove_signal_listener(&me);
        }
        debug!("Signal manager reset");
    }

    fn handle(&self, signal: Signal) {
        let listeners = {
            let mut state = self.state.lock();
            match state.policy {
                SignalPolicy::IgnoreAll => return,
                SignalPolicy::StoreInQueue => {
                    trace!("Signal {} queued", signal.name());
                    state.queue.push_back(signal);
                    return;
                }
                SignalPolicy::FireSignal => state.listeners.clone(),
            }
        };
        for listener in listeners {
            if signal.kind().is_assignable_to(listener.supported_signal_type()) {
                listener.on_signal(&signal);
            }
        }
    }

    fn parent_of(&self, state: &ManagerState) -> Option<Arc<SignalManager>> {
        state.parent.as_ref().and_then(Weak::upgrade)
    }

    fn as_listener(&self) -> Option<Arc<dyn SignalListener>> {
        self.this
            .upgrade()
            .map(|me| me as Arc<dyn SignalListener>)
    }
}

impl SignalListener for SignalManager {
    fn supported_signal_type(&self) -> SignalKind {
        self.state.lock().supported.unwrap_or(SignalKind::Any)
    }

    fn on_signal(&self, signal: &Signal) {
        self.handle(signal.clone());
    }
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SignalManager")
            .field("policy", &state.policy)
            .field("listeners", &state.listeners.len())
            .field("queued", &state.queue.len())
            .field("supported", &state.supported)
            .finish()
    }
}

#[cfg(test)]
#[path = "signal_manager_tests.rs"]
mod tests;
