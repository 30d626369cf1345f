use super::*;

struct Recorder {
    kind: SignalKind,
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(kind: SignalKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl SignalListener for Recorder {
    fn supported_signal_type(&self) -> SignalKind {
        self.kind
    }

    fn on_signal(&self, signal: &Signal) {
        self.seen.lock().push(signal.name().to_string());
    }
}

fn listener(recorder: &Arc<Recorder>) -> Arc<dyn SignalListener> {
    recorder.clone()
}

#[test]
fn test_default_policy_is_fire() {
    let root = SignalManager::new(SignalPolicy::default());
    assert_eq!(root.policy(), SignalPolicy::FireSignal);
    assert!(root.is_root());
}

#[test]
fn test_child_inherits_policy() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let child = SignalManager::with_parent(&root);
    assert_eq!(child.policy(), SignalPolicy::StoreInQueue);
    assert!(Arc::ptr_eq(&child.parent().unwrap(), &root));
}

#[test]
fn test_no_listener_accepts_everything() {
    let node = SignalManager::new(SignalPolicy::FireSignal);
    for kind in SignalKind::ALL {
        assert!(node.is_supported_signal_type(kind));
    }
    assert_eq!(node.supported_signal_type(), SignalKind::Any);
}

#[test]
fn test_narrowing_to_common_ancestor() {
    let node = SignalManager::new(SignalPolicy::FireSignal);
    node.add_signal_listener(Recorder::new(SignalKind::Kill));
    assert_eq!(node.supported_signal_type(), SignalKind::Kill);
    assert!(!node.is_supported_signal_type(SignalKind::Sleep));

    node.add_signal_listener(Recorder::new(SignalKind::Sleep));
    assert_eq!(node.supported_signal_type(), SignalKind::Lifecycle);
    assert!(node.is_supported_signal_type(SignalKind::Wake));
    assert!(node.is_supported_signal_type(SignalKind::Lifecycle));
    assert!(!node.is_supported_signal_type(SignalKind::RoleTaken));
    assert!(!node.is_supported_signal_type(SignalKind::Any));
}

#[test]
fn test_unrelated_listeners_fall_back_to_root_kind() {
    let node = SignalManager::new(SignalPolicy::FireSignal);
    node.add_signal_listener(Recorder::new(SignalKind::Kill));
    node.add_signal_listener(Recorder::new(SignalKind::Application));
    assert_eq!(node.supported_signal_type(), SignalKind::Any);
    assert!(node.is_supported_signal_type(SignalKind::RoleReleased));
}

#[test]
fn test_removal_recomputes_narrowing() {
    let node = SignalManager::new(SignalPolicy::FireSignal);
    let kill = Recorder::new(SignalKind::Kill);
    let app = Recorder::new(SignalKind::Application);
    node.add_signal_listener(listener(&kill));
    node.add_signal_listener(listener(&app));
    assert_eq!(node.supported_signal_type(), SignalKind::Any);

    assert!(node.remove_signal_listener(&listener(&app)));
    assert_eq!(node.supported_signal_type(), SignalKind::Kill);

    assert!(node.remove_signal_listener(&listener(&kill)));
    assert!(!node.has_listeners());
    assert!(node.is_supported_signal_type(SignalKind::Application));
}

#[test]
fn test_remove_unknown_listener() {
    let node = SignalManager::new(SignalPolicy::FireSignal);
    node.add_signal_listener(Recorder::new(SignalKind::Kill));
    let stranger = Recorder::new(SignalKind::Kill);
    assert!(!node.remove_signal_listener(&listener(&stranger)));
    assert_eq!(node.listener_count(), 1);
}

#[test]
fn test_fire_calls_matching_listeners() {
    let root = SignalManager::new(SignalPolicy::FireSignal);
    let lifecycle = Recorder::new(SignalKind::Lifecycle);
    let org = Recorder::new(SignalKind::Organization);
    root.add_signal_listener(listener(&lifecycle));
    root.add_signal_listener(listener(&org));

    root.fire_signal(Signal::named(SignalKind::Sleep, "nap"));
    root.fire_signal(Signal::named(SignalKind::RoleTaken, "chair"));

    assert_eq!(lifecycle.seen(), vec!["nap"]);
    assert_eq!(org.seen(), vec!["chair"]);
    assert!(!root.has_signal());
    assert!(root.get_signal().is_none());
}

#[test]
fn test_store_in_queue_is_fifo() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let recorder = Recorder::new(SignalKind::Any);
    root.add_signal_listener(listener(&recorder));

    for name in ["s1", "s2", "s3"] {
        root.fire_signal(Signal::named(SignalKind::Application, name));
    }

    assert!(root.has_signal());
    assert_eq!(root.get_signal().unwrap().name(), "s1");
    assert_eq!(root.get_signal().unwrap().name(), "s2");
    assert_eq!(root.get_signal().unwrap().name(), "s3");
    assert!(root.get_signal().is_none());
    assert!(!root.has_signal());
    assert!(recorder.seen().is_empty());
}

#[test]
fn test_ignore_all_drops_everything() {
    let root = SignalManager::new(SignalPolicy::IgnoreAll);
    let recorder = Recorder::new(SignalKind::Any);
    root.add_signal_listener(listener(&recorder));

    root.fire_signal(Signal::new(SignalKind::Kill));

    assert!(recorder.seen().is_empty());
    assert!(!root.has_signal());
    assert!(root.get_signal().is_none());
}

#[test]
fn test_ignoring_child_does_not_forward() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let child = SignalManager::with_parent(&root);
    child.set_policy(SignalPolicy::IgnoreAll);

    child.fire_signal(Signal::new(SignalKind::Kill));
    assert!(!root.has_signal());
}

#[test]
fn test_child_fire_is_handled_at_root() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let child = SignalManager::with_parent(&root);
    let grandchild = SignalManager::with_parent(&child);

    grandchild.fire_signal(Signal::named(SignalKind::Wake, "up"));

    assert!(!grandchild.has_signal());
    assert!(!child.has_signal());
    assert_eq!(root.get_signal().unwrap().name(), "up");
}

#[test]
fn test_first_listener_links_node_to_parent() {
    let root = SignalManager::new(SignalPolicy::FireSignal);
    let child = SignalManager::with_parent(&root);
    assert_eq!(root.listener_count(), 0);

    let a = Recorder::new(SignalKind::Kill);
    let b = Recorder::new(SignalKind::Sleep);
    child.add_signal_listener(listener(&a));
    child.add_signal_listener(listener(&b));
    assert_eq!(root.listener_count(), 1);

    child.remove_signal_listener(&listener(&a));
    assert_eq!(root.listener_count(), 1);
    child.remove_signal_listener(&listener(&b));
    assert_eq!(root.listener_count(), 0);
}

#[test]
fn test_fire_from_child_reaches_sibling_listeners() {
    let root = SignalManager::new(SignalPolicy::FireSignal);
    let left = SignalManager::with_parent(&root);
    let right = SignalManager::with_parent(&root);
    let on_right = Recorder::new(SignalKind::Lifecycle);
    right.add_signal_listener(listener(&on_right));

    left.fire_signal(Signal::named(SignalKind::Kill, "k"));
    left.fire_signal(Signal::named(SignalKind::Application, "app"));

    assert_eq!(on_right.seen(), vec!["k"]);
}

#[test]
fn test_parent_narrowing_follows_child_changes() {
    let root = SignalManager::new(SignalPolicy::FireSignal);
    let child = SignalManager::with_parent(&root);
    let kill = Recorder::new(SignalKind::Kill);
    child.add_signal_listener(listener(&kill));
    assert_eq!(root.supported_signal_type(), SignalKind::Kill);

    let sleep = Recorder::new(SignalKind::Sleep);
    child.add_signal_listener(listener(&sleep));
    assert_eq!(root.supported_signal_type(), SignalKind::Lifecycle);

    root.fire_signal(Signal::named(SignalKind::Sleep, "zz"));
    assert_eq!(sleep.seen(), vec!["zz"]);
    assert!(kill.seen().is_empty());

    child.remove_signal_listener(&listener(&sleep));
    assert_eq!(root.supported_signal_type(), SignalKind::Kill);
}

#[test]
fn test_reset_detaches_from_parent() {
    let root = SignalManager::new(SignalPolicy::FireSignal);
    let child = SignalManager::with_parent(&root);
    let recorder = Recorder::new(SignalKind::Any);
    child.add_signal_listener(listener(&recorder));
    assert_eq!(root.listener_count(), 1);

    child.reset();

    assert!(child.parent().is_none());
    assert_eq!(child.listener_count(), 0);
    assert_eq!(root.listener_count(), 0);
    root.fire_signal(Signal::new(SignalKind::Kill));
    assert!(recorder.seen().is_empty());
}

#[test]
fn test_reset_clears_queue() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    root.fire_signal(Signal::new(SignalKind::Kill));
    assert!(root.has_signal());
    root.reset();
    assert!(!root.has_signal());
}

#[test]
fn test_dropped_parent_makes_child_a_root() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let child = SignalManager::with_parent(&root);
    drop(root);

    assert!(child.is_root());
    child.fire_signal(Signal::named(SignalKind::Kill, "orphan"));
    assert_eq!(child.get_signal().unwrap().name(), "orphan");
}

#[test]
fn test_concurrent_firing() {
    let root = SignalManager::new(SignalPolicy::StoreInQueue);
    let children: Vec<_> = (0..4).map(|_| SignalManager::with_parent(&root)).collect();
    let handles: Vec<_> = children
        .into_iter()
        .map(|child| {
            std::thread::spawn(move || {
                for _ in 0..50 {
                    child.fire_signal(Signal::new(SignalKind::Application));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut count = 0;
    while root.get_signal().is_some() {
        count += 1;
    }
    assert_eq!(count, 200);
}
