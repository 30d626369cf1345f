use super::*;
use parking_lot::Mutex;
use serde_json::json;

use hive_config::{KernelConfig, MailboxConfig, SignalConfig};
use hive_protocols::{
    AgentError, AgentLifeState, MailboxKind, SignalKind, SignalListener, SignalPolicy,
};

type Journal = Arc<Mutex<Vec<String>>>;

/// Records what it sees; optionally dies after a number of turns.
#[derive(Default)]
struct Worker {
    journal: Journal,
    lives_before_death: Option<usize>,
    fail: bool,
    peer: Option<AgentAddress>,
    shutdown: Option<ShutdownSignal>,
    turns: usize,
}

#[async_trait]
impl AgentBehavior for Worker {
    async fn activate(
        &mut self,
        agent: &Agent,
        parameters: &[Value],
    ) -> Result<Status, AgentError> {
        self.journal
            .lock()
            .push(format!("activate {}", Value::Array(parameters.to_vec())));
        Ok(Status::ok(agent.address().to_string()))
    }

    async fn live(&mut self, agent: &Agent) -> Result<Status, AgentError> {
        self.turns += 1;
        while let Some(message) = agent.get_message() {
            self.journal.lock().push(format!("got {}", message.payload()));
        }
        if let Some(peer) = &self.peer {
            agent.send_message(peer, json!(self.turns))?;
        }
        if let Some(shutdown) = &self.shutdown {
            shutdown.trigger();
        }
        if self.fail {
            return Err(AgentError::ExecutionFailed("worker crashed".into()));
        }
        if self.lives_before_death == Some(self.turns) {
            agent.kill_me();
        }
        Ok(Status::ok(agent.address().to_string()))
    }

    async fn end(&mut self, agent: &Agent) -> Result<Status, AgentError> {
        self.journal.lock().push("end".to_string());
        Ok(Status::ok(agent.address().to_string()))
    }
}

fn worker(journal: &Journal) -> Worker {
    Worker {
        journal: journal.clone(),
        ..Default::default()
    }
}

fn config_with(mailbox: MailboxKind, policy: SignalPolicy, max_rounds: u64) -> Config {
    Config {
        kernel: KernelConfig {
            max_rounds,
            ..Default::default()
        },
        mailbox: MailboxConfig { kind: mailbox },
        signal: SignalConfig { policy },
        ..Default::default()
    }
}

async fn started(config: Config) -> Arc<Kernel> {
    let kernel = Kernel::new(config);
    kernel.start().await.unwrap();
    kernel
}

#[tokio::test]
async fn test_kernel_creation() {
    let kernel = Kernel::new(Config::default());
    assert_eq!(kernel.state(), KernelState::Created);
    assert_eq!(kernel.agent_count(), 0);
    assert_eq!(kernel.round_count(), 0);
    assert_eq!(kernel.address().name(), Some("hive"));
    assert!(matches!(
        kernel.run_round().await,
        Err(KernelError::NotRunning)
    ));
}

#[tokio::test]
async fn test_round_initializes_then_activates() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let agent = kernel
        .spawn_agent("w", worker(&journal), vec![json!("p")])
        .unwrap();
    assert_eq!(agent.state(), AgentLifeState::Unborn);

    let status = kernel.run_round().await.unwrap();

    assert!(status.is_ok());
    assert_eq!(agent.state(), AgentLifeState::Alive);
    assert_eq!(*journal.lock(), vec![r#"activate ["p"]"#]);
    assert_eq!(kernel.round_count(), 1);
}

#[tokio::test]
async fn test_duplicate_launch_rejected() {
    let kernel = started(Config::default()).await;
    let first = kernel.spawn_agent("a", worker(&Journal::default()), vec![]).unwrap();
    let twin = kernel
        .create_agent("a", worker(&Journal::default()))
        .with_address(first.address().clone());

    let result = kernel.launch_agent(twin, vec![]);
    assert!(matches!(result, Err(KernelError::AlreadyRegistered(_))));
    assert_eq!(kernel.agent_count(), 1);
}

#[tokio::test]
async fn test_post_and_route() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let agent = kernel.spawn_agent("w", worker(&journal), vec![]).unwrap();

    kernel.post(agent.address(), "hello").unwrap();
    kernel.run_round().await.unwrap();

    assert!(journal.lock().contains(&r#"got "hello""#.to_string()));
    assert!(matches!(
        kernel.post(&AgentAddress::new(), "lost"),
        Err(KernelError::AgentNotFound(_))
    ));
}

#[tokio::test]
async fn test_agents_exchange_messages() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let receiver = kernel.spawn_agent("rx", worker(&journal), vec![]).unwrap();
    kernel
        .spawn_agent(
            "tx",
            Worker {
                peer: Some(receiver.address().clone()),
                ..Default::default()
            },
            vec![],
        )
        .unwrap();

    kernel.run_round().await.unwrap();
    kernel.run_round().await.unwrap();
    kernel.run_round().await.unwrap();

    // Depending on address order the receiver sees the first message in
    // round two or three; it always sees at least one.
    assert!(journal.lock().iter().any(|line| line == "got 1"));
}

#[tokio::test]
async fn test_buffered_per_sender_mailbox_from_config() {
    let journal = Journal::default();
    let kernel = started(config_with(
        MailboxKind::BufferedPerSender,
        SignalPolicy::FireSignal,
        0,
    ))
    .await;
    let agent = kernel.spawn_agent("w", worker(&journal), vec![]).unwrap();
    kernel.run_round().await.unwrap();

    kernel.post(agent.address(), 1).unwrap();
    kernel.post(agent.address(), 2).unwrap();
    kernel.run_round().await.unwrap();

    let seen: Vec<_> = journal
        .lock()
        .iter()
        .filter(|l| l.starts_with("got"))
        .cloned()
        .collect();
    assert_eq!(seen, vec!["got 2"]);
}

#[tokio::test]
async fn test_kill_agent_removes_it_next_round() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let mut events = kernel.subscribe();
    let agent = kernel.spawn_agent("w", worker(&journal), vec![]).unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        KernelEvent::AgentLaunched(agent.address().clone())
    );

    assert!(!kernel.kill_agent(agent.address()).unwrap());
    kernel.run_round().await.unwrap();
    assert!(kernel.kill_agent(agent.address()).unwrap());
    assert_eq!(agent.state(), AgentLifeState::Dying);

    kernel.run_round().await.unwrap();

    assert_eq!(agent.state(), AgentLifeState::Died);
    assert_eq!(kernel.agent_count(), 0);
    assert!(kernel.agent(agent.address()).is_none());
    assert_eq!(journal.lock().last().map(String::as_str), Some("end"));
    assert!(matches!(
        kernel.kill_agent(agent.address()),
        Err(KernelError::AgentNotFound(_))
    ));

    let mut removed = false;
    while let Ok(event) = events.try_recv() {
        removed |= event == KernelEvent::AgentRemoved(agent.address().clone());
    }
    assert!(removed);
}

#[tokio::test]
async fn test_kill_fires_signal() {
    let kernel = started(config_with(
        MailboxKind::LinkedList,
        SignalPolicy::StoreInQueue,
        0,
    ))
    .await;
    let agent = kernel.spawn_agent("w", worker(&Journal::default()), vec![]).unwrap();
    kernel.run_round().await.unwrap();

    kernel.kill_agent(agent.address()).unwrap();

    let signal = kernel.signals().get_signal().unwrap();
    assert_eq!(signal.kind(), SignalKind::Kill);
    assert_eq!(signal.source(), Some(agent.address()));
}

#[tokio::test]
async fn test_failing_agent_is_removed() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let faulty = kernel
        .spawn_agent(
            "faulty",
            Worker {
                fail: true,
                ..worker(&journal)
            },
            vec![],
        )
        .unwrap();
    let healthy = kernel.spawn_agent("healthy", worker(&Journal::default()), vec![]).unwrap();

    let status = kernel.run_round().await.unwrap();

    assert!(status.is_failure());
    let worst = status.most_severe().unwrap();
    assert_eq!(worst.provider, faulty.address().to_string());
    assert!(worst.message.as_deref().unwrap().contains("worker crashed"));
    assert_eq!(faulty.state(), AgentLifeState::Died);
    assert_eq!(kernel.agent_addresses(), vec![healthy.address().clone()]);
}

#[tokio::test]
async fn test_remove_agent_is_idempotent() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    let agent = kernel.spawn_agent("w", worker(&journal), vec![]).unwrap();
    kernel.run_round().await.unwrap();

    let first = kernel.remove_agent_from_kernel(agent.as_ref()).await;
    let second = kernel.remove_agent_from_kernel(agent.as_ref()).await;

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(agent.state(), AgentLifeState::Died);
    assert_eq!(journal.lock().iter().filter(|l| *l == "end").count(), 1);
}

#[tokio::test]
async fn test_run_until_population_is_gone() {
    let kernel = started(Config::default()).await;
    kernel
        .spawn_agent(
            "mortal",
            Worker {
                lives_before_death: Some(3),
                ..Default::default()
            },
            vec![],
        )
        .unwrap();

    let rounds = kernel.run().await.unwrap();

    // Three lives, then the round that removes the dying agent.
    assert_eq!(rounds, 4);
    assert_eq!(kernel.agent_count(), 0);
}

#[tokio::test]
async fn test_run_honours_max_rounds() {
    let kernel = started(config_with(MailboxKind::LinkedList, SignalPolicy::FireSignal, 5)).await;
    kernel.spawn_agent("immortal", worker(&Journal::default()), vec![]).unwrap();

    assert_eq!(kernel.run().await.unwrap(), 5);
    assert_eq!(kernel.round_count(), 5);
    assert_eq!(kernel.agent_count(), 1);
}

#[tokio::test]
async fn test_run_stops_on_shutdown_signal() {
    let kernel = started(Config::default()).await;
    kernel
        .spawn_agent(
            "stopper",
            Worker {
                shutdown: Some(kernel.shutdown_signal().clone()),
                ..Default::default()
            },
            vec![],
        )
        .unwrap();

    assert_eq!(kernel.run().await.unwrap(), 1);
}

#[tokio::test]
async fn test_stop_destroys_everyone() {
    let journal = Journal::default();
    let kernel = started(Config::default()).await;
    for name in ["a", "b"] {
        kernel.spawn_agent(name, worker(&journal), vec![]).unwrap();
    }
    kernel.run_round().await.unwrap();

    let status = kernel.stop().await.unwrap();

    assert!(status.is_ok());
    assert_eq!(status.leaves().len(), 2);
    assert_eq!(kernel.state(), KernelState::Stopped);
    assert_eq!(kernel.agent_count(), 0);
    assert_eq!(journal.lock().iter().filter(|l| *l == "end").count(), 2);
    assert!(matches!(
        kernel.spawn_agent("late", worker(&journal), vec![]),
        Err(KernelError::NotRunning)
    ));
    assert!(matches!(kernel.stop().await, Err(KernelError::NotRunning)));
}

struct Ear;

impl SignalListener for Ear {
    fn supported_signal_type(&self) -> SignalKind {
        SignalKind::Application
    }

    fn on_signal(&self, _signal: &Signal) {}
}

#[tokio::test]
async fn test_stop_detaches_uninitialized_agents_from_signal_tree() {
    let kernel = started(Config::default()).await;
    let agent = kernel.spawn_agent("w", worker(&Journal::default()), vec![]).unwrap();
    agent.signals().add_signal_listener(Arc::new(Ear));
    assert_eq!(kernel.signals().listener_count(), 1);

    kernel.stop().await.unwrap();

    assert_eq!(agent.state(), AgentLifeState::Unborn);
    assert_eq!(kernel.signals().listener_count(), 0);
    assert!(agent.signals().parent().is_none());
    assert_eq!(agent.signals().listener_count(), 0);
}

#[tokio::test]
async fn test_agent_signal_scope_is_child_of_kernel() {
    let kernel = started(config_with(
        MailboxKind::LinkedList,
        SignalPolicy::StoreInQueue,
        0,
    ))
    .await;
    let agent = kernel.spawn_agent("w", worker(&Journal::default()), vec![]).unwrap();

    let parent = agent.signals().parent().unwrap();
    assert!(Arc::ptr_eq(&parent, kernel.signals()));
    assert_eq!(agent.signals().policy(), SignalPolicy::StoreInQueue);

    agent.fire_signal(Signal::named(SignalKind::Application, "hello"));
    assert_eq!(kernel.signals().get_signal().unwrap().name(), "hello");
}
