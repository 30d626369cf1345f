//! Hive - multiagent execution kernel
//!
//! Command line host: loads configuration, sets up logging and drives a demo
//! population of agents through the kernel.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hive_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use hive_core::{Agent, AgentBehavior, Kernel};
use hive_protocols::{
    AgentAddress, AgentError, AgentHandle, Signal, SignalKind, SignalListener, Status,
};

/// Hive CLI.
#[derive(Parser)]
#[command(name = "hive")]
#[command(about = "Multiagent execution kernel")]
#[command(version)]
struct Cli {
    /// Configuration file path (missing file = defaults)
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a ring of ping agents (default)
    Run {
        /// Number of agents in the ring
        #[arg(long, default_value_t = 3)]
        agents: usize,

        /// Stop after this many rounds (overrides kernel.max_rounds)
        #[arg(long)]
        rounds: Option<u64>,

        /// Hops before the ping stops travelling
        #[arg(long, default_value_t = 10)]
        hops: u64,
    },

    /// Load and validate the configuration file
    CheckConfig,
}

/// Passes a ping to the next agent of the ring until it has travelled enough.
struct Ping {
    index: usize,
    ring: Arc<Vec<AgentAddress>>,
    max_hops: u64,
    received: usize,
}

impl Ping {
    fn next(&self) -> &AgentAddress {
        &self.ring[(self.index + 1) % self.ring.len()]
    }
}

#[async_trait]
impl AgentBehavior for Ping {
    async fn activate(
        &mut self,
        agent: &Agent,
        _parameters: &[Value],
    ) -> Result<Status, AgentError> {
        if self.index == 0 {
            agent.send_message(self.next(), json!({ "hop": 0 }))?;
        }
        Ok(Status::ok(agent.address().to_string()))
    }

    async fn live(&mut self, agent: &Agent) -> Result<Status, AgentError> {
        while let Some(message) = agent.get_message() {
            if message.payload()["stop"].as_bool() == Some(true) {
                agent.kill_me();
                break;
            }
            self.received += 1;
            let hop = message.payload()["hop"]
                .as_u64()
                .ok_or_else(|| AgentError::ExecutionFailed("ping without hop".into()))?;
            agent.fire_signal(Signal::named(SignalKind::Application, "ping").with_payload(hop));
            if hop + 1 < self.max_hops {
                agent.send_message(self.next(), json!({ "hop": hop + 1 }))?;
                continue;
            }
            info!("Ping stopped at {} after {} hops", agent.address(), hop + 1);
            for peer in self.ring.iter().filter(|peer| *peer != agent.address()) {
                agent.send_message(peer, json!({ "stop": true }))?;
            }
            agent.kill_me();
            break;
        }
        Ok(Status::ok(agent.address().to_string()))
    }

    async fn end(&mut self, agent: &Agent) -> Result<Status, AgentError> {
        info!("{} received {} pings", agent.address(), self.received);
        Ok(Status::ok(agent.address().to_string()))
    }
}

/// Counts signals reaching the root of the signal tree.
#[derive(Default)]
struct SignalCounter {
    seen: AtomicUsize,
}

impl SignalListener for SignalCounter {
    fn supported_signal_type(&self) -> SignalKind {
        SignalKind::Any
    }

    fn on_signal(&self, _signal: &Signal) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }
}

/// Initialize tracing with console output and optional rolling file output.
///
/// The returned guard must live as long as logging is needed.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let (file_writer, guard) = if logging.directory.is_empty() {
        (None, None)
    } else {
        std::fs::create_dir_all(&logging.directory)
            .with_context(|| format!("creating log directory {}", logging.directory))?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("hive")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&logging.directory)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(logging.json.then(|| fmt::layer().json()))
        .with((!logging.json).then(|| fmt::layer().with_target(true)))
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .init();

    Ok(guard)
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    ConfigLoader::load_or_default(path)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run {
        agents: 3,
        rounds: None,
        hops: 10,
    }) {
        Commands::CheckConfig => check_config(&cli.config, &config),
        Commands::Run {
            agents,
            rounds,
            hops,
        } => {
            let _guard = init_tracing(&config.logging)?;
            run(config, agents, rounds, hops).await
        }
    }
}

fn check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    if !result.is_valid() {
        bail!("{} is invalid ({} errors)", path.display(), result.errors.len());
    }
    println!("{} is valid", path.display());
    Ok(())
}

async fn run(
    mut config: Config,
    agents: usize,
    rounds: Option<u64>,
    hops: u64,
) -> anyhow::Result<()> {
    if agents == 0 {
        bail!("at least one agent is needed");
    }
    if let Some(rounds) = rounds {
        config.kernel.max_rounds = rounds;
    }
    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        bail!("invalid configuration, run `hive check-config` for details");
    }

    info!("Starting hive v{}", env!("CARGO_PKG_VERSION"));
    let kernel = Kernel::new(config);
    let counter = Arc::new(SignalCounter::default());
    kernel.signals().add_signal_listener(counter.clone());
    kernel.start().await?;

    let ring: Arc<Vec<AgentAddress>> = Arc::new(
        (0..agents)
            .map(|i| AgentAddress::named(format!("ping-{i}")))
            .collect(),
    );
    for (index, address) in ring.iter().enumerate() {
        let behavior = Ping {
            index,
            ring: ring.clone(),
            max_hops: hops,
            received: 0,
        };
        let name = address.name().unwrap_or("ping").to_string();
        let agent = kernel.create_agent(name, behavior).with_address(address.clone());
        kernel.launch_agent(agent, Vec::new())?;
    }

    let shutdown = kernel.shutdown_signal().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    let executed = kernel.run().await?;
    let remaining = kernel.agent_count();
    let status = kernel.stop().await?;

    println!("rounds:  {}", executed);
    println!("signals: {}", counter.seen.load(Ordering::Relaxed));
    println!("agents still alive at stop: {}", remaining);
    println!("final:   {}", status);
    Ok(())
}
