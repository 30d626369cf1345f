//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use hive_protocols::{MailboxKind, SignalPolicy};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kernel: KernelConfig,

    #[serde(default)]
    pub activator: ActivatorConfig,

    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub signal: SignalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Kernel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Kernel name, used as the provider of round statuses.
    #[serde(default = "default_kernel_name")]
    pub name: String,

    /// Pause between two rounds when running continuously.
    #[serde(default)]
    pub round_interval_ms: u64,

    /// Stop after this many rounds (0 = until no agent remains).
    #[serde(default)]
    pub max_rounds: u64,

    /// Per-hook timeout while stopping the kernel lifecycle.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: default_kernel_name(),
            round_interval_ms: 0,
            max_rounds: 0,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl KernelConfig {
    pub fn round_interval(&self) -> Duration {
        Duration::from_millis(self.round_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_kernel_name() -> String {
    "hive".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Agent activator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivatorConfig {
    /// Yield to the runtime after each agent of a behaviour phase.
    #[serde(default = "default_true")]
    pub yield_between_agents: bool,
}

impl Default for ActivatorConfig {
    fn default() -> Self {
        Self {
            yield_between_agents: true,
        }
    }
}

/// Mailbox configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Mailbox implementation given to every launched agent.
    #[serde(default)]
    pub kind: MailboxKind,
}

/// Signal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Policy of the kernel's root signal manager.
    #[serde(default)]
    pub policy: SignalPolicy,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily rolling log files (empty = stdout only).
    #[serde(default)]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: String::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
