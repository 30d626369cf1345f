//! Composable operation outcomes.
//!
//! A [`Status`] is either a single outcome or a packed batch of outcomes.
//! Batches are built with [`MultipleStatus`] and sealed with
//! [`MultipleStatus::pack`], which keeps every entry for inspection while
//! exposing the most severe one as the batch's own severity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of an outcome, ordered from harmless to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatusSeverity {
    #[default]
    Ok,
    Warning,
    Failure,
    /// A hook returned an error value.
    Exception,
}

impl fmt::Display for StatusSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusSeverity::Ok => write!(f, "ok"),
            StatusSeverity::Warning => write!(f, "warning"),
            StatusSeverity::Failure => write!(f, "failure"),
            StatusSeverity::Exception => write!(f, "exception"),
        }
    }
}

/// Machine readable reason attached to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    #[default]
    Ok,
    /// An agent hook returned an error.
    AgentFailure,
    /// Agent found unborn or born while running its behaviour.
    UnexpectedAgentStateDuringActivation,
    /// Agent found breaking down or dead while running its behaviour.
    UnexpectedAgentStateDuringDestruction,
    /// The agent has no reachable kernel to be removed from.
    NoKernelAgent,
    AgentNotFound,
    Other,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusCode::Ok => "ok",
            StatusCode::AgentFailure => "agent failure",
            StatusCode::UnexpectedAgentStateDuringActivation => {
                "unexpected agent state during activation"
            }
            StatusCode::UnexpectedAgentStateDuringDestruction => {
                "unexpected agent state during destruction"
            }
            StatusCode::NoKernelAgent => "no kernel agent",
            StatusCode::AgentNotFound => "agent not found",
            StatusCode::Other => "other",
        };
        f.write_str(text)
    }
}

/// One outcome, tagged with the identity that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleStatus {
    pub severity: StatusSeverity,
    pub provider: String,
    pub code: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl fmt::Display for SingleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.provider, self.code)?;
        if let Some(message) = &self.message {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

/// A sealed batch of outcomes.
///
/// Only built by [`MultipleStatus::pack`], so it always holds at least two
/// entries unless it was deserialized from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedStatus {
    pub provider: String,
    pub entries: Vec<Status>,
}

/// Outcome of an operation or of a batch of operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Status {
    Single(SingleStatus),
    Packed(PackedStatus),
}

impl Status {
    /// Successful outcome.
    pub fn ok(provider: impl Into<String>) -> Self {
        Self::single(StatusSeverity::Ok, provider, StatusCode::Ok, None)
    }

    /// Warning outcome.
    pub fn warning(provider: impl Into<String>, code: StatusCode) -> Self {
        Self::single(StatusSeverity::Warning, provider, code, None)
    }

    /// Failure outcome.
    pub fn failure(provider: impl Into<String>, code: StatusCode) -> Self {
        Self::single(StatusSeverity::Failure, provider, code, None)
    }

    /// Outcome wrapping an error value returned by a hook.
    pub fn exception(provider: impl Into<String>, error: &dyn std::error::Error) -> Self {
        Self::single(
            StatusSeverity::Exception,
            provider,
            StatusCode::AgentFailure,
            Some(error.to_string()),
        )
    }

    /// Build a single outcome from its parts.
    pub fn single(
        severity: StatusSeverity,
        provider: impl Into<String>,
        code: StatusCode,
        message: Option<String>,
    ) -> Self {
        Status::Single(SingleStatus {
            severity,
            provider: provider.into(),
            code,
            message,
        })
    }

    /// Attach a human readable message (single outcomes only).
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Status::Single(single) = &mut self {
            single.message = Some(message.into());
        }
        self
    }

    /// Severity of this outcome; for a batch, the worst contained severity.
    pub fn severity(&self) -> StatusSeverity {
        match self {
            Status::Single(single) => single.severity,
            Status::Packed(packed) => packed
                .entries
                .iter()
                .map(Status::severity)
                .max()
                .unwrap_or_default(),
        }
    }

    /// Identity that produced this outcome.
    pub fn provider(&self) -> &str {
        match self {
            Status::Single(single) => &single.provider,
            Status::Packed(packed) => &packed.provider,
        }
    }

    /// Reason code; for a batch, the code of the most severe entry.
    pub fn code(&self) -> StatusCode {
        self.most_severe().map(|s| s.code).unwrap_or_default()
    }

    pub fn is_ok(&self) -> bool {
        self.severity() == StatusSeverity::Ok
    }

    /// True when nothing worse than a warning happened.
    pub fn is_success(&self) -> bool {
        self.severity() <= StatusSeverity::Warning
    }

    pub fn is_failure(&self) -> bool {
        self.severity() >= StatusSeverity::Failure
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, Status::Packed(_))
    }

    /// Every single outcome, depth first, in insertion order.
    pub fn leaves(&self) -> Vec<&SingleStatus> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a SingleStatus>) {
        match self {
            Status::Single(single) => out.push(single),
            Status::Packed(packed) => {
                for entry in &packed.entries {
                    entry.collect_leaves(out);
                }
            }
        }
    }

    /// The first single outcome carrying the worst severity.
    pub fn most_severe(&self) -> Option<&SingleStatus> {
        let mut worst: Option<&SingleStatus> = None;
        for leaf in self.leaves() {
            if worst.is_none_or(|w| leaf.severity > w.severity) {
                worst = Some(leaf);
            }
        }
        worst
    }

    /// Single outcomes produced by the given identity.
    pub fn entries_for(&self, provider: &str) -> Vec<&SingleStatus> {
        self.leaves()
            .into_iter()
            .filter(|s| s.provider == provider)
            .collect()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Single(single) => single.fmt(f),
            Status::Packed(packed) => {
                write!(
                    f,
                    "[{}] {}: {} outcomes",
                    self.severity(),
                    packed.provider,
                    packed.entries.len()
                )?;
                if let Some(worst) = self.most_severe() {
                    if worst.severity > StatusSeverity::Ok {
                        write!(f, ", worst {}", worst)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Accumulator for the outcomes of a batch.
#[derive(Debug, Clone, Default)]
pub struct MultipleStatus {
    entries: Vec<Status>,
}

impl MultipleStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_status(&mut self, status: Status) {
        self.entries.push(status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Worst severity accumulated so far.
    pub fn severity(&self) -> StatusSeverity {
        self.entries
            .iter()
            .map(Status::severity)
            .max()
            .unwrap_or_default()
    }

    /// Seal the batch.
    ///
    /// An empty batch becomes an OK outcome for `provider`, a batch of one
    /// becomes that entry, anything larger is kept whole as a packed status.
    pub fn pack(mut self, provider: impl Into<String>) -> Status {
        match self.entries.len() {
            0 => Status::ok(provider),
            1 => self.entries.remove(0),
            _ => Status::Packed(PackedStatus {
                provider: provider.into(),
                entries: self.entries,
            }),
        }
    }
}

impl Extend<Status> for MultipleStatus {
    fn extend<I: IntoIterator<Item = Status>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<Status> for MultipleStatus {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
