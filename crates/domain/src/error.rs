//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`LightsrvError`] via `#[from]` / `From` at the port boundary.

use crate::channel::ChannelKind;

/// Top-level error returned by every controller and engine operation.
#[derive(Debug, thiserror::Error)]
pub enum LightsrvError {
    /// A channel or PWM index beyond the configured count.
    #[error("index out of range")]
    IndexOutOfRange(#[from] IndexOutOfRange),

    /// A value or configuration failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Automation was requested on a deployment without automation wiring.
    #[error("automation is not supported by this deployment")]
    AutomationUnsupported,

    /// The peripheral backend failed (initialisation, read, or write).
    #[error("hardware error")]
    Hardware(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A channel index that does not address a configured channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} index {index} out of range (count {count})")]
pub struct IndexOutOfRange {
    pub kind: ChannelKind,
    pub index: usize,
    pub count: usize,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A time-of-day literal could not be parsed as `HH:MM:SS`.
    #[error("malformed time-of-day literal {0:?}, expected HH:MM:SS")]
    MalformedScheduleLiteral(String),

    /// An interval whose end is not after its start.
    #[error("interval {start}..{end} is empty")]
    EmptyInterval { start: String, end: String },

    /// The dark-period boundaries are not in ascending order.
    #[error("dark period boundaries must be ascending")]
    DarkPeriodOrder,

    /// A PWM duty outside `0..=100` percent.
    #[error("duty {0}% is outside 0..=100")]
    PercentOutOfRange(u32),

    /// A periodic interval of zero seconds.
    #[error("interval must be non-zero")]
    ZeroInterval,

    /// The same physical pin listed twice.
    #[error("pin {0} is configured more than once")]
    DuplicatePin(u8),

    /// The automation channel map references a channel that does not exist.
    #[error("automation role {role} references {kind} {index}, but only {count} configured")]
    ChannelReference {
        role: &'static str,
        kind: ChannelKind,
        index: usize,
        count: usize,
    },
}
