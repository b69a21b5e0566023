use std::fmt::Write;
use std::time::Duration;

use thiserror::Error;

/// Why a probe did not reach its endpoint, one variant per failure stage.
/// The `Display` output is the `error_message` reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// The connect was refused, unreachable or timed out; carries the OS error code.
    #[error("Connection failed (code: {0})")]
    Refused(i32),

    /// The connect failed with an error that has no OS error code.
    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Test failed: {0}")]
    Unexpected(String),
}

impl ProbeFailure {
    /// Whether DNS had already succeeded when this failure happened.
    pub fn keeps_address(&self) -> bool {
        matches!(self, ProbeFailure::Refused(_) | ProbeFailure::Transport(_))
    }
}

/// Failure to turn a hostname into an address.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0}")]
    System(#[from] std::io::Error),

    #[error("{0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("no addresses found for {0}")]
    NoAddress(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Renders an error together with its chain of sources on a single line.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
