//! Error taxonomy and the caller-supplied diagnostic handlers.
//!
//! Every fatal condition the engine can hit is one variant of [`LilacError`].
//! Handlers are stored in a [`Diagnostics`] value at `init` and consulted by
//! every other component; nothing in `lilac-core` calls `panic!` or
//! `std::process::exit` directly outside of [`Diagnostics::default`].

use std::fmt;

use lilac_fixed::VecFixed;

use crate::engine::EngineState;

/// Number of recent warning messages kept for inspection.
const WARNING_HISTORY: usize = 16;

/// The taxonomy from the error-handling design: each variant is a *kind*,
/// not a one-off message.
#[derive(Debug, thiserror::Error)]
pub enum LilacError {
    /// Operation invoked in a state that disallows it.
    #[error("operation `{operation}` is not valid in state {state:?}")]
    StateMisuse {
        operation: &'static str,
        state: EngineState,
    },

    /// Out-of-range dimension, non-finite coordinate, non-positive radius, etc.
    #[error("parameter `{parameter}` out of domain: {detail}")]
    ParameterDomain {
        parameter: &'static str,
        detail: String,
    },

    /// Intersection buffer ceiling exceeded, or a signed accumulator overflowed.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),

    /// Intersection math produced a non-finite result with no defined clamp.
    #[error("numeric anomaly: {0}")]
    NumericAnomaly(String),

    /// Allocation, temporary-file, or sink I/O failure.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Gamma table failed its post-initialization self-check.
    #[error("gamma table integrity check failed: {0}")]
    GammaIntegrity(String),
}

impl LilacError {
    pub(crate) fn state_misuse(operation: &'static str, state: EngineState) -> Self {
        Self::StateMisuse { operation, state }
    }

    pub(crate) fn parameter_domain(parameter: &'static str, detail: impl Into<String>) -> Self {
        Self::ParameterDomain {
            parameter,
            detail: detail.into(),
        }
    }
}

/// Called for every fatal [`LilacError`]. Required not to return: the `!`
/// return type makes that a compiler-checked property rather than a
/// documented convention.
pub type ErrorHandler = Box<dyn FnMut(&LilacError) -> !>;

/// Called for non-fatal diagnostics. Allowed to return; the engine proceeds.
pub type WarningHandler = Box<dyn FnMut(&str)>;

/// The default error handler: logs via `tracing` and terminates the process.
fn default_error_handler(err: &LilacError) -> ! {
    tracing::error!(%err, "lilac: fatal error");
    std::process::exit(1)
}

/// The default warning handler: logs via `tracing` and returns.
fn default_warning_handler(message: &str) {
    tracing::warn!(message);
}

/// Owns the caller-supplied handlers plus a bounded history of recent
/// warnings, independent of whichever handler is installed.
pub struct Diagnostics {
    on_error: ErrorHandler,
    on_warning: WarningHandler,
    recent_warnings: VecFixed<WARNING_HISTORY, String>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("recent_warnings", &self.recent_warnings.join(" | "))
            .finish_non_exhaustive()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            on_error: Box::new(default_error_handler),
            on_warning: Box::new(default_warning_handler),
            recent_warnings: VecFixed::new(),
        }
    }
}

impl Diagnostics {
    #[must_use]
    pub fn new(on_error: Option<ErrorHandler>, on_warning: Option<WarningHandler>) -> Self {
        let default = Self::default();
        Self {
            on_error: on_error.unwrap_or(default.on_error),
            on_warning: on_warning.unwrap_or(default.on_warning),
            recent_warnings: VecFixed::new(),
        }
    }

    /// Routes a fatal error through the configured handler. Never returns.
    pub fn fatal(&mut self, err: LilacError) -> ! {
        (self.on_error)(&err)
    }

    /// Routes a non-fatal warning through the configured handler and keeps
    /// it in the recent-warning history.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        (self.on_warning)(&message);
        self.recent_warnings.push(message);
    }

    /// The most recently emitted warnings, oldest first, joined for display.
    #[must_use]
    pub fn recent_warnings(&self) -> String {
        self.recent_warnings.join("\n")
    }
}
