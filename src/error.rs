//! Unified error types for the stomplight controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level tick loop's error handling uniform. Pin and command errors carry
//! enough context to name the offending pin and owner in the log without a
//! backtrace.

use std::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pin ownership violation, fatal at construction time.
    Pin(PinError),
    /// An external line-tool invocation failed.
    Command(CommandError),
    /// Diagnostic export could not be written (best-effort at shutdown).
    Export(String),
    /// Configuration is invalid or could not be loaded.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "pin: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Export(msg) => write!(f, "export: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Pin errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// A BCM pin was claimed twice. Startup must abort rather than run with
    /// ambiguous ownership.
    Conflict {
        pin: u8,
        first_owner: String,
        second_owner: String,
    },
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict {
                pin,
                first_owner,
                second_owner,
            } => write!(
                f,
                "BCM pin {pin} already claimed by '{first_owner}', refused for '{second_owner}'"
            ),
        }
    }
}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Self::Pin(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The program could not be launched at all.
    Launch { program: String, reason: String },
    /// The program ran but exited non-zero.
    NonZeroExit { program: String, code: Option<i32> },
    /// A held process could not be stopped cleanly.
    StopFailed { program: String, reason: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch { program, reason } => {
                write!(f, "failed to launch '{program}': {reason}")
            }
            Self::NonZeroExit { program, code } => match code {
                Some(c) => write!(f, "'{program}' exited with status {c}"),
                None => write!(f, "'{program}' terminated by signal"),
            },
            Self::StopFailed { program, reason } => {
                write!(f, "failed to stop held '{program}': {reason}")
            }
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_both_owners() {
        let e = Error::from(PinError::Conflict {
            pin: 16,
            first_owner: "t1-button".into(),
            second_owner: "t2-button".into(),
        });
        let msg = e.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("t1-button"));
        assert!(msg.contains("t2-button"));
    }

    #[test]
    fn command_display_covers_signal_exit() {
        let e = CommandError::NonZeroExit {
            program: "gpioget".into(),
            code: None,
        };
        assert!(e.to_string().contains("signal"));
    }
}
