use automa::{BuildError, ProtocolError, RunError};
use thiserror::Error;

/// Everything that can stop a login flow before it reaches a verdict.
#[derive(Debug, Error)]
pub enum LoginError {
    /// An automaton definition was malformed.
    #[error("invalid automaton: {0}")]
    Build(#[from] BuildError),

    /// The protocol was driven out of order.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A finished run was stepped again.
    #[error(transparent)]
    Run(#[from] RunError),

    /// Reading the answers or writing the prompts failed.
    #[error("console: {0}")]
    Io(#[from] std::io::Error),

    /// Input ended while a prompt was waiting.
    #[error("input closed while waiting for {0}")]
    InputClosed(&'static str),

    /// The flow name on the command line is not one of ours.
    #[error("unknown flow '{0}', expected one of: dfa, nfa, literal")]
    UnknownFlow(String),

    /// The retry budget on the command line is not a number.
    #[error("invalid attempt count '{0}'")]
    InvalidAttempts(String),
}
