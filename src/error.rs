//! Unified error types for the bridge.
//!
//! Follows the same shape the bridge inherited from embedded control-loop
//! firmware: a single `Error` enum that every subsystem funnels into,
//! keeping callers' error handling uniform. None of
//! these are used as unwind-based control flow — each call site decides
//! locally between ignore / skip-this-frame / reset-this-output; `Error`
//! only carries the ones worth surfacing to a caller (config, bind, port
//! lifecycle).

use std::fmt;

/// Every fallible startup or per-output operation funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(String),
    /// TCP listener could not be bound.
    Bind(std::io::Error),
    /// A serial port could not be opened.
    PortOpen(serialport::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Bind(e) => write!(f, "bind: {e}"),
            Self::PortOpen(e) => write!(f, "port open: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Self::PortOpen(e)
    }
}

/// Bridge-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
