//! Error types of the navigation stack.
//!
//! The control core itself never fails: missing data withholds commands and invalid range
//! readings are replaced by sentinels. Errors only surface at the edges, i.e. when validating
//! configuration, when a transport collaborator goes away or when wiring process signals.

use thiserror::Error;

/// Navigation error type
#[derive(Error, Debug)]
pub enum NavError {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The peer of a sensor or actuation channel has been dropped.
    #[error("{0} port closed")]
    PortClosed(&'static str),

    /// The Ctrl-C handler could not be installed.
    #[error("failed to install Ctrl-C handler: {0}")]
    CtrlC(#[from] ctrlc::Error),
}

/// Result alias using [NavError].
pub type Result<T> = std::result::Result<T, NavError>;
