//! Common infrastructure for the tunnelmgr workspace.
//!
//! This crate provides the pieces shared by everything that touches the
//! host's networking state:
//!
//! - [`shell`]: safe shell command execution with proper quoting
//! - [`error`]: the error types for tunnel operations
//!
//! The tunnel lifecycle logic itself lives in the `tunnelmgr` crate; this
//! crate deliberately knows nothing about encapsulations, only about running
//! commands and describing failures.

pub mod error;
pub mod shell;

// Re-export commonly used items at crate root
pub use error::{TunnelMgrError, TunnelMgrResult};
