//! Shell command execution for tunnel operations.
//!
//! Every interaction with the host's networking tools flows through this
//! module: callers build command strings (see the `commands` module of the
//! `tunnelmgr` crate), quote caller-supplied values with [`shellquote`], and
//! execute through `/bin/sh -c`, getting back a uniform (stdout, exit status)
//! surface.
//!
//! # Example
//!
//! ```ignore
//! use tunnelmgr_common::shell::{self, IP_CMD, shellquote};
//!
//! let bridge = "br0";
//! let cmd = format!("{} link set vxlan1001 master {}", IP_CMD, shellquote(bridge));
//! shell::exec_or_throw(&cmd).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{TunnelMgrError, TunnelMgrResult};

/// Path to the `ip` command for link and bridge-port configuration.
pub const IP_CMD: &str = "/sbin/ip";

/// Path to the legacy `brctl` bridge control command.
pub const BRCTL_CMD: &str = "/sbin/brctl";

/// Characters that need escaping inside shell double-quotes:
/// $, `, ", \, and newline.
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("invalid shell escape pattern"));

/// Quotes a string for safe interpolation into a shell command.
///
/// The string is wrapped in double quotes and any character with special
/// meaning inside double quotes is backslash-escaped, so a hostile value
/// (e.g. a bridge name of `br0; rm -rf /`) stays a single argument.
///
/// # Example
///
/// ```
/// use tunnelmgr_common::shell::shellquote;
///
/// assert_eq!(shellquote("br0"), "\"br0\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// Captured stdout, trimmed.
    pub stdout: String,
    /// Captured stderr, trimmed.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously.
///
/// Runs the command through `/bin/sh -c` and captures its output. A non-zero
/// exit code is reported in the returned [`ExecResult`], not as an error;
/// only a failure to spawn the shell at all produces `Err`.
pub async fn exec(cmd: &str) -> TunnelMgrResult<ExecResult> {
    tracing::debug!(command = %cmd, "executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| TunnelMgrError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let result = ExecResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };

    if result.success() {
        tracing::trace!(command = %cmd, "command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = result.exit_code,
            stderr = %result.stderr,
            "command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command, converting a non-zero exit into a typed error.
///
/// Returns the captured stdout on success.
pub async fn exec_or_throw(cmd: &str) -> TunnelMgrResult<String> {
    let result = exec(cmd).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(TunnelMgrError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}

/// Returns true if the given tool is installed and executable.
///
/// Used as a preflight before operations that depend on an optional tool
/// (the `brctl` bridge backend).
pub async fn tool_exists(tool: &str) -> bool {
    match exec(&format!("command -v {}", shellquote(tool))).await {
        Ok(result) => result.success(),
        Err(_) => false,
    }
}
