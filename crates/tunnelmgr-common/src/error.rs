//! Error types for tunnel operations.
//!
//! All fallible operations in the workspace return [`TunnelMgrResult`]; the
//! CLI boundary is the only place errors are converted into a log line and a
//! process exit code.

use std::io;
use thiserror::Error;

/// Result type alias for tunnel operations.
pub type TunnelMgrResult<T> = Result<T, TunnelMgrError>;

/// Errors that can occur while managing tunnel interfaces.
#[derive(Debug, Error)]
pub enum TunnelMgrError {
    /// Failed to spawn a shell command.
    #[error("failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that could not be spawned.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned a non-zero exit code.
    #[error("shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// A tunnel lifecycle command failed; wraps the shell failure together
    /// with the parameters identifying the operation.
    #[error("failed to {operation} tunnel interface {ifname} (vni {vni}): {source}")]
    TunnelCommand {
        /// The step that failed ("add", "bring up", "attach", "detach", "delete").
        operation: String,
        /// The kernel interface name the step targeted.
        ifname: String,
        /// The VNI the step targeted.
        vni: u32,
        /// The underlying shell failure.
        #[source]
        source: Box<TunnelMgrError>,
    },

    /// Every connectivity probe attempt was exhausted without a successful
    /// connect.
    #[error(
        "no connectivity to {tunnel_type} vni {vni} at {dst_host}:{port} \
         from {src_host} after {attempts} attempt(s)"
    )]
    ConnectivityFailed {
        /// The encapsulation being probed.
        tunnel_type: String,
        /// The VNI being probed.
        vni: u32,
        /// Local endpoint address.
        src_host: String,
        /// Remote endpoint address.
        dst_host: String,
        /// The probed TCP port.
        port: u16,
        /// How many connection attempts were made.
        attempts: u32,
    },

    /// The output formatter received an identifier outside its recognized set.
    #[error("unsupported output format '{format}'")]
    UnsupportedFormat {
        /// The rejected identifier.
        format: String,
    },

    /// The tunnel factory was asked for an encapsulation it does not know.
    #[error("unsupported tunnel type '{tunnel_type}'")]
    UnsupportedTunnelType {
        /// The rejected identifier.
        tunnel_type: String,
    },

    /// Configuration validation error.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl TunnelMgrError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps a shell failure with the identifying parameters of the tunnel
    /// operation that issued it.
    pub fn tunnel_command(
        operation: impl Into<String>,
        ifname: impl Into<String>,
        vni: u32,
        source: TunnelMgrError,
    ) -> Self {
        Self::TunnelCommand {
            operation: operation.into(),
            ifname: ifname.into(),
            vni,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_command_failed_display() {
        let err = TunnelMgrError::ShellCommandFailed {
            command: "/sbin/ip link del vxlan1001".to_string(),
            exit_code: 2,
            output: "Cannot find device \"vxlan1001\"".to_string(),
        };
        assert!(err.to_string().contains("ip link del vxlan1001"));
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_tunnel_command_wraps_source() {
        let inner = TunnelMgrError::ShellCommandFailed {
            command: "/sbin/ip link add vxlan1001 type vxlan".to_string(),
            exit_code: 2,
            output: "File exists".to_string(),
        };
        let err = TunnelMgrError::tunnel_command("add", "vxlan1001", 1001, inner);
        let msg = err.to_string();
        assert!(msg.contains("failed to add tunnel interface vxlan1001"));
        assert!(msg.contains("vni 1001"));
        assert!(msg.contains("File exists"));
    }

    #[test]
    fn test_connectivity_failed_display() {
        let err = TunnelMgrError::ConnectivityFailed {
            tunnel_type: "geneve".to_string(),
            vni: 42,
            src_host: "10.0.0.1".to_string(),
            dst_host: "10.0.0.2".to_string(),
            port: 6081,
            attempts: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("geneve vni 42"));
        assert!(msg.contains("10.0.0.2:6081"));
        assert!(msg.contains("3 attempt(s)"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = TunnelMgrError::invalid_config("vni", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration for vni: must be positive"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = TunnelMgrError::UnsupportedFormat {
            format: "toml".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported output format 'toml'");
    }
}
