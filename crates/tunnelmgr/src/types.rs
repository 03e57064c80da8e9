//! Type definitions for tunnel lifecycle management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tunnelmgr_common::{TunnelMgrError, TunnelMgrResult};

/// IANA well-known UDP port for VXLAN.
pub const VXLAN_DEFAULT_PORT: u16 = 4789;

/// IANA well-known UDP port for Geneve.
pub const GENEVE_DEFAULT_PORT: u16 = 6081;

/// Largest valid VNI (the identifier is 24 bits on the wire).
pub const VNI_MAX: u32 = 16_777_215;

/// Default connectivity probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

/// Default number of connectivity probe attempts.
pub const DEFAULT_PROBE_RETRIES: u32 = 3;

/// Field selector value meaning "every field".
pub const FIELDS_ALL: &str = "all";

/// Ordered field/value rows handed to the output formatter.
pub type FieldValues = Vec<(String, String)>;

/// Tunnel encapsulation identity.
///
/// The canonical name doubles as the kernel `type` keyword and the
/// interface-name prefix (`vxlan1001`, `geneve42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TunnelKind {
    /// VXLAN encapsulation (RFC 7348).
    Vxlan,
    /// Geneve encapsulation (RFC 8926).
    Geneve,
}

impl TunnelKind {
    /// Canonical lowercase name, as used by `ip link` and in interface names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TunnelKind::Vxlan => "vxlan",
            TunnelKind::Geneve => "geneve",
        }
    }

    /// Well-known UDP port used when the caller supplies none.
    pub fn default_port(&self) -> u16 {
        match self {
            TunnelKind::Vxlan => VXLAN_DEFAULT_PORT,
            TunnelKind::Geneve => GENEVE_DEFAULT_PORT,
        }
    }

    /// Kernel interface name for a VNI: `<prefix><vni>`, no separator,
    /// decimal with no leading zeros.
    pub fn ifname(&self, vni: u32) -> String {
        format!("{}{}", self.as_str(), vni)
    }
}

impl fmt::Display for TunnelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TunnelKind {
    type Err = TunnelMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vxlan" => Ok(TunnelKind::Vxlan),
            "geneve" => Ok(TunnelKind::Geneve),
            other => Err(TunnelMgrError::UnsupportedTunnelType {
                tunnel_type: other.to_string(),
            }),
        }
    }
}

/// Mechanism used to detach a tunnel interface from its bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeTool {
    /// `ip link set <ifname> nomaster`
    Ip,
    /// `brctl delif <bridge> <ifname>`
    Brctl,
}

impl BridgeTool {
    /// Tool name as given on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeTool::Ip => "ip",
            BridgeTool::Brctl => "brctl",
        }
    }
}

impl FromStr for BridgeTool {
    type Err = TunnelMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip" => Ok(BridgeTool::Ip),
            "brctl" => Ok(BridgeTool::Brctl),
            other => Err(TunnelMgrError::invalid_config(
                "bridge-tool",
                format!("unknown bridge tool '{other}' (expected 'ip' or 'brctl')"),
            )),
        }
    }
}

/// Parameters for one tunnel interface creation.
///
/// Exists only for the duration of a single call; nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelSpec {
    /// Virtual network identifier (24-bit, positive).
    pub vni: u32,
    /// Local endpoint address.
    pub src_host: String,
    /// Remote endpoint address.
    pub dst_host: String,
    /// Bridge the interface is attached to.
    pub bridge_name: String,
    /// Source UDP port. Accepted for CLI symmetry; no constructed command
    /// consumes it.
    pub src_port: Option<u16>,
    /// Destination UDP port; the encapsulation's well-known port when unset.
    pub dst_port: Option<u16>,
    /// Optional parent device for the tunnel interface.
    pub dev: Option<String>,
}

impl TunnelSpec {
    /// Creates a spec with the required fields; ports and device unset.
    pub fn new(
        vni: u32,
        src_host: impl Into<String>,
        dst_host: impl Into<String>,
        bridge_name: impl Into<String>,
    ) -> Self {
        Self {
            vni,
            src_host: src_host.into(),
            dst_host: dst_host.into(),
            bridge_name: bridge_name.into(),
            src_port: None,
            dst_port: None,
            dev: None,
        }
    }

    /// Sets the UDP ports (builder pattern).
    pub fn with_ports(mut self, src_port: Option<u16>, dst_port: Option<u16>) -> Self {
        self.src_port = src_port;
        self.dst_port = dst_port;
        self
    }

    /// Sets the parent device (builder pattern).
    pub fn with_dev(mut self, dev: Option<String>) -> Self {
        self.dev = dev;
        self
    }

    /// Checks the spec's invariants.
    pub fn validate(&self) -> TunnelMgrResult<()> {
        if self.vni == 0 || self.vni > VNI_MAX {
            return Err(TunnelMgrError::invalid_config(
                "vni",
                format!("{} is outside the valid range 1-{}", self.vni, VNI_MAX),
            ));
        }
        Ok(())
    }
}

/// One tunnel interface as reported by the kernel.
///
/// A read-only snapshot parsed from `ip -d -o link show` output; re-derived
/// from the kernel on every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelRecord {
    /// Kernel interface name.
    pub ifname: String,
    /// Virtual network identifier.
    pub vni: u32,
    /// Local endpoint address.
    pub src_host: String,
    /// Remote endpoint address.
    pub dst_host: String,
    /// Destination UDP port.
    pub dst_port: u16,
}

impl TunnelRecord {
    /// The record as ordered field/value pairs, in presentation order.
    pub fn field_values(&self) -> FieldValues {
        vec![
            ("ifname".to_string(), self.ifname.clone()),
            ("vni".to_string(), self.vni.to_string()),
            ("src_host".to_string(), self.src_host.clone()),
            ("dst_host".to_string(), self.dst_host.clone()),
            ("dst_port".to_string(), self.dst_port.to_string()),
        ]
    }
}

/// Parameters for one connectivity probe.
#[derive(Debug, Clone)]
pub struct ConnectivityCheck {
    /// VNI the probe reports on.
    pub vni: u32,
    /// Local endpoint address.
    pub src_host: String,
    /// Remote endpoint address to connect to.
    pub dst_host: String,
    /// Probe port; the encapsulation's well-known port when unset.
    pub port: Option<u16>,
    /// Per-attempt connect timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of connection attempts (>= 1).
    pub max_retries: u32,
}

impl ConnectivityCheck {
    /// Creates a check with default timeout and retry count.
    pub fn new(vni: u32, src_host: impl Into<String>, dst_host: impl Into<String>) -> Self {
        Self {
            vni,
            src_host: src_host.into(),
            dst_host: dst_host.into(),
            port: None,
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            max_retries: DEFAULT_PROBE_RETRIES,
        }
    }

    /// Sets the probe port (builder pattern).
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-attempt timeout (builder pattern).
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the maximum attempt count (builder pattern).
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
