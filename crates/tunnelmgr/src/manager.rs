//! Tunnel lifecycle manager
//!
//! A thin orchestrator holding the one encapsulation backend selected at
//! startup, so callers are written once regardless of which tunnel type is
//! active. It owns no tunnel state of its own.

use tunnelmgr_common::TunnelMgrResult;

use crate::tunnel::{make_tunnel, Tunnel};
use crate::types::{BridgeTool, ConnectivityCheck, TunnelKind, TunnelRecord, TunnelSpec};

/// Orchestrates create/cleanup/validate/list against one tunnel backend.
pub struct TunnelManager {
    tunnel: Box<dyn Tunnel>,
}

impl TunnelManager {
    /// Creates a manager around the backend for `kind`.
    pub fn new(kind: TunnelKind, bridge_tool: BridgeTool) -> Self {
        Self {
            tunnel: make_tunnel(kind, bridge_tool),
        }
    }

    /// Creates a manager around an already-built backend.
    pub fn with_tunnel(tunnel: Box<dyn Tunnel>) -> Self {
        Self { tunnel }
    }

    /// The encapsulation this manager drives.
    pub fn kind(&self) -> TunnelKind {
        self.tunnel.kind()
    }

    /// Creates a tunnel interface and attaches it to its bridge.
    pub async fn create(&mut self, spec: &TunnelSpec) -> TunnelMgrResult<()> {
        self.tunnel.create_tunnel_interface(spec).await
    }

    /// Detaches a tunnel interface from its bridge and deletes it.
    pub async fn cleanup(&mut self, vni: u32, bridge_name: &str) -> TunnelMgrResult<()> {
        self.tunnel.cleanup_tunnel_interface(vni, bridge_name).await
    }

    /// Probes reachability of the remote tunnel endpoint.
    pub async fn validate(&mut self, check: &ConnectivityCheck) -> TunnelMgrResult<()> {
        self.tunnel.validate_connectivity(check).await
    }

    /// Lists the kernel's current tunnel interfaces of the managed type.
    pub async fn list(&mut self) -> Vec<TunnelRecord> {
        self.tunnel.collect_tunnel_records().await
    }
}
