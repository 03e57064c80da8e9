//! Tunnel capability: the lifecycle operations both encapsulations provide
//!
//! VXLAN and Geneve differ only in default port, kernel type keyword,
//! interface prefix and argument ordering, so each backend owns its exact
//! command shapes while the callers stay encapsulation-agnostic behind the
//! [`Tunnel`] trait.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use tunnelmgr_common::{shell, TunnelMgrError, TunnelMgrResult};

use crate::commands::*;
use crate::inventory;
use crate::probe;
use crate::types::{BridgeTool, ConnectivityCheck, TunnelKind, TunnelRecord, TunnelSpec};

/// Lifecycle operations every tunnel encapsulation supports.
#[async_trait]
pub trait Tunnel: Send {
    /// Encapsulation this backend drives.
    fn kind(&self) -> TunnelKind;

    /// Creates the kernel interface, brings it up, and attaches it to the
    /// bridge, in that order. The first failing command aborts the sequence;
    /// earlier commands are not rolled back, so a partially created
    /// interface is an observable outcome carried in the error.
    async fn create_tunnel_interface(&mut self, spec: &TunnelSpec) -> TunnelMgrResult<()>;

    /// Detaches the interface from the bridge, then deletes it.
    /// Detach-before-delete keeps the bridge from holding a dangling port.
    async fn cleanup_tunnel_interface(
        &mut self,
        vni: u32,
        bridge_name: &str,
    ) -> TunnelMgrResult<()>;

    /// Probes TCP reachability of the remote endpoint; the probe port is the
    /// caller-supplied port or this encapsulation's well-known port.
    async fn validate_connectivity(&mut self, check: &ConnectivityCheck) -> TunnelMgrResult<()>;

    /// Collects the kernel's current interfaces of this encapsulation.
    /// A failing listing command is logged and yields an empty inventory.
    async fn collect_tunnel_records(&mut self) -> Vec<TunnelRecord>;
}

/// Builds the backend for an encapsulation. The mapping is closed: every
/// supported kind has exactly one backend.
pub fn make_tunnel(kind: TunnelKind, bridge_tool: BridgeTool) -> Box<dyn Tunnel> {
    match kind {
        TunnelKind::Vxlan => Box::new(VxlanTunnel::new(bridge_tool)),
        TunnelKind::Geneve => Box::new(GeneveTunnel::new(bridge_tool)),
    }
}

/// VXLAN backend.
pub struct VxlanTunnel {
    bridge_tool: BridgeTool,

    #[cfg(test)]
    mock_mode: bool,
    #[cfg(test)]
    captured_commands: Vec<String>,
    #[cfg(test)]
    mock_failures: Vec<String>,
    #[cfg(test)]
    mock_stdout: String,
}

impl VxlanTunnel {
    /// Creates a VXLAN backend using the given bridge detach mechanism.
    pub fn new(bridge_tool: BridgeTool) -> Self {
        Self {
            bridge_tool,
            #[cfg(test)]
            mock_mode: false,
            #[cfg(test)]
            captured_commands: Vec::new(),
            #[cfg(test)]
            mock_failures: Vec::new(),
            #[cfg(test)]
            mock_stdout: String::new(),
        }
    }

    #[cfg(test)]
    pub fn new_mock(bridge_tool: BridgeTool) -> Self {
        let mut tunnel = Self::new(bridge_tool);
        tunnel.mock_mode = true;
        tunnel
    }

    #[cfg(test)]
    pub fn with_mock_failure(mut self, pattern: impl Into<String>) -> Self {
        self.mock_failures.push(pattern.into());
        self
    }

    #[cfg(test)]
    pub fn with_mock_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.mock_stdout = stdout.into();
        self
    }

    #[cfg(test)]
    pub fn captured_commands(&self) -> &[String] {
        &self.captured_commands
    }

    /// Execute a shell command (or capture it in mock mode)
    async fn exec(&mut self, cmd: &str) -> TunnelMgrResult<String> {
        #[cfg(test)]
        if self.mock_mode {
            self.captured_commands.push(cmd.to_string());
            if self.mock_failures.iter().any(|p| cmd.contains(p.as_str())) {
                return Err(TunnelMgrError::ShellCommandFailed {
                    command: cmd.to_string(),
                    exit_code: 1,
                    output: "mock failure".to_string(),
                });
            }
            return Ok(self.mock_stdout.clone());
        }

        shell::exec_or_throw(cmd).await
    }
}

#[async_trait]
impl Tunnel for VxlanTunnel {
    fn kind(&self) -> TunnelKind {
        TunnelKind::Vxlan
    }

    async fn create_tunnel_interface(&mut self, spec: &TunnelSpec) -> TunnelMgrResult<()> {
        spec.validate()?;
        let ifname = self.kind().ifname(spec.vni);

        let steps = [
            ("add", build_add_vxlan_cmd(spec)),
            ("bring up", build_set_link_up_cmd(&ifname)),
            ("attach", build_set_link_master_cmd(&ifname, &spec.bridge_name)),
        ];
        for (operation, cmd) in steps {
            if let Err(e) = self.exec(&cmd).await {
                return Err(TunnelMgrError::tunnel_command(operation, &ifname, spec.vni, e));
            }
        }

        info!(
            "created vxlan interface {} on bridge {}",
            ifname, spec.bridge_name
        );
        Ok(())
    }

    async fn cleanup_tunnel_interface(
        &mut self,
        vni: u32,
        bridge_name: &str,
    ) -> TunnelMgrResult<()> {
        let ifname = self.kind().ifname(vni);

        let detach_cmd = match self.bridge_tool {
            BridgeTool::Brctl => build_brctl_delif_cmd(bridge_name, &ifname),
            BridgeTool::Ip => build_set_link_nomaster_cmd(&ifname),
        };
        if let Err(e) = self.exec(&detach_cmd).await {
            return Err(TunnelMgrError::tunnel_command("detach", &ifname, vni, e));
        }

        if let Err(e) = self.exec(&build_del_link_cmd(&ifname)).await {
            return Err(TunnelMgrError::tunnel_command("delete", &ifname, vni, e));
        }

        info!("removed vxlan interface {}", ifname);
        Ok(())
    }

    async fn validate_connectivity(&mut self, check: &ConnectivityCheck) -> TunnelMgrResult<()> {
        let port = check.port.unwrap_or_else(|| self.kind().default_port());
        probe::probe_endpoint(
            self.kind(),
            check.vni,
            &check.src_host,
            &check.dst_host,
            port,
            Duration::from_secs(check.timeout_secs),
            check.max_retries,
        )
        .await
    }

    async fn collect_tunnel_records(&mut self) -> Vec<TunnelRecord> {
        let cmd = build_show_tunnels_cmd(self.kind());
        match self.exec(&cmd).await {
            Ok(stdout) => inventory::parse_tunnel_links(self.kind(), &stdout),
            Err(e) => {
                warn!("failed to collect vxlan interfaces: {}", e);
                Vec::new()
            }
        }
    }
}

/// Geneve backend.
pub struct GeneveTunnel {
    bridge_tool: BridgeTool,

    #[cfg(test)]
    mock_mode: bool,
    #[cfg(test)]
    captured_commands: Vec<String>,
    #[cfg(test)]
    mock_failures: Vec<String>,
    #[cfg(test)]
    mock_stdout: String,
}

impl GeneveTunnel {
    /// Creates a Geneve backend using the given bridge detach mechanism.
    pub fn new(bridge_tool: BridgeTool) -> Self {
        Self {
            bridge_tool,
            #[cfg(test)]
            mock_mode: false,
            #[cfg(test)]
            captured_commands: Vec::new(),
            #[cfg(test)]
            mock_failures: Vec::new(),
            #[cfg(test)]
            mock_stdout: String::new(),
        }
    }

    #[cfg(test)]
    pub fn new_mock(bridge_tool: BridgeTool) -> Self {
        let mut tunnel = Self::new(bridge_tool);
        tunnel.mock_mode = true;
        tunnel
    }

    #[cfg(test)]
    pub fn with_mock_failure(mut self, pattern: impl Into<String>) -> Self {
        self.mock_failures.push(pattern.into());
        self
    }

    #[cfg(test)]
    pub fn with_mock_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.mock_stdout = stdout.into();
        self
    }

    #[cfg(test)]
    pub fn captured_commands(&self) -> &[String] {
        &self.captured_commands
    }

    /// Execute a shell command (or capture it in mock mode)
    async fn exec(&mut self, cmd: &str) -> TunnelMgrResult<String> {
        #[cfg(test)]
        if self.mock_mode {
            self.captured_commands.push(cmd.to_string());
            if self.mock_failures.iter().any(|p| cmd.contains(p.as_str())) {
                return Err(TunnelMgrError::ShellCommandFailed {
                    command: cmd.to_string(),
                    exit_code: 1,
                    output: "mock failure".to_string(),
                });
            }
            return Ok(self.mock_stdout.clone());
        }

        shell::exec_or_throw(cmd).await
    }
}

#[async_trait]
impl Tunnel for GeneveTunnel {
    fn kind(&self) -> TunnelKind {
        TunnelKind::Geneve
    }

    async fn create_tunnel_interface(&mut self, spec: &TunnelSpec) -> TunnelMgrResult<()> {
        spec.validate()?;
        let ifname = self.kind().ifname(spec.vni);

        let steps = [
            ("add", build_add_geneve_cmd(spec)),
            ("bring up", build_set_link_up_cmd(&ifname)),
            ("attach", build_set_link_master_cmd(&ifname, &spec.bridge_name)),
        ];
        for (operation, cmd) in steps {
            if let Err(e) = self.exec(&cmd).await {
                return Err(TunnelMgrError::tunnel_command(operation, &ifname, spec.vni, e));
            }
        }

        info!(
            "created geneve interface {} on bridge {}",
            ifname, spec.bridge_name
        );
        Ok(())
    }

    async fn cleanup_tunnel_interface(
        &mut self,
        vni: u32,
        bridge_name: &str,
    ) -> TunnelMgrResult<()> {
        let ifname = self.kind().ifname(vni);

        let detach_cmd = match self.bridge_tool {
            BridgeTool::Brctl => build_brctl_delif_cmd(bridge_name, &ifname),
            BridgeTool::Ip => build_set_link_nomaster_cmd(&ifname),
        };
        if let Err(e) = self.exec(&detach_cmd).await {
            return Err(TunnelMgrError::tunnel_command("detach", &ifname, vni, e));
        }

        if let Err(e) = self.exec(&build_del_link_cmd(&ifname)).await {
            return Err(TunnelMgrError::tunnel_command("delete", &ifname, vni, e));
        }

        info!("removed geneve interface {}", ifname);
        Ok(())
    }

    async fn validate_connectivity(&mut self, check: &ConnectivityCheck) -> TunnelMgrResult<()> {
        let port = check.port.unwrap_or_else(|| self.kind().default_port());
        probe::probe_endpoint(
            self.kind(),
            check.vni,
            &check.src_host,
            &check.dst_host,
            port,
            Duration::from_secs(check.timeout_secs),
            check.max_retries,
        )
        .await
    }

    async fn collect_tunnel_records(&mut self) -> Vec<TunnelRecord> {
        let cmd = build_show_tunnels_cmd(self.kind());
        match self.exec(&cmd).await {
            Ok(stdout) => inventory::parse_tunnel_links(self.kind(), &stdout),
            Err(e) => {
                warn!("failed to collect geneve interfaces: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TunnelSpec {
        TunnelSpec::new(1001, "192.168.1.1", "192.168.1.2", "br0")
    }

    #[tokio::test]
    async fn test_vxlan_create_issues_three_commands_in_order() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip);
        tunnel.create_tunnel_interface(&spec()).await.unwrap();

        let cmds = tunnel.captured_commands();
        assert_eq!(cmds.len(), 3);
        assert!(cmds[0].contains("link add vxlan1001 type vxlan id 1001"));
        assert!(cmds[1].contains("link set vxlan1001 up"));
        assert!(cmds[2].contains("link set vxlan1001 master \"br0\""));
    }

    #[tokio::test]
    async fn test_vxlan_create_keyword_order() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip);
        tunnel.create_tunnel_interface(&spec()).await.unwrap();

        let add_cmd = &tunnel.captured_commands()[0];
        assert!(add_cmd.find("local").unwrap() < add_cmd.find("remote").unwrap());
        assert!(add_cmd.contains("dstport 4789"));
    }

    #[tokio::test]
    async fn test_geneve_create_keyword_order() {
        let mut tunnel = GeneveTunnel::new_mock(BridgeTool::Ip);
        tunnel.create_tunnel_interface(&spec()).await.unwrap();

        let cmds = tunnel.captured_commands();
        assert_eq!(cmds.len(), 3);
        let add_cmd = &cmds[0];
        assert!(add_cmd.contains("link add geneve1001 type geneve id 1001"));
        assert!(add_cmd.find("remote").unwrap() < add_cmd.find("local").unwrap());
        assert!(add_cmd.contains("dstport 6081"));
    }

    #[tokio::test]
    async fn test_create_stops_after_first_failure() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip).with_mock_failure("link add");

        let err = tunnel.create_tunnel_interface(&spec()).await.unwrap_err();
        match err {
            TunnelMgrError::TunnelCommand {
                operation,
                ifname,
                vni,
                ..
            } => {
                assert_eq!(operation, "add");
                assert_eq!(ifname, "vxlan1001");
                assert_eq!(vni, 1001);
            }
            other => panic!("expected TunnelCommand, got {other:?}"),
        }
        // the up/master commands never ran
        assert_eq!(tunnel.captured_commands().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_mid_sequence() {
        let mut tunnel = GeneveTunnel::new_mock(BridgeTool::Ip).with_mock_failure("master");

        let err = tunnel.create_tunnel_interface(&spec()).await.unwrap_err();
        match err {
            TunnelMgrError::TunnelCommand { operation, .. } => assert_eq!(operation, "attach"),
            other => panic!("expected TunnelCommand, got {other:?}"),
        }
        // add and up ran, attach failed, nothing was rolled back
        assert_eq!(tunnel.captured_commands().len(), 3);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_vni_before_any_command() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip);
        let bad = TunnelSpec::new(0, "192.168.1.1", "192.168.1.2", "br0");

        assert!(tunnel.create_tunnel_interface(&bad).await.is_err());
        assert!(tunnel.captured_commands().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_detaches_before_delete_ip_tool() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip);
        tunnel.cleanup_tunnel_interface(1001, "br0").await.unwrap();

        let cmds = tunnel.captured_commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds[0].contains("link set vxlan1001 nomaster"));
        assert!(cmds[1].contains("link del vxlan1001"));
    }

    #[tokio::test]
    async fn test_cleanup_detaches_before_delete_brctl_tool() {
        let mut tunnel = GeneveTunnel::new_mock(BridgeTool::Brctl);
        tunnel.cleanup_tunnel_interface(42, "br1").await.unwrap();

        let cmds = tunnel.captured_commands();
        assert_eq!(cmds.len(), 2);
        assert!(cmds[0].contains("delif \"br1\" geneve42"));
        assert!(cmds[1].contains("link del geneve42"));
    }

    #[tokio::test]
    async fn test_cleanup_detach_failure_stops_delete() {
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip).with_mock_failure("nomaster");

        let err = tunnel.cleanup_tunnel_interface(1001, "br0").await.unwrap_err();
        match err {
            TunnelMgrError::TunnelCommand { operation, .. } => assert_eq!(operation, "detach"),
            other => panic!("expected TunnelCommand, got {other:?}"),
        }
        assert_eq!(tunnel.captured_commands().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_parses_mock_listing() {
        let listing = "vxlan1001: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue \
             master br0 state UNKNOWN vxlan id 1001 dev eth0 local 192.168.1.1 \
             remote 192.168.1.2 srcport 0 0 dstport 4789";
        let mut tunnel = VxlanTunnel::new_mock(BridgeTool::Ip).with_mock_stdout(listing);

        let records = tunnel.collect_tunnel_records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ifname, "vxlan1001");
        assert_eq!(records[0].vni, 1001);

        let cmds = tunnel.captured_commands();
        assert!(cmds[0].contains("link show type vxlan"));
    }

    #[tokio::test]
    async fn test_collect_swallows_command_failure() {
        let mut tunnel = GeneveTunnel::new_mock(BridgeTool::Ip).with_mock_failure("link show");
        assert!(tunnel.collect_tunnel_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_factory_covers_both_kinds() {
        let vxlan = make_tunnel(TunnelKind::Vxlan, BridgeTool::Ip);
        assert_eq!(vxlan.kind(), TunnelKind::Vxlan);

        let geneve = make_tunnel(TunnelKind::Geneve, BridgeTool::Brctl);
        assert_eq!(geneve.kind(), TunnelKind::Geneve);
    }
}
