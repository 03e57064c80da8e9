//! Shell command builders for tunnel operations
//!
//! The external `ip` parser is strict about keyword order, so each builder
//! spells out the exact argument sequence its encapsulation expects: VXLAN
//! names `local` before `remote`, Geneve names `remote` before `local`.

use tunnelmgr_common::shell;

use crate::types::{TunnelKind, TunnelSpec};

/// Build VXLAN interface creation command
///
/// `ip link add vxlan<vni> type vxlan id <vni> local <src> remote <dst>
/// dstport <port> [dev <dev>]`
pub fn build_add_vxlan_cmd(spec: &TunnelSpec) -> String {
    let kind = TunnelKind::Vxlan;
    let mut cmd = format!(
        "{} link add {} type vxlan id {} local {} remote {} dstport {}",
        shell::IP_CMD,
        kind.ifname(spec.vni),
        spec.vni,
        shell::shellquote(&spec.src_host),
        shell::shellquote(&spec.dst_host),
        spec.dst_port.unwrap_or_else(|| kind.default_port()),
    );
    if let Some(dev) = &spec.dev {
        cmd.push_str(&format!(" dev {}", shell::shellquote(dev)));
    }
    cmd
}

/// Build Geneve interface creation command
///
/// `ip link add geneve<vni> type geneve id <vni> remote <dst> local <src>
/// [dev <dev>] dstport <port>`
pub fn build_add_geneve_cmd(spec: &TunnelSpec) -> String {
    let kind = TunnelKind::Geneve;
    let mut cmd = format!(
        "{} link add {} type geneve id {} remote {} local {}",
        shell::IP_CMD,
        kind.ifname(spec.vni),
        spec.vni,
        shell::shellquote(&spec.dst_host),
        shell::shellquote(&spec.src_host),
    );
    if let Some(dev) = &spec.dev {
        cmd.push_str(&format!(" dev {}", shell::shellquote(dev)));
    }
    cmd.push_str(&format!(
        " dstport {}",
        spec.dst_port.unwrap_or_else(|| kind.default_port())
    ));
    cmd
}

/// Build interface bring-up command
pub fn build_set_link_up_cmd(ifname: &str) -> String {
    format!("{} link set {} up", shell::IP_CMD, ifname)
}

/// Build bridge attach command
pub fn build_set_link_master_cmd(ifname: &str, bridge_name: &str) -> String {
    format!(
        "{} link set {} master {}",
        shell::IP_CMD,
        ifname,
        shell::shellquote(bridge_name)
    )
}

/// Build bridge detach command (`ip` backend)
pub fn build_set_link_nomaster_cmd(ifname: &str) -> String {
    format!("{} link set {} nomaster", shell::IP_CMD, ifname)
}

/// Build bridge detach command (`brctl` backend)
pub fn build_brctl_delif_cmd(bridge_name: &str, ifname: &str) -> String {
    format!(
        "{} delif {} {}",
        shell::BRCTL_CMD,
        shell::shellquote(bridge_name),
        ifname
    )
}

/// Build interface deletion command
pub fn build_del_link_cmd(ifname: &str) -> String {
    format!("{} link del {}", shell::IP_CMD, ifname)
}

/// Build tunnel inventory command
///
/// `-o` keeps each interface on a single line so the inventory parser can
/// match one structured pattern per line.
pub fn build_show_tunnels_cmd(kind: TunnelKind) -> String {
    format!("{} -d -o link show type {}", shell::IP_CMD, kind.as_str())
}
