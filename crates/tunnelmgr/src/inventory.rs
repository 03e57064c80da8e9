//! Inventory collection: parsing `ip -d -o link show` output
//!
//! Each encapsulation gets one single-line pattern. A line that does not
//! match the complete pattern produces no record and is skipped silently;
//! the interface name token must start with a letter so the numeric index
//! prefix of `-o` output (`5: vxlan1001: <...>`) is never mistaken for a name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FieldValues, TunnelKind, TunnelRecord, FIELDS_ALL};

/// Matches a dotted-quad IPv4 address or an IPv6 token with an optional
/// trailing embedded IPv4.
const IP_TOKEN: &str = r"(?:\d{1,3}(?:\.\d{1,3}){3}|[a-fA-F0-9:]+(?::\d{1,3}(?:\.\d{1,3}){3})?)";

static VXLAN_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<ifname>[A-Za-z]\S*): .+\bvxlan\b id (?P<vni>\d+).* local (?P<src_host>{ip}) remote (?P<dst_host>{ip}).* dstport (?P<dst_port>\d+)",
        ip = IP_TOKEN
    ))
    .expect("invalid vxlan line pattern")
});

static GENEVE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<ifname>[A-Za-z]\S*): .+\bgeneve\b id (?P<vni>\d+).* remote (?P<dst_host>{ip}) local (?P<src_host>{ip}).* dstport (?P<dst_port>\d+)",
        ip = IP_TOKEN
    ))
    .expect("invalid geneve line pattern")
});

/// Parses interface-listing output into tunnel records, preserving the
/// order lines appeared in.
pub fn parse_tunnel_links(kind: TunnelKind, output: &str) -> Vec<TunnelRecord> {
    let re: &Regex = match kind {
        TunnelKind::Vxlan => &VXLAN_LINE_RE,
        TunnelKind::Geneve => &GENEVE_LINE_RE,
    };

    let mut records = Vec::new();
    for line in output.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        // Numeric overflow means the line is not a well-formed listing.
        let Ok(vni) = caps["vni"].parse::<u32>() else {
            continue;
        };
        let Ok(dst_port) = caps["dst_port"].parse::<u16>() else {
            continue;
        };
        records.push(TunnelRecord {
            ifname: caps["ifname"].to_string(),
            vni,
            src_host: caps["src_host"].to_string(),
            dst_host: caps["dst_host"].to_string(),
            dst_port,
        });
    }
    records
}

/// Projects records onto a requested field subset.
///
/// `["all"]` (or any selector containing `all`) passes every field through;
/// otherwise only the named fields survive, in record order. Unknown field
/// names are simply absent from the result.
pub fn project(records: &[TunnelRecord], fields: &[String]) -> Vec<FieldValues> {
    let keep_all = fields.iter().any(|f| f == FIELDS_ALL);
    records
        .iter()
        .map(|record| {
            record
                .field_values()
                .into_iter()
                .filter(|(key, _)| keep_all || fields.iter().any(|f| f == key))
                .collect()
        })
        .collect()
}
