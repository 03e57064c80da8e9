//! Bounded-retry TCP reachability probe
//!
//! Overlay traffic itself is UDP; a TCP connect to the remote endpoint's
//! tunnel port is a reachability heuristic, not a tunnel-protocol handshake.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, warn};

use tunnelmgr_common::{TunnelMgrError, TunnelMgrResult};

use crate::types::TunnelKind;

/// Attempts to connect to `(dst_host, port)` up to `max_retries` times.
///
/// Each attempt opens a fresh socket bounded by `per_attempt`; the first
/// successful connect returns immediately. There is no backoff between
/// attempts, the per-attempt timeout is the only throttle. When every
/// attempt has failed the returned error carries the probed endpoints and
/// the attempt count.
pub async fn probe_endpoint(
    kind: TunnelKind,
    vni: u32,
    src_host: &str,
    dst_host: &str,
    port: u16,
    per_attempt: Duration,
    max_retries: u32,
) -> TunnelMgrResult<()> {
    let mut retries = 0u32;
    while retries < max_retries {
        match timeout(per_attempt, TcpStream::connect((dst_host, port))).await {
            Ok(Ok(_stream)) => {
                info!(
                    "connectivity to {} vni {} at {}:{} from {} is successful",
                    kind, vni, dst_host, port, src_host
                );
                return Ok(());
            }
            Ok(Err(e)) => {
                retries += 1;
                warn!(
                    "retry {}/{}: failed to reach {} vni {} at {}:{}: {}",
                    retries, max_retries, kind, vni, dst_host, port, e
                );
            }
            Err(_) => {
                retries += 1;
                warn!(
                    "retry {}/{}: connect to {} vni {} at {}:{} timed out after {:?}",
                    retries, max_retries, kind, vni, dst_host, port, per_attempt
                );
            }
        }
    }

    Err(TunnelMgrError::ConnectivityFailed {
        tunnel_type: kind.as_str().to_string(),
        vni,
        src_host: src_host.to_string(),
        dst_host: dst_host.to_string(),
        port,
        attempts: max_retries,
    })
}
