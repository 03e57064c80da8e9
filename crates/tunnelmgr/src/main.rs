//! tunnelmgr CLI entry point

use clap::{Parser, Subcommand};
use tracing::error;

use tunnelmgr::format;
use tunnelmgr::inventory;
use tunnelmgr::types::{
    BridgeTool, ConnectivityCheck, TunnelKind, TunnelSpec, DEFAULT_PROBE_RETRIES,
    DEFAULT_PROBE_TIMEOUT_SECS,
};
use tunnelmgr::TunnelManager;
use tunnelmgr_common::{shell, TunnelMgrError, TunnelMgrResult};

/// Manage VXLAN and Geneve tunnel interfaces between bridges.
#[derive(Parser, Debug)]
#[command(name = "tunnelmgr", version, about, long_about = None)]
struct Cli {
    /// Tunnel encapsulation to operate on (vxlan or geneve)
    #[arg(long, default_value = "vxlan")]
    tunnel_type: String,

    /// Bridge management tool used to detach interfaces (ip or brctl)
    #[arg(long, default_value = "ip")]
    bridge_tool: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a tunnel interface and attach it to a bridge
    Create {
        /// Virtual network identifier (24-bit, positive)
        #[arg(long)]
        vni: u32,

        /// Local endpoint IP address
        #[arg(long)]
        src_host: String,

        /// Remote endpoint IP address
        #[arg(long)]
        dst_host: String,

        /// Bridge to attach the tunnel interface to
        #[arg(long)]
        bridge_name: String,

        /// Source UDP port
        #[arg(long)]
        src_port: Option<u16>,

        /// Destination UDP port (default: the encapsulation's well-known port)
        #[arg(long)]
        dst_port: Option<u16>,

        /// Parent network device
        #[arg(long)]
        dev: Option<String>,
    },

    /// Detach a tunnel interface from its bridge and delete it
    Cleanup {
        /// Virtual network identifier of the interface to remove
        #[arg(long)]
        vni: u32,

        /// Bridge the interface is attached to
        #[arg(long)]
        bridge_name: String,
    },

    /// Probe TCP reachability of the remote tunnel endpoint
    Validate {
        /// Virtual network identifier the probe reports on
        #[arg(long)]
        vni: u32,

        /// Local endpoint IP address
        #[arg(long)]
        src_host: String,

        /// Remote endpoint IP address
        #[arg(long)]
        dst_host: String,

        /// Probe port (default: the encapsulation's well-known port)
        #[arg(long)]
        port: Option<u16>,

        /// Per-attempt connect timeout in seconds
        #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
        timeout: u64,

        /// Maximum number of connection attempts
        #[arg(long, default_value_t = DEFAULT_PROBE_RETRIES)]
        retries: u32,
    },

    /// List tunnel interfaces of the selected type
    List {
        /// Output format (json, yaml, xml, csv, script, table)
        #[arg(short = 'o', long, default_value = "table")]
        format: String,

        /// Fields to include, or "all"
        #[arg(short = 'f', long, num_args = 1.., default_value = "all")]
        fields: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `list` output on stdout stays machine-parseable.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> TunnelMgrResult<()> {
    let kind: TunnelKind = cli.tunnel_type.parse()?;
    let bridge_tool: BridgeTool = cli.bridge_tool.parse()?;

    if bridge_tool == BridgeTool::Brctl && !shell::tool_exists(shell::BRCTL_CMD).await {
        return Err(TunnelMgrError::invalid_config(
            "bridge-tool",
            format!("'{}' is not installed", shell::BRCTL_CMD),
        ));
    }

    let mut manager = TunnelManager::new(kind, bridge_tool);

    match cli.command {
        Commands::Create {
            vni,
            src_host,
            dst_host,
            bridge_name,
            src_port,
            dst_port,
            dev,
        } => {
            let spec = TunnelSpec::new(vni, src_host, dst_host, bridge_name)
                .with_ports(src_port, dst_port)
                .with_dev(dev);
            manager.create(&spec).await?;
            println!("Tunnel interface {} created.", kind.ifname(vni));
        }

        Commands::Cleanup { vni, bridge_name } => {
            manager.cleanup(vni, &bridge_name).await?;
            println!("Tunnel interface {} removed.", kind.ifname(vni));
        }

        Commands::Validate {
            vni,
            src_host,
            dst_host,
            port,
            timeout,
            retries,
        } => {
            let check = ConnectivityCheck::new(vni, src_host, dst_host)
                .with_port(port)
                .with_timeout(timeout)
                .with_retries(retries);
            manager.validate(&check).await?;
            println!("Connectivity to {} vni {} verified.", kind, vni);
        }

        Commands::List { format, fields } => {
            let records = manager.list().await;
            let rows = inventory::project(&records, &fields);
            println!("{}", format::render_as(&rows, &format)?);
        }
    }

    Ok(())
}
