//! Billing mesh
//!
//! One binary, three roles:
//!
//! ```text
//!                         ┌──────────────────────────┐
//!     Client ────────────▶│   edge (path prefixes)   │
//!                         └──┬─────────┬─────────┬───┘
//!              /customers/   │         │         │  /API/
//!                            ▼         │         ▼
//!                ┌─────────────────┐   │   ┌──────────────────────────┐
//!                │ upstream        │   │   │ billing                  │
//!                │ customers       │◀──┼───│  store → customer lookup │
//!                └─────────────────┘   │   │        → product lookups │
//!                ┌─────────────────┐   │   │  (breaker + fallback)    │
//!                │ upstream        │◀──┴───│                          │
//!                │ products        │       └──────────────────────────┘
//!                └─────────────────┘  /products/
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use billing_mesh::config::{load_config, watcher::ConfigWatcher, AppConfig};
use billing_mesh::health::HealthMonitor;
use billing_mesh::http::EdgeServer;
use billing_mesh::lifecycle::{build_billing, wait_for_signal, Shutdown};
use billing_mesh::observability::{init_tracing, metrics};
use billing_mesh::upstream::{self, UpstreamKind};

#[derive(Parser)]
#[command(name = "billing-mesh", version, about = "Billing service, edge router and fixture upstreams")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when absent.
    #[arg(short, long, env = "BILLING_MESH_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the billing service
    Billing,
    /// Run the edge router
    Edge,
    /// Run a fixture customer or inventory service
    Upstream {
        #[arg(value_enum)]
        kind: UpstreamKind,

        /// Bind address (defaults to 0.0.0.0:8081 for customers, 0.0.0.0:8082 for products)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = ?cli.config, "billing-mesh starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
        });
    }

    match cli.command {
        Command::Billing => run_billing(config, &shutdown).await?,
        Command::Edge => run_edge(config, cli.config.as_deref(), &shutdown).await?,
        Command::Upstream { kind, bind } => {
            let bind = bind.unwrap_or_else(|| match kind {
                UpstreamKind::Customers => "0.0.0.0:8081".to_string(),
                UpstreamKind::Products => "0.0.0.0:8082".to_string(),
            });
            let listener = TcpListener::bind(&bind).await?;
            upstream::serve(kind.router(), listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_billing(config: AppConfig, shutdown: &Shutdown) -> Result<(), Box<dyn Error>> {
    let stack = build_billing(&config).await?;

    let monitor = HealthMonitor::new(stack.registry.clone(), config.health_check.clone());
    tokio::spawn(monitor.run(shutdown.subscribe()));

    let listener = TcpListener::bind(&config.billing.bind_address).await?;
    stack.server.run(listener, shutdown.subscribe()).await?;

    if let Err(e) = stack.store.save_to_file() {
        tracing::error!(error = %e, "Failed to save bill snapshot");
    }
    Ok(())
}

async fn run_edge(
    config: AppConfig,
    config_path: Option<&Path>,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn Error>> {
    let server = EdgeServer::new(&config);

    let monitor = HealthMonitor::new(server.tables(), config.health_check.clone());
    tokio::spawn(monitor.run(shutdown.subscribe()));

    // the watcher stops when dropped, so it lives until the server returns
    let (updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(updates), Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    let listener = TcpListener::bind(&config.edge.bind_address).await?;
    server.run(listener, updates, shutdown.subscribe()).await?;
    Ok(())
}
