//! Trino cluster smoke test
//!
//! Waits for the expected nodes to register and for catalogs to load, then
//! checks that `tpch.sf1.nation` returns 25 rows. Exits non-zero on failure.
//!
//! Usage:
//!   trino-smoke --host coordinator.example --port 8285 \
//!     --expected-host coordinator.example --expected-host worker-1.example

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trino_smoke::config::{DEFAULT_USER, DEFAULT_RETRY_BUDGET, DEFAULT_RETRY_INTERVAL};
use trino_smoke::{ClientConfig, ReadinessConfig, SmokeTestService};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Coordinator host name or IP
    #[arg(long, env = "TRINO_HOST")]
    host: String,

    /// Coordinator HTTP port
    #[arg(long, env = "TRINO_PORT")]
    port: u16,

    /// User identity sent with every statement
    #[arg(long, env = "TRINO_USER", default_value = DEFAULT_USER)]
    user: String,

    /// Every host expected to register with the coordinator, itself included
    #[arg(long = "expected-host", required = true)]
    expected_hosts: Vec<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "TRINO_REQUEST_TIMEOUT_MS", default_value = "5000")]
    request_timeout_ms: u64,

    /// Seconds between readiness attempts
    #[arg(long, env = "TRINO_READINESS_INTERVAL_SECS", default_value_t = DEFAULT_RETRY_INTERVAL.as_secs())]
    interval_secs: u64,

    /// Total seconds allowed for each readiness check
    #[arg(long, env = "TRINO_READINESS_BUDGET_SECS", default_value_t = DEFAULT_RETRY_BUDGET.as_secs())]
    budget_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = ClientConfig::new(args.host, args.user, Some(args.port))
        .with_request_timeout(Duration::from_millis(args.request_timeout_ms));
    let readiness = ReadinessConfig {
        interval: Duration::from_secs(args.interval_secs.max(1)),
        budget: Duration::from_secs(args.budget_secs),
    };

    info!(
        "Smoke testing {} as {} against {} expected hosts",
        client.base_url().unwrap_or_default(),
        client.user,
        args.expected_hosts.len()
    );

    let mut service = SmokeTestService::from_config(client, readiness)?;
    match service.run(&args.expected_hosts).await {
        Ok(report) => {
            info!(
                "Cluster healthy: nodes={:?} catalogs={:?}",
                report.nodes, report.catalogs
            );
            Ok(())
        }
        Err(e) => {
            error!("Smoke test failed: {}", e);
            Err(e.into())
        }
    }
}
