use tracing::info;

use crate::api::statements::StatementTransport;
use crate::client::TrinoHttpClient;
use crate::clock::{Clock, TokioClock};
use crate::config::{ClientConfig, ReadinessConfig};
use crate::models::TrinoError;
use crate::poller::ReadinessPoller;
use crate::readiness::{ensure_catalogs_are_available, ensure_nodes_are_up};
use crate::session::QuerySession;

pub const REFERENCE_QUERY: &str = "select * from nation";
pub const REFERENCE_SCHEMA: &str = "sf1";
pub const REFERENCE_CATALOG: &str = "tpch";
pub const EXPECTED_NATION_ROWS: usize = 25;

/// What a passing smoke test observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    pub nodes: Vec<String>,
    pub catalogs: Vec<String>,
    pub reference_rows: usize,
}

/// Higher-level service layer built on top of `QuerySession`.
/// Verifies that a freshly started cluster can actually serve queries.
#[derive(Debug)]
pub struct SmokeTestService<T, C> {
    session: QuerySession<T>,
    poller: ReadinessPoller<C>,
}

impl SmokeTestService<TrinoHttpClient, TokioClock> {
    /// Smoke test over HTTP with real sleeps between readiness attempts.
    pub fn from_config(
        client: ClientConfig,
        readiness: ReadinessConfig,
    ) -> Result<Self, TrinoError> {
        Ok(Self::new(
            QuerySession::connect(client)?,
            ReadinessPoller::new(TokioClock::new(), readiness),
        ))
    }
}

impl<T: StatementTransport, C: Clock> SmokeTestService<T, C> {
    pub fn new(session: QuerySession<T>, poller: ReadinessPoller<C>) -> Self {
        Self { session, poller }
    }

    /// Returns a reference to the session the checks run on.
    pub fn session(&self) -> &QuerySession<T> {
        &self.session
    }

    /// Runs every step in order; the first failing step ends the run.
    ///
    /// 1. all `expected_hosts` registered with the coordinator
    /// 2. at least one catalog loaded
    /// 3. `select * from nation` on `tpch.sf1` returns exactly 25 rows
    pub async fn run(&mut self, expected_hosts: &[String]) -> Result<SmokeReport, TrinoError> {
        let nodes = ensure_nodes_are_up(&mut self.session, &self.poller, expected_hosts).await?;
        let catalogs = ensure_catalogs_are_available(&mut self.session, &self.poller).await?;

        self.session
            .execute_query_in(REFERENCE_QUERY, REFERENCE_SCHEMA, REFERENCE_CATALOG)
            .await?;
        let rows = self.session.get_rows().await?;

        if rows.len() != EXPECTED_NATION_ROWS {
            return Err(TrinoError::Validation {
                check: "rows returned from nation table in TPCH connector".to_string(),
                expected: EXPECTED_NATION_ROWS,
                actual: rows.len(),
            });
        }

        info!(
            "Smoke test passed: {} nodes, {} catalogs, {} nation rows",
            nodes.len(),
            catalogs.len(),
            rows.len()
        );
        Ok(SmokeReport {
            nodes,
            catalogs,
            reference_rows: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;
    use crate::models::Row;
    use crate::readiness::{SHOW_CATALOGS, SYSTEM_RUNTIME_NODES};
    use crate::testing::{page, rows_of, transport_failure, Call, ScriptedTransport};

    const NATION_PAGE_2: &str = "http://coordinator:8285/v1/statement/executing/nation/2";

    /// A cluster that answers every check; the nation table spans two pages
    /// holding `nation_rows` rows in total.
    fn cluster(nation_rows: i64) -> ScriptedTransport {
        ScriptedTransport::new(move |call| match call {
            Call::Submit { sql, .. } if sql == SYSTEM_RUNTIME_NODES => page(
                vec![vec![json!("coordinator")], vec![json!("worker-1")]],
                None,
            ),
            Call::Submit { sql, .. } if sql == SHOW_CATALOGS => {
                page(vec![vec![json!("system")], vec![json!("tpch")]], None)
            }
            Call::Submit { sql, schema, catalog } if sql == REFERENCE_QUERY => {
                assert_eq!((schema.as_str(), catalog.as_str()), ("sf1", "tpch"));
                page(rows_of(&(0..10).collect::<Vec<i64>>()), Some(NATION_PAGE_2))
            }
            Call::Follow(uri) if uri == NATION_PAGE_2 => {
                page(rows_of(&(10..nation_rows).collect::<Vec<i64>>()), None)
            }
            other => panic!("unexpected call: {other:?}"),
        })
    }

    fn service(transport: ScriptedTransport, clock: &ManualClock) -> SmokeTestService<ScriptedTransport, &ManualClock> {
        SmokeTestService::new(
            QuerySession::new(ClientConfig::new("coordinator", "root", Some(8285)), transport),
            ReadinessPoller::new(clock, ReadinessConfig::default()),
        )
    }

    fn hosts() -> Vec<String> {
        vec!["coordinator".to_string(), "worker-1".to_string()]
    }

    #[tokio::test]
    async fn healthy_cluster_passes() {
        let clock = ManualClock::new();
        let mut service = service(cluster(25), &clock);

        let report = service.run(&hosts()).await.unwrap();
        assert_eq!(
            report,
            SmokeReport {
                nodes: hosts(),
                catalogs: vec!["system".to_string(), "tpch".to_string()],
                reference_rows: 25,
            }
        );
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn wrong_nation_row_count_fails_validation() {
        let clock = ManualClock::new();
        let mut service = service(cluster(24), &clock);

        let err = service.run(&hosts()).await.unwrap_err();
        assert!(
            matches!(err, TrinoError::Validation { expected: 25, actual: 24, .. }),
            "{err}"
        );
        assert!(err.to_string().contains("expected 25 but got 24"));
    }

    #[tokio::test]
    async fn missing_catalogs_stop_before_reference_query() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::new(|call| match call {
            Call::Submit { sql, .. } if sql == SYSTEM_RUNTIME_NODES => {
                page(vec![vec![json!("coordinator")]], None)
            }
            Call::Submit { sql, .. } if sql == SHOW_CATALOGS => page(Vec::<Row>::new(), None),
            other => panic!("unexpected call: {other:?}"),
        });
        let mut service = service(transport, &clock);

        let err = service
            .run(&["coordinator".to_string()])
            .await
            .unwrap_err();
        assert!(
            matches!(&err, TrinoError::ReadinessTimeout { check, .. } if check == "catalog availability"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn reference_query_transport_failure_is_fatal() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::new(|call| match call {
            Call::Submit { sql, .. } if sql == REFERENCE_QUERY => transport_failure(),
            Call::Submit { sql, .. } if sql == SHOW_CATALOGS => {
                page(vec![vec![json!("tpch")]], None)
            }
            _ => page(vec![vec![json!("coordinator")]], None),
        });
        let mut service = service(transport, &clock);

        let err = service
            .run(&["coordinator".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_transient(), "{err}");
        assert_eq!(service.session().transport().network_calls(), 4);
    }
}
