//! Cluster readiness checks: registered nodes and loaded catalogs.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::api::statements::StatementTransport;
use crate::clock::Clock;
use crate::models::{Row, TrinoError};
use crate::poller::{Attempt, Probe, ReadinessPoller};
use crate::session::QuerySession;

pub const SYSTEM_RUNTIME_NODES: &str = "select * from system.runtime.nodes";
pub const SHOW_CATALOGS: &str = "show catalogs";

/// Ready as soon as the coordinator accepts a statement at all.
pub struct ServerResponding<'a, T> {
    session: &'a mut QuerySession<T>,
}

impl<'a, T> ServerResponding<'a, T> {
    pub fn new(session: &'a mut QuerySession<T>) -> Self {
        Self { session }
    }
}

impl<T: StatementTransport> Probe for ServerResponding<'_, T> {
    type Output = ();

    fn name(&self) -> &str {
        "trino server status"
    }

    async fn attempt(&mut self) -> Result<Attempt<()>, TrinoError> {
        self.session.execute_query(SYSTEM_RUNTIME_NODES).await?;
        Ok(Attempt::Ready(()))
    }
}

/// Ready once `system.runtime.nodes` lists exactly the expected number of
/// distinct node identifiers. Yields the identifiers, sorted.
pub struct NodesRegistered<'a, T> {
    session: &'a mut QuerySession<T>,
    expected: usize,
}

impl<'a, T> NodesRegistered<'a, T> {
    pub fn new(session: &'a mut QuerySession<T>, expected: usize) -> Self {
        Self { session, expected }
    }
}

impl<T: StatementTransport> Probe for NodesRegistered<'_, T> {
    type Output = Vec<String>;

    fn name(&self) -> &str {
        "node registration"
    }

    async fn attempt(&mut self) -> Result<Attempt<Vec<String>>, TrinoError> {
        self.session.execute_query(SYSTEM_RUNTIME_NODES).await?;
        let nodes = node_ids(&self.session.get_rows().await?);

        if nodes.len() == self.expected {
            return Ok(Attempt::Ready(nodes.into_iter().collect()));
        }

        Ok(Attempt::Pending(format!(
            "{} of {} expected nodes registered: {:?}",
            nodes.len(),
            self.expected,
            nodes
        )))
    }
}

/// Ready once `show catalogs` returns at least one row. Yields catalog names.
pub struct CatalogsAvailable<'a, T> {
    session: &'a mut QuerySession<T>,
}

impl<'a, T> CatalogsAvailable<'a, T> {
    pub fn new(session: &'a mut QuerySession<T>) -> Self {
        Self { session }
    }
}

impl<T: StatementTransport> Probe for CatalogsAvailable<'_, T> {
    type Output = Vec<String>;

    fn name(&self) -> &str {
        "catalog availability"
    }

    async fn attempt(&mut self) -> Result<Attempt<Vec<String>>, TrinoError> {
        self.session.execute_query(SHOW_CATALOGS).await?;
        let rows = self.session.get_rows().await?;
        if rows.is_empty() {
            return Ok(Attempt::Pending("no catalogs loaded".to_string()));
        }

        Ok(Attempt::Ready(
            rows.iter()
                .filter_map(|row| row.first())
                .map(render_value)
                .collect(),
        ))
    }
}

/// Waits for the coordinator to answer, then for every host in
/// `expected_hosts` to register with it.
pub async fn ensure_nodes_are_up<T, C>(
    session: &mut QuerySession<T>,
    poller: &ReadinessPoller<C>,
    expected_hosts: &[String],
) -> Result<Vec<String>, TrinoError>
where
    T: StatementTransport,
    C: Clock,
{
    poller.wait_for(&mut ServerResponding::new(session)).await?;

    let expected = expected_hosts.iter().collect::<BTreeSet<_>>().len();
    debug!("Waiting for {} nodes: {:?}", expected, expected_hosts);

    let nodes = poller
        .wait_for(&mut NodesRegistered::new(session, expected))
        .await?;
    info!("All {} nodes registered: {:?}", nodes.len(), nodes);
    Ok(nodes)
}

pub async fn ensure_catalogs_are_available<T, C>(
    session: &mut QuerySession<T>,
    poller: &ReadinessPoller<C>,
) -> Result<Vec<String>, TrinoError>
where
    T: StatementTransport,
    C: Clock,
{
    let catalogs = poller.wait_for(&mut CatalogsAvailable::new(session)).await?;
    info!("Catalogs available: {:?}", catalogs);
    Ok(catalogs)
}

/// Node identifiers are the first column of `system.runtime.nodes`.
fn node_ids(rows: &[Row]) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|row| row.first())
        .map(render_value)
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
