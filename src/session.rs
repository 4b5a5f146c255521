use tracing::{debug, info, warn};

use crate::api::statements::StatementTransport;
use crate::client::TrinoHttpClient;
use crate::config::ClientConfig;
use crate::models::{MissingField, ResultPage, Row, TrinoError};

pub const DEFAULT_SCHEMA: &str = "sf1";
pub const DEFAULT_CATALOG: &str = "tpch";
pub const DEFAULT_ROW_LIMIT: usize = 1000;

/// Where a session is in the lifecycle of its current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitted,
    Paging,
    Done,
    Failed,
}

/// Runs one query at a time against a coordinator and collects its rows by
/// following the server's continuation links.
///
/// All result state belongs to the instance; sessions never share rows or
/// continuation references. A session can be reused, and each new query starts
/// from a clean slate.
#[derive(Debug)]
pub struct QuerySession<T> {
    config: ClientConfig,
    transport: T,
    state: SessionState,
    rows: Vec<Row>,
    next_uri: Option<String>,
    last_page: Option<ResultPage>,
}

impl QuerySession<TrinoHttpClient> {
    /// Creates a session that talks HTTP to the coordinator in `config`.
    pub fn connect(config: ClientConfig) -> Result<Self, TrinoError> {
        let transport = TrinoHttpClient::new(config.clone())?;
        Ok(Self::new(config, transport))
    }
}

impl<T: StatementTransport> QuerySession<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            state: SessionState::Idle,
            rows: Vec::new(),
            next_uri: None,
            last_page: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Rows accumulated so far for the current query.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn continuation(&self) -> Option<&str> {
        self.next_uri.as_deref()
    }

    pub fn last_page(&self) -> Option<&ResultPage> {
        self.last_page.as_ref()
    }

    /// Submits `sql` against the default `tpch`.`sf1` schema.
    pub async fn execute_query(&mut self, sql: &str) -> Result<(), TrinoError> {
        self.execute_query_in(sql, DEFAULT_SCHEMA, DEFAULT_CATALOG)
            .await
    }

    /// Submits `sql` and records the first page of results.
    ///
    /// A transport failure leaves the session `Failed` and is returned as
    /// `TrinoError::Transport`; callers that poll should treat it as "not yet".
    pub async fn execute_query_in(
        &mut self,
        sql: &str,
        schema: &str,
        catalog: &str,
    ) -> Result<(), TrinoError> {
        self.validate(sql)?;
        self.clear_old_results();

        self.state = SessionState::Submitted;
        match self.transport.submit(sql, schema, catalog).await {
            Ok(page) => {
                self.record(page);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Collects the rest of the result set with the default row cutoff.
    pub async fn get_rows(&mut self) -> Result<Vec<Row>, TrinoError> {
        self.get_rows_up_to(DEFAULT_ROW_LIMIT).await
    }

    /// Follows continuation links until the server has no more pages, a fetch
    /// fails, or more than `limit` rows have been collected.
    ///
    /// `limit` is advisory: the last page is always kept whole, so the result
    /// may exceed it. A transport failure while paging discards every row
    /// collected so far and yields an empty result, so an empty result from a
    /// query known to return data signals failure.
    // TODO: confirm the discard-on-failure behavior against a live coordinator
    // before relying on it outside readiness checks.
    pub async fn get_rows_up_to(&mut self, limit: usize) -> Result<Vec<Row>, TrinoError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        while let Some(next_uri) = self.next_uri.clone() {
            if self.rows.len() > limit {
                debug!(
                    "Collected {} rows, above the limit of {}; stopping",
                    self.rows.len(),
                    limit
                );
                break;
            }

            match self.transport.follow(&next_uri).await {
                Ok(page) => self.record(page),
                Err(e) if e.is_transient() => {
                    warn!("Fetching {} failed, discarding partial results: {}", next_uri, e);
                    self.clear_old_results();
                    self.state = SessionState::Failed;
                    return Ok(Vec::new());
                }
                Err(e) => {
                    self.next_uri = None;
                    self.state = SessionState::Failed;
                    return Err(e);
                }
            }
        }

        Ok(self.rows.clone())
    }

    /// Abandons the current query. Does nothing once the result set is drained.
    pub async fn cancel(&mut self) -> Result<(), TrinoError> {
        let Some(next_uri) = self.next_uri.take() else {
            return Ok(());
        };

        info!("Cancelling query at {}", next_uri);
        self.state = SessionState::Done;
        self.transport.cancel(&next_uri).await
    }

    fn validate(&self, sql: &str) -> Result<(), TrinoError> {
        if sql.trim().is_empty() {
            return Err(TrinoError::InvalidArgument(MissingField::Sql));
        }
        if self.config.server.is_empty() {
            return Err(TrinoError::InvalidArgument(MissingField::Server));
        }
        if self.config.user.is_empty() {
            return Err(TrinoError::InvalidArgument(MissingField::User));
        }
        if matches!(self.config.port, None | Some(0)) {
            return Err(TrinoError::InvalidArgument(MissingField::Port));
        }
        Ok(())
    }

    fn clear_old_results(&mut self) {
        self.rows.clear();
        self.next_uri = None;
        self.last_page = None;
    }

    fn record(&mut self, page: ResultPage) {
        if let Some(error) = &page.error {
            warn!(
                "Server reported query failure {}: {}",
                error.error_name.as_deref().unwrap_or("UNKNOWN"),
                error.message
            );
        }

        self.rows.extend(page.rows.iter().cloned());
        self.next_uri = page.next_uri.clone();
        self.state = if self.next_uri.is_some() {
            SessionState::Paging
        } else {
            SessionState::Done
        };
        self.last_page = Some(page);
    }
}
