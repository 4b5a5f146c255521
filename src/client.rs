use reqwest::Client;
use tracing::{debug, error, info};

use crate::api::statements::StatementTransport;
use crate::config::ClientConfig;
use crate::models::{MissingField, ResultPage, TrinoError};

pub const STATEMENT_PATH: &str = "/v1/statement";
pub const CATALOG_HEADER: &str = "X-Trino-Catalog";
pub const SCHEMA_HEADER: &str = "X-Trino-Schema";
pub const USER_HEADER: &str = "X-Trino-User";

/// Low-level Trino client that directly calls the statement REST endpoints.
#[derive(Debug, Clone)]
pub struct TrinoHttpClient {
    config: ClientConfig,
    http_client: Client,
}

impl TrinoHttpClient {
    /// Creates a client for the coordinator described by `config`. Every
    /// request is bounded by `config.request_timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, TrinoError> {
        let http_client = Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Turns an HTTP response into a page: non-success status is a transport
    /// failure, an unparseable body is a protocol failure.
    async fn handle_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<ResultPage, TrinoError> {
        let status = resp.status();
        let text_body = resp
            .text()
            .await
            .map_err(|e| TrinoError::Transport(format!("reading response body: {}", e)))?;

        if !status.is_success() {
            error!("Connection error: {} {}", status, text_body);
            return Err(TrinoError::Transport(format!("HTTP {}: {}", status, text_body)));
        }

        ResultPage::from_body(&text_body).map_err(|e| {
            error!("Unparseable response from server: {}", text_body);
            e
        })
    }
}

impl StatementTransport for TrinoHttpClient {
    async fn submit(
        &self,
        sql: &str,
        schema: &str,
        catalog: &str,
    ) -> Result<ResultPage, TrinoError> {
        let base_url = match self.config.base_url() {
            Some(url) => url,
            None if self.config.server.is_empty() => {
                return Err(TrinoError::InvalidArgument(MissingField::Server))
            }
            None => return Err(TrinoError::InvalidArgument(MissingField::Port)),
        };
        let url = format!("{}{}", base_url, STATEMENT_PATH);

        info!(
            "Connecting to server at: {} as user {}",
            base_url, self.config.user
        );

        let resp = self
            .http_client
            .post(&url)
            .header(CATALOG_HEADER, catalog)
            .header(SCHEMA_HEADER, schema)
            .header(USER_HEADER, &self.config.user)
            .body(sql.to_string())
            .send()
            .await
            .map_err(|e| {
                error!("Error connecting to trino server at: {}: {}", base_url, e);
                TrinoError::Transport(e.to_string())
            })?;

        let page = self.handle_response(resp).await?;
        info!("Query executed successfully");
        Ok(page)
    }

    async fn follow(&self, next_uri: &str) -> Result<ResultPage, TrinoError> {
        let resp = self
            .http_client
            .get(next_uri)
            .header(USER_HEADER, &self.config.user)
            .send()
            .await
            .map_err(|e| {
                error!("Error opening the trino response uri {}: {}", next_uri, e);
                TrinoError::Transport(e.to_string())
            })?;

        let page = self.handle_response(resp).await?;
        debug!("GET request successful for uri: {}", next_uri);
        Ok(page)
    }

    async fn cancel(&self, next_uri: &str) -> Result<(), TrinoError> {
        let resp = self
            .http_client
            .delete(next_uri)
            .header(USER_HEADER, &self.config.user)
            .send()
            .await
            .map_err(|e| TrinoError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TrinoError::Transport(format!("HTTP {}: {}", status, body)));
        }

        info!("Cancelled query at {}", next_uri);
        Ok(())
    }
}
