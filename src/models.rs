use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One result row. Column values are left as raw JSON; the client never
/// interprets column types.
pub type Row = Vec<serde_json::Value>;

/// Response body returned by `POST /v1/statement` and by every `GET <nextUri>`.
///
/// Only `data` and `nextUri` drive pagination. The remaining fields are kept
/// for diagnostics.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_cancel_uri: Option<String>,
    /// Absolute URL of the next page, absent once the query has no more data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

/// Failure details a server attaches to a query that failed on its side.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryError {
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
}

/// The rows and continuation reference carried by one response envelope.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultPage {
    pub rows: Vec<Row>,
    pub next_uri: Option<String>,
    pub query_id: Option<String>,
    pub error: Option<QueryError>,
}

impl ResultPage {
    /// Parses a raw response body. Anything that is not a JSON object of the
    /// expected shape is a protocol failure.
    pub fn from_body(body: &str) -> Result<Self, TrinoError> {
        let results: QueryResults = serde_json::from_str(body)
            .map_err(|e| TrinoError::Protocol(format!("JSON parse error: {}", e)))?;
        Ok(results.into())
    }

    pub fn has_next(&self) -> bool {
        self.next_uri.is_some()
    }
}

impl From<QueryResults> for ResultPage {
    fn from(results: QueryResults) -> Self {
        Self {
            rows: results.data.unwrap_or_default(),
            // An empty string is not a usable link.
            next_uri: results.next_uri.filter(|uri| !uri.is_empty()),
            query_id: results.id,
            error: results.error,
        }
    }
}

/// Required query parameters, named in `TrinoError::InvalidArgument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Sql,
    Server,
    User,
    Port,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Sql => "SQL query",
            MissingField::Server => "server address",
            MissingField::User => "user name",
            MissingField::Port => "port",
        };
        f.write_str(name)
    }
}

/// Possible errors encountered by the Trino client and readiness checks.
#[derive(Error, Debug)]
pub enum TrinoError {
    #[error("{0} missing")]
    InvalidArgument(MissingField),

    /// Connection error or non-success HTTP status. Recoverable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a body that is not a statement envelope.
    #[error("protocol failure: {0}")]
    Protocol(String),

    #[error("{check} not ready after {elapsed:?} ({attempts} attempts); last observed: {last_observed}")]
    ReadinessTimeout {
        check: String,
        elapsed: Duration,
        attempts: usize,
        last_observed: String,
    },

    #[error("{check}: expected {expected} but got {actual}")]
    Validation {
        check: String,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrinoError {
    /// True for failures a retry loop should absorb rather than abort on.
    pub fn is_transient(&self) -> bool {
        matches!(self, TrinoError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_data_and_next_uri() {
        let page = ResultPage::from_body(r#"{"data":[[1],[2]],"nextUri":"u2"}"#).unwrap();
        assert_eq!(page.rows, vec![vec![json!(1)], vec![json!(2)]]);
        assert_eq!(page.next_uri.as_deref(), Some("u2"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let body = r#"{"id":"q1","columns":[{"name":"x"}],"stats":{"state":"RUNNING"}}"#;
        let page = ResultPage::from_body(body).unwrap();
        assert!(page.rows.is_empty());
        assert!(!page.has_next());
        assert_eq!(page.query_id.as_deref(), Some("q1"));
    }

    #[test]
    fn empty_next_uri_means_no_continuation() {
        let page = ResultPage::from_body(r#"{"nextUri":""}"#).unwrap();
        assert_eq!(page.next_uri, None);
    }

    #[test]
    fn keeps_server_side_error() {
        let body = r#"{"error":{"message":"line 1:1: mismatched input","errorName":"SYNTAX_ERROR"}}"#;
        let page = ResultPage::from_body(body).unwrap();
        let error = page.error.unwrap();
        assert_eq!(error.error_name.as_deref(), Some("SYNTAX_ERROR"));
    }

    #[test]
    fn malformed_body_is_protocol_failure() {
        let err = ResultPage::from_body("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, TrinoError::Protocol(_)));
        assert!(!err.is_transient());

        let err = ResultPage::from_body("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TrinoError::Protocol(_)));
    }

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(TrinoError::Transport("refused".into()).is_transient());
        assert!(!TrinoError::InvalidArgument(MissingField::Port).is_transient());
        assert_eq!(
            TrinoError::InvalidArgument(MissingField::User).to_string(),
            "user name missing"
        );
    }
}
