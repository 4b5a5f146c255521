use crate::models::{ResultPage, TrinoError};

/// The statement protocol as seen by a query session. Implementations own
/// connection handling and timeouts; they never retry.
pub trait StatementTransport {
    /// POST /v1/statement
    /// Submit `sql` against `catalog`.`schema` and return the first page.
    async fn submit(
        &self,
        sql: &str,
        schema: &str,
        catalog: &str,
    ) -> Result<ResultPage, TrinoError>;

    /// GET {next_uri}
    /// Fetch the page behind a continuation reference from a prior response.
    async fn follow(&self, next_uri: &str) -> Result<ResultPage, TrinoError>;

    /// DELETE {next_uri}
    /// Ask the server to abandon the query behind a continuation reference.
    async fn cancel(&self, next_uri: &str) -> Result<(), TrinoError>;
}
