//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::api::statements::StatementTransport;
use crate::models::{ResultPage, Row, TrinoError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Submit {
        sql: String,
        schema: String,
        catalog: String,
    },
    Follow(String),
    Cancel(String),
}

type Responder = Box<dyn Fn(&Call) -> Result<ResultPage, TrinoError>>;

/// A `StatementTransport` that answers from a script and records every call.
pub(crate) struct ScriptedTransport {
    responder: Responder,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responder: impl Fn(&Call) -> Result<ResultPage, TrinoError> + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replays `outcomes` in order. Once they run out every call fails at the
    /// transport level.
    pub(crate) fn queued(outcomes: Vec<Result<ResultPage, TrinoError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(outcomes));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TrinoError::Transport("script exhausted".into())))
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(&self, call: Call) -> Result<ResultPage, TrinoError> {
        let outcome = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        outcome
    }
}

impl StatementTransport for ScriptedTransport {
    async fn submit(
        &self,
        sql: &str,
        schema: &str,
        catalog: &str,
    ) -> Result<ResultPage, TrinoError> {
        self.answer(Call::Submit {
            sql: sql.to_string(),
            schema: schema.to_string(),
            catalog: catalog.to_string(),
        })
    }

    async fn follow(&self, next_uri: &str) -> Result<ResultPage, TrinoError> {
        self.answer(Call::Follow(next_uri.to_string()))
    }

    async fn cancel(&self, next_uri: &str) -> Result<(), TrinoError> {
        self.answer(Call::Cancel(next_uri.to_string())).map(|_| ())
    }
}

pub(crate) fn page(rows: Vec<Row>, next_uri: Option<&str>) -> Result<ResultPage, TrinoError> {
    Ok(ResultPage {
        rows,
        next_uri: next_uri.map(str::to_string),
        ..Default::default()
    })
}

pub(crate) fn rows_of(values: &[i64]) -> Vec<Row> {
    values.iter().map(|v| vec![Value::from(*v)]).collect()
}

pub(crate) fn transport_failure() -> Result<ResultPage, TrinoError> {
    Err(TrinoError::Transport("connection refused".into()))
}
