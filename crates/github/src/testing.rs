//! Test helpers: a scripted transport and discussion fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use steward_protocol::Discussion;

use crate::client::GraphQl;
use crate::error::{Error, Result};

/// A transport that replays scripted responses in order and records every
/// request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    /// Creates a transport answering with each `data` value in turn.
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Appends a failing response.
    pub fn then_fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns the `(document, variables)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the documents received so far that contain `needle`.
    pub fn requests_containing(&self, needle: &str) -> Vec<(String, Value)> {
        self.requests()
            .into_iter()
            .filter(|(document, _)| document.contains(needle))
            .collect()
    }
}

impl GraphQl for ScriptedTransport {
    fn execute(
        &self,
        document: &str,
        variables: Value,
    ) -> impl Future<Output = Result<Value>> + Send {
        self.requests
            .lock()
            .unwrap()
            .push((document.to_string(), variables));
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::malformed("no scripted response left")));
        async move { next }
    }
}

/// Fixed reference instant used by repository tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A fresh open, unanswered discussion with no labels.
pub fn discussion(id: &str) -> Discussion {
    Discussion {
        id: id.to_string(),
        number: 1,
        url: format!("https://github.com/owner/repo/discussions/{id}"),
        title: "A discussion".to_string(),
        body: String::new(),
        category: "General".to_string(),
        labels: Vec::new(),
        labelled: false,
        created_at: fixed_now(),
        updated_at: fixed_now(),
        is_answered: false,
        closed: false,
    }
}

/// A raw GraphQL discussion node.
pub fn discussion_node(
    id: &str,
    category: &str,
    labels: &[&str],
    updated_at: DateTime<Utc>,
    is_answered: Option<bool>,
) -> Value {
    json!({
        "id": id,
        "number": 7,
        "url": format!("https://github.com/owner/repo/discussions/{id}"),
        "title": format!("Discussion {id}"),
        "body": "Body",
        "createdAt": "2023-01-01T00:00:00Z",
        "updatedAt": updated_at.to_rfc3339(),
        "isAnswered": is_answered,
        "closed": false,
        "category": { "name": category },
        "labels": { "nodes": labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>() },
    })
}

/// A single-page connection response at `path` (e.g. `["search"]`).
pub fn connection(path: &[&str], nodes: Vec<Value>) -> Value {
    let mut value = json!({
        "nodes": nodes,
        "pageInfo": { "hasNextPage": false, "endCursor": null }
    });
    for key in path.iter().rev() {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert((*key).to_string(), value);
        value = Value::Object(wrapper);
    }
    value
}
