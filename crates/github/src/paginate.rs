//! Cursor-based pagination over GraphQL connections.
//!
//! Paginated documents declare a `$cursor: String` variable and pass it as
//! `after: $cursor` to a connection field shaped like
//! `{ nodes: [...], pageInfo: { hasNextPage, endCursor } }`. [`Pages`]
//! substitutes the last seen `endCursor` into that variable before each
//! request and stops once `hasNextPage` is false.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use steward_github::{GitHubClient, paginate::{self, DEFAULT_MAX_PAGES}, query};
//!
//! # async fn example(client: &GitHubClient) -> steward_github::Result<()> {
//! let nodes = paginate::fetch_all(
//!     client,
//!     query::DISCUSSION_CATEGORIES,
//!     json!({ "owner": "rust-lang", "name": "rust" }),
//!     "/repository/discussionCategories",
//!     DEFAULT_MAX_PAGES,
//! )
//! .await?;
//! println!("{} categories", nodes.len());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::GraphQl;
use crate::error::{Error, Result};

/// Default bound on the number of pages fetched by one call.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Name of the variable the cursor is substituted into.
pub const CURSOR_VARIABLE: &str = "cursor";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    #[serde(default)]
    nodes: Vec<Value>,
    page_info: PageInfo,
}

/// A single-pass cursor over the pages of a connection.
///
/// Each call to [`next_page`](Self::next_page) issues one request. Once the
/// last page has been returned, or any request has failed, the cursor is
/// finished and yields `None`. It cannot be restarted.
#[derive(Debug)]
pub struct Pages<'a, T: ?Sized> {
    transport: &'a T,
    document: &'a str,
    variables: Value,
    path: &'a str,
    max_pages: usize,
    fetched: usize,
    cursor: Option<String>,
    finished: bool,
}

impl<'a, T: GraphQl + ?Sized> Pages<'a, T> {
    /// Creates a cursor over the connection at `path`.
    ///
    /// `path` is a JSON pointer into the response `data`, e.g.
    /// `"/repository/discussionCategories"`. `variables` must be a JSON
    /// object (or `null`); the cursor variable is added to it.
    #[must_use]
    pub fn new(
        transport: &'a T,
        document: &'a str,
        variables: Value,
        path: &'a str,
        max_pages: usize,
    ) -> Self {
        Self {
            transport,
            document,
            variables,
            path,
            max_pages,
            fetched: 0,
            cursor: None,
            finished: false,
        }
    }

    /// Returns the number of pages fetched so far.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the connection is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::PaginationExhausted`] if more than `max_pages` pages would
    ///   be needed
    /// - [`Error::MalformedResponse`] if the connection is missing, or a page
    ///   claims a successor without a fresh `endCursor`
    /// - any transport error
    ///
    /// After an error the cursor is finished.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.fetch_next().await;
        if result.is_err() {
            self.finished = true;
        }
        result.map(Some)
    }

    async fn fetch_next(&mut self) -> Result<Vec<Value>> {
        if self.fetched >= self.max_pages {
            return Err(Error::PaginationExhausted {
                max_pages: self.max_pages,
            });
        }

        let mut variables = match &self.variables {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(Error::QueryConstruction {
                    reason: format!("variables must be an object, got {other}"),
                });
            }
        };
        variables.insert(
            CURSOR_VARIABLE.to_string(),
            self.cursor.clone().map_or(Value::Null, Value::String),
        );

        debug!(
            page = self.fetched + 1,
            cursor = ?self.cursor,
            path = self.path,
            "fetching page"
        );
        let data = self
            .transport
            .execute(self.document, Value::Object(variables))
            .await?;
        self.fetched += 1;

        let connection = data
            .pointer(self.path)
            .filter(|v| !v.is_null())
            .ok_or_else(|| Error::malformed(format!("no connection at {}", self.path)))?;
        let page: Connection = serde_json::from_value(connection.clone())
            .map_err(|e| Error::malformed(format!("bad connection at {}: {e}", self.path)))?;

        if page.page_info.has_next_page {
            match page.page_info.end_cursor {
                None => {
                    return Err(Error::malformed(
                        "page reports a next page without an end cursor",
                    ));
                }
                Some(next) if self.cursor.as_deref() == Some(next.as_str()) => {
                    return Err(Error::malformed(format!("cursor {next} did not advance")));
                }
                Some(next) => self.cursor = Some(next),
            }
        } else {
            self.finished = true;
        }

        Ok(page.nodes)
    }
}

/// Fetches every page of a connection and concatenates the nodes in page
/// order.
///
/// Fails as a whole if any page fails; no partial result is returned.
///
/// # Errors
///
/// See [`Pages::next_page`].
#[instrument(skip(transport, document, variables), fields(path = %path))]
pub async fn fetch_all<T: GraphQl + ?Sized>(
    transport: &T,
    document: &str,
    variables: Value,
    path: &str,
    max_pages: usize,
) -> Result<Vec<Value>> {
    let mut pages = Pages::new(transport, document, variables, path, max_pages);
    let mut nodes = Vec::new();
    while let Some(page) = pages.next_page().await? {
        nodes.extend(page);
    }
    debug!(pages = pages.fetched(), count = nodes.len(), "fetched all pages");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use proptest::prelude::*;
    use serde_json::json;

    const PATH: &str = "/repository/items";

    fn page(nodes: Vec<Value>, next: Option<&str>) -> Value {
        json!({
            "repository": {
                "items": {
                    "nodes": nodes,
                    "pageInfo": {
                        "hasNextPage": next.is_some(),
                        "endCursor": next,
                    }
                }
            }
        })
    }

    fn script(layout: &[usize]) -> (Vec<Value>, Vec<Value>) {
        let mut responses = Vec::new();
        let mut expected = Vec::new();
        let mut id = 0;
        for (i, &len) in layout.iter().enumerate() {
            let nodes: Vec<Value> = (0..len)
                .map(|_| {
                    id += 1;
                    json!({ "id": id })
                })
                .collect();
            expected.extend(nodes.clone());
            let cursor = format!("c{i}");
            let next = (i + 1 < layout.len()).then_some(cursor.as_str());
            responses.push(page(nodes, next));
        }
        (responses, expected)
    }

    #[tokio::test]
    async fn single_page() {
        let transport = ScriptedTransport::new(vec![page(vec![json!(1), json!(2)], None)]);
        let nodes = fetch_all(&transport, "doc", json!({}), PATH, 5).await.unwrap();
        assert_eq!(nodes, vec![json!(1), json!(2)]);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn cursor_is_substituted_from_previous_page() {
        let transport = ScriptedTransport::new(vec![
            page(vec![json!(1)], Some("abc")),
            page(vec![json!(2)], Some("def")),
            page(vec![json!(3)], None),
        ]);
        let nodes = fetch_all(&transport, "doc", json!({"owner": "o"}), PATH, 5)
            .await
            .unwrap();
        assert_eq!(nodes, vec![json!(1), json!(2), json!(3)]);

        let requests = transport.requests();
        assert_eq!(requests[0].1, json!({"owner": "o", "cursor": null}));
        assert_eq!(requests[1].1, json!({"owner": "o", "cursor": "abc"}));
        assert_eq!(requests[2].1, json!({"owner": "o", "cursor": "def"}));
    }

    #[tokio::test]
    async fn exceeding_bound_fails() {
        let transport = ScriptedTransport::new(vec![
            page(vec![json!(1)], Some("a")),
            page(vec![json!(2)], Some("b")),
            page(vec![json!(3)], None),
        ]);
        let err = fetch_all(&transport, "doc", json!({}), PATH, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PaginationExhausted { max_pages: 2 }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn exactly_at_bound_succeeds() {
        let transport = ScriptedTransport::new(vec![
            page(vec![json!(1)], Some("a")),
            page(vec![json!(2)], None),
        ]);
        let nodes = fetch_all(&transport, "doc", json!({}), PATH, 2).await.unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[tokio::test]
    async fn repeated_cursor_is_a_contract_violation() {
        let transport = ScriptedTransport::new(vec![
            page(vec![json!(1)], Some("same")),
            page(vec![json!(2)], Some("same")),
        ]);
        let err = fetch_all(&transport, "doc", json!({}), PATH, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn missing_end_cursor_is_a_contract_violation() {
        let transport = ScriptedTransport::new(vec![json!({
            "repository": { "items": {
                "nodes": [],
                "pageInfo": { "hasNextPage": true, "endCursor": null }
            }}
        })]);
        let err = fetch_all(&transport, "doc", json!({}), PATH, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn failure_mid_loop_returns_no_partial_result() {
        let transport = ScriptedTransport::new(vec![page(vec![json!(1)], Some("a"))])
            .then_fail(Error::GraphQl {
                messages: vec!["timeout".to_string()],
            });
        let err = fetch_all(&transport, "doc", json!({}), PATH, 10)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn pages_are_single_pass() {
        let transport = ScriptedTransport::new(vec![page(vec![json!(1)], None)]);
        let mut pages = Pages::new(&transport, "doc", json!({}), PATH, 5);
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![json!(1)]));
        assert_eq!(pages.next_page().await.unwrap(), None);
        assert_eq!(pages.next_page().await.unwrap(), None);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_connection_is_malformed() {
        let transport = ScriptedTransport::new(vec![json!({ "repository": null })]);
        let err = fetch_all(&transport, "doc", json!({}), PATH, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn non_object_variables_are_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        let err = fetch_all(&transport, "doc", json!([1, 2]), PATH, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueryConstruction { .. }));
        assert!(transport.requests().is_empty());
    }

    proptest! {
        #[test]
        fn fetch_all_concatenates_pages_in_order(layout in prop::collection::vec(0usize..6, 1..8)) {
            let (responses, expected) = script(&layout);
            let transport = ScriptedTransport::new(responses);
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let nodes = runtime
                .block_on(fetch_all(&transport, "doc", json!({}), PATH, layout.len()))
                .unwrap();
            prop_assert_eq!(nodes, expected);
            prop_assert_eq!(transport.requests().len(), layout.len());
        }
    }
}
