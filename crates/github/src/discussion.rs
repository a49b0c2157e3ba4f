//! Discussion and category repository.
//!
//! [`DiscussionRepository`] is bound to one GitHub repository. It builds the
//! query documents, maps raw GraphQL nodes into [`Discussion`] and
//! [`Category`] snapshots, applies the lifecycle predicates from
//! [`classify`](crate::classify), and issues mutations.
//!
//! # Dormancy policy
//!
//! Dormancy is handled in two stages:
//!
//! 1. [`dormant_candidates`](DiscussionRepository::dormant_candidates) selects
//!    quiet, unanswered discussions; the caller marks them with
//!    [`mark_inactive`](DiscussionRepository::mark_inactive).
//! 2. [`closable`](DiscussionRepository::closable) selects discussions that
//!    carry the inactivity label and stayed quiet for a further grace period;
//!    the caller closes them.
//!
//! Incident discussions are never part of either stage.
//!
//! # Example
//!
//! ```no_run
//! use secrecy::SecretString;
//! use steward_github::{DiscussionRepository, GitHubClient, LifecyclePolicy};
//!
//! # async fn example() -> steward_github::Result<()> {
//! let client = GitHubClient::new(SecretString::from("ghp_xxx".to_string()))?;
//! let repo = DiscussionRepository::new(&client, "owner", "repo", LifecyclePolicy::default());
//!
//! for discussion in repo.dormant_candidates(60).await? {
//!     repo.mark_inactive(&discussion, "This discussion has gone quiet.").await?;
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use steward_protocol::{Category, CloseReason, Comment, Discussion, LifecycleLabels};
use tracing::{debug, info, instrument};

use crate::classify;
use crate::client::GraphQl;
use crate::error::{Error, Result};
use crate::paginate::{self, DEFAULT_MAX_PAGES};
use crate::query::{self, SearchQuery};

/// Default automation identity, as GraphQL reports the Actions bot.
pub const DEFAULT_BOT_LOGIN: &str = "github-actions";

/// Default name of the category holding incident discussions.
pub const DEFAULT_INCIDENT_CATEGORY: &str = "Incidents";

/// Settings that shape classification and mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Governed label names.
    pub labels: LifecycleLabels,
    /// Category holding incident discussions.
    pub incident_category: String,
    /// Login of the automation identity.
    pub bot_login: String,
    /// Bound on pages fetched by one paginated query.
    pub max_pages: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            labels: LifecycleLabels::default(),
            incident_category: DEFAULT_INCIDENT_CATEGORY.to_string(),
            bot_login: DEFAULT_BOT_LOGIN.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Result of a state-changing mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The mutation changed remote state.
    Applied,
    /// Remote state already matched; nothing was sent.
    Unchanged,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDiscussion {
    id: String,
    number: u64,
    url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    is_answered: Option<bool>,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    category: Option<Named>,
    #[serde(default)]
    labels: Option<Nodes<Named>>,
}

impl RawDiscussion {
    fn into_discussion(self, inactive_label: &str) -> Discussion {
        let labels: Vec<String> = self
            .labels
            .map(|l| l.nodes.into_iter().map(|n| n.name).collect())
            .unwrap_or_default();
        let labelled = labels.iter().any(|l| l.eq_ignore_ascii_case(inactive_label));

        Discussion {
            id: self.id,
            number: self.number,
            url: self.url,
            title: self.title,
            body: self.body.unwrap_or_default(),
            category: self.category.map(|c| c.name).unwrap_or_default(),
            labels,
            labelled,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_answered: self.is_answered.unwrap_or(false),
            closed: self.closed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    id: String,
    name: String,
    #[serde(default)]
    is_answerable: bool,
}

#[derive(Debug, Deserialize)]
struct Author {
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComment {
    id: String,
    #[serde(default)]
    body: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    author: Option<Author>,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Self {
            id: raw.id,
            author: raw.author.map(|a| a.login),
            body: raw.body,
            created_at: raw.created_at,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::malformed(format!("bad {what}: {e}")))
}

/// Queries and mutates the discussions of one repository.
#[derive(Debug)]
pub struct DiscussionRepository<T> {
    transport: T,
    owner: String,
    name: String,
    policy: LifecyclePolicy,
    clock: Option<DateTime<Utc>>,
}

impl<T: GraphQl> DiscussionRepository<T> {
    /// Creates a repository bound to `owner/name`.
    #[must_use]
    pub fn new(
        transport: T,
        owner: impl Into<String>,
        name: impl Into<String>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            transport,
            owner: owner.into(),
            name: name.into(),
            policy,
            clock: None,
        }
    }

    /// Pins the reference instant used for age computations.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Returns the reference instant for age computations.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Returns the repository in `"owner/name"` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Returns the lifecycle policy.
    #[must_use]
    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn base_query(&self) -> Result<SearchQuery> {
        SearchQuery::discussions_in(&self.owner, &self.name)
    }

    fn is_incident(&self, discussion: &Discussion) -> bool {
        classify::is_incident(
            discussion,
            &self.policy.incident_category,
            &self.policy.labels.incident,
        )
    }

    /// Lists every discussion category of the repository.
    ///
    /// # Errors
    ///
    /// Returns transport and pagination errors.
    #[instrument(skip(self), fields(repo = %self.full_name()))]
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let nodes = paginate::fetch_all(
            &self.transport,
            query::DISCUSSION_CATEGORIES,
            json!({ "owner": self.owner, "name": self.name }),
            "/repository/discussionCategories",
            self.policy.max_pages,
        )
        .await?;

        let categories = nodes
            .into_iter()
            .map(|node| {
                let raw: RawCategory = decode(node, "category")?;
                Ok(Category {
                    id: raw.id,
                    name: raw.name,
                    answerable: raw.is_answerable,
                    discussions: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = categories.len(), "listed categories");
        Ok(categories)
    }

    /// Runs a discussion search and returns every matching discussion.
    ///
    /// # Errors
    ///
    /// Returns transport and pagination errors.
    #[instrument(skip(self, search), fields(repo = %self.full_name()))]
    pub async fn search(&self, search: &SearchQuery) -> Result<Vec<Discussion>> {
        let search = search.build();
        debug!(query = %search, "searching discussions");
        let nodes = paginate::fetch_all(
            &self.transport,
            query::SEARCH_DISCUSSIONS,
            json!({ "query": search }),
            "/search",
            self.policy.max_pages,
        )
        .await?;

        nodes
            .into_iter()
            // Search results of other types come back as empty objects
            .filter(|node| node.get("id").is_some())
            .map(|node| {
                decode::<RawDiscussion>(node, "discussion")
                    .map(|raw| raw.into_discussion(&self.policy.labels.inactive))
            })
            .collect()
    }

    /// Re-reads a discussion by node id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the id does not resolve to a
    /// discussion, and transport errors.
    #[instrument(skip(self))]
    pub async fn discussion(&self, id: &str) -> Result<Discussion> {
        let data = self
            .transport
            .execute(query::DISCUSSION_BY_ID, json!({ "id": id }))
            .await?;
        let node = data
            .get("node")
            .filter(|n| n.get("id").is_some())
            .cloned()
            .ok_or_else(|| Error::malformed(format!("{id} is not a discussion")))?;
        let raw: RawDiscussion = decode(node, "discussion")?;
        Ok(raw.into_discussion(&self.policy.labels.inactive))
    }

    /// Returns open, unanswered questions in answerable categories that saw
    /// activity within the last `max_age_days` days.
    ///
    /// Questions are discussions carrying the governed question label. All
    /// category filters are built before the first search is sent, so a
    /// category name that cannot be quoted fails without partial results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] for unrepresentable category
    /// names, and transport and pagination errors.
    #[instrument(skip(self), fields(repo = %self.full_name()))]
    pub async fn all_unanswered_questions(&self, max_age_days: u32) -> Result<Vec<Discussion>> {
        let now = self.now();
        let since = (now - Duration::days(i64::from(max_age_days) + 1)).date_naive();
        let question = &self.policy.labels.question;

        let mut categories: Vec<Category> = self
            .categories()
            .await?
            .into_iter()
            .filter(|c| c.answerable)
            .collect();

        let queries = categories
            .iter()
            .map(|category| {
                Ok(self
                    .base_query()?
                    .open()
                    .unanswered()
                    .category(&category.name)?
                    .label(question)?
                    .updated_on_or_after(since))
            })
            .collect::<Result<Vec<_>>>()?;

        for (category, search) in categories.iter_mut().zip(&queries) {
            category.discussions = self
                .search(search)
                .await?
                .into_iter()
                .filter(|d| d.category == category.name)
                .filter(|d| {
                    classify::is_recent_unanswered_question(d, question, max_age_days, now)
                })
                .collect();
            debug!(
                category = %category.name,
                count = category.discussions.len(),
                "unanswered questions in category"
            );
        }

        let questions: Vec<Discussion> = categories
            .into_iter()
            .flat_map(|c| c.discussions)
            .collect();
        info!(count = questions.len(), "found unanswered questions");
        Ok(questions)
    }

    /// Returns discussions that should receive the inactivity label.
    ///
    /// Open, unanswered, not labelled inactive, outside the incident category,
    /// and quiet for at least `inactivity_threshold_days` days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if a configured label or category
    /// name cannot be quoted, and transport and pagination errors.
    #[instrument(skip(self), fields(repo = %self.full_name()))]
    pub async fn dormant_candidates(&self, inactivity_threshold_days: u32) -> Result<Vec<Discussion>> {
        let now = self.now();
        let cutoff = (now - Duration::days(i64::from(inactivity_threshold_days))).date_naive();
        let search = self
            .base_query()?
            .open()
            .not_label(&self.policy.labels.inactive)?
            .not_category(&self.policy.incident_category)?
            .updated_on_or_before(cutoff);

        let candidates: Vec<Discussion> = self
            .search(&search)
            .await?
            .into_iter()
            .filter(|d| !self.is_incident(d))
            .filter(|d| classify::is_dormant(d, inactivity_threshold_days, now))
            .collect();
        info!(count = candidates.len(), "found dormant candidates");
        Ok(candidates)
    }

    /// Returns discussions ready to be closed.
    ///
    /// Open discussions already carrying the inactivity label that stayed
    /// quiet for at least `inactive_label_age_days` days. A discussion that
    /// never received the label is never closable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryConstruction`] if a configured label or category
    /// name cannot be quoted, and transport and pagination errors.
    #[instrument(skip(self), fields(repo = %self.full_name()))]
    pub async fn closable(&self, inactive_label_age_days: u32) -> Result<Vec<Discussion>> {
        let now = self.now();
        let cutoff = (now - Duration::days(i64::from(inactive_label_age_days))).date_naive();
        let search = self
            .base_query()?
            .open()
            .label(&self.policy.labels.inactive)?
            .not_category(&self.policy.incident_category)?
            .updated_on_or_before(cutoff);

        let closable: Vec<Discussion> = self
            .search(&search)
            .await?
            .into_iter()
            .filter(|d| !self.is_incident(d))
            .filter(|d| classify::is_closable(d, inactive_label_age_days, now))
            .collect();
        info!(count = closable.len(), "found closable discussions");
        Ok(closable)
    }

    /// Lists every comment on a discussion, oldest first.
    ///
    /// # Errors
    ///
    /// Returns transport and pagination errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn comments(&self, discussion: &Discussion) -> Result<Vec<Comment>> {
        let nodes = paginate::fetch_all(
            &self.transport,
            query::DISCUSSION_COMMENTS,
            json!({ "id": discussion.id }),
            "/node/comments",
            self.policy.max_pages,
        )
        .await?;

        nodes
            .into_iter()
            .map(|node| decode::<RawComment>(node, "comment").map(Comment::from))
            .collect()
    }

    /// Returns `true` if the automation identity has commented on the
    /// discussion.
    ///
    /// Callers check this before [`post_comment`](Self::post_comment) to
    /// avoid duplicate acknowledgements.
    ///
    /// # Errors
    ///
    /// Returns transport and pagination errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn has_bot_commented(&self, discussion: &Discussion) -> Result<bool> {
        let comments = self.comments(discussion).await?;
        let commented = classify::any_comment_by(&comments, &self.policy.bot_login);
        debug!(comments = comments.len(), commented, "checked for bot comment");
        Ok(commented)
    }

    /// Resolves a label name to its node id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelNotFound`] if the repository has no such label,
    /// and transport errors.
    #[instrument(skip(self), fields(repo = %self.full_name()))]
    pub async fn label_id(&self, label: &str) -> Result<String> {
        let data = self
            .transport
            .execute(
                query::LABEL_BY_NAME,
                json!({ "owner": self.owner, "name": self.name, "label": label }),
            )
            .await?;

        match data.pointer("/repository/label/id").and_then(Value::as_str) {
            Some(id) => Ok(id.to_string()),
            None => Err(Error::LabelNotFound {
                name: label.to_string(),
            }),
        }
    }

    /// Adds a label to a discussion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelNotFound`] if the label does not exist, and
    /// transport errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn apply_label(&self, discussion: &Discussion, label: &str) -> Result<()> {
        let label_id = self.label_id(label).await?;
        self.transport
            .execute(
                query::ADD_LABELS,
                json!({ "id": discussion.id, "labelIds": [label_id] }),
            )
            .await?;
        debug!("applied label");
        Ok(())
    }

    /// Removes a label from a discussion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelNotFound`] if the label does not exist, and
    /// transport errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn remove_label(&self, discussion: &Discussion, label: &str) -> Result<()> {
        let label_id = self.label_id(label).await?;
        self.transport
            .execute(
                query::REMOVE_LABELS,
                json!({ "id": discussion.id, "labelIds": [label_id] }),
            )
            .await?;
        debug!("removed label");
        Ok(())
    }

    /// Posts a comment on a discussion.
    ///
    /// Not idempotent: calling this twice posts two comments.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    #[instrument(skip(self, discussion, body), fields(discussion = %discussion.id))]
    pub async fn post_comment(&self, discussion: &Discussion, body: &str) -> Result<Comment> {
        let data = self
            .transport
            .execute(
                query::ADD_COMMENT,
                json!({ "id": discussion.id, "body": body }),
            )
            .await?;
        let node = data
            .pointer("/addDiscussionComment/comment")
            .cloned()
            .ok_or_else(|| Error::malformed("addDiscussionComment returned no comment"))?;
        let comment = decode::<RawComment>(node, "comment")?.into();
        debug!("posted comment");
        Ok(comment)
    }

    /// Replaces the body of a discussion.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    #[instrument(skip(self, discussion, body), fields(discussion = %discussion.id))]
    pub async fn update_body(&self, discussion: &Discussion, body: &str) -> Result<()> {
        self.transport
            .execute(
                query::UPDATE_DISCUSSION_BODY,
                json!({ "id": discussion.id, "body": body }),
            )
            .await?;
        debug!("updated body");
        Ok(())
    }

    /// Closes a discussion.
    ///
    /// The current state is re-read first; closing an already closed
    /// discussion sends nothing and returns [`MutationOutcome::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn close(
        &self,
        discussion: &Discussion,
        reason: CloseReason,
    ) -> Result<MutationOutcome> {
        if self.discussion(&discussion.id).await?.closed {
            debug!("discussion already closed");
            return Ok(MutationOutcome::Unchanged);
        }

        self.transport
            .execute(
                query::CLOSE_DISCUSSION,
                json!({ "id": discussion.id, "reason": reason.as_graphql() }),
            )
            .await?;
        info!(url = %discussion.url, reason = ?reason, "closed discussion");
        Ok(MutationOutcome::Applied)
    }

    /// Reopens a discussion.
    ///
    /// Reopening an open discussion sends nothing and returns
    /// [`MutationOutcome::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    #[instrument(skip(self, discussion), fields(discussion = %discussion.id))]
    pub async fn reopen(&self, discussion: &Discussion) -> Result<MutationOutcome> {
        if !self.discussion(&discussion.id).await?.closed {
            debug!("discussion already open");
            return Ok(MutationOutcome::Unchanged);
        }

        self.transport
            .execute(query::REOPEN_DISCUSSION, json!({ "id": discussion.id }))
            .await?;
        info!(url = %discussion.url, "reopened discussion");
        Ok(MutationOutcome::Applied)
    }

    /// Applies the inactivity label, then posts `comment`.
    ///
    /// # Errors
    ///
    /// If labelling fails nothing was changed and that error is returned as
    /// is. If the comment fails after the label was applied, returns
    /// [`Error::PartialMutation`] naming the completed step.
    #[instrument(skip(self, discussion, comment), fields(discussion = %discussion.id))]
    pub async fn mark_inactive(&self, discussion: &Discussion, comment: &str) -> Result<()> {
        let label = &self.policy.labels.inactive;
        self.apply_label(discussion, label).await?;

        if let Err(source) = self.post_comment(discussion, comment).await {
            return Err(Error::PartialMutation {
                completed: vec![format!("apply label {label}")],
                failed: "post comment".to_string(),
                source: Box::new(source),
            });
        }

        info!(url = %discussion.url, "marked discussion inactive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, connection, discussion, discussion_node, fixed_now};

    fn repo(transport: &ScriptedTransport) -> DiscussionRepository<&ScriptedTransport> {
        DiscussionRepository::new(transport, "owner", "repo", LifecyclePolicy::default())
            .with_clock(fixed_now())
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        fixed_now() - Duration::days(days)
    }

    fn categories(nodes: Vec<Value>) -> Value {
        connection(&["repository", "discussionCategories"], nodes)
    }

    fn search(nodes: Vec<Value>) -> Value {
        connection(&["search"], nodes)
    }

    fn node_by_id(id: &str, closed: bool) -> Value {
        let mut node = discussion_node(id, "General", &[], fixed_now(), None);
        node["closed"] = json!(closed);
        json!({ "node": node })
    }

    #[tokio::test]
    async fn categories_map_answerable_flag() {
        let transport = ScriptedTransport::new(vec![categories(vec![
            json!({"id": "C1", "name": "Q&A", "isAnswerable": true}),
            json!({"id": "C2", "name": "Announcements", "isAnswerable": false}),
        ])]);
        let categories = repo(&transport).categories().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert!(categories[0].answerable);
        assert!(!categories[1].answerable);
        assert_eq!(
            transport.requests()[0].1,
            json!({"owner": "owner", "name": "repo", "cursor": null})
        );
    }

    #[tokio::test]
    async fn search_maps_nodes_and_skips_foreign_results() {
        let transport = ScriptedTransport::new(vec![search(vec![
            discussion_node("D1", "Q&A", &["inactive", "bug"], days_ago(3), Some(true)),
            json!({}),
        ])]);
        let query = SearchQuery::discussions_in("owner", "repo").unwrap();
        let found = repo(&transport).search(&query).await.unwrap();

        assert_eq!(found.len(), 1);
        let d = &found[0];
        assert_eq!(d.id, "D1");
        assert_eq!(d.category, "Q&A");
        assert!(d.labelled);
        assert!(d.is_answered);
        assert_eq!(d.labels, vec!["inactive".to_string(), "bug".to_string()]);
        assert_eq!(d.updated_at, days_ago(3));
    }

    #[tokio::test]
    async fn unanswered_questions_only_in_answerable_categories() {
        let transport = ScriptedTransport::new(vec![
            categories(vec![
                json!({"id": "C1", "name": "Q&A", "isAnswerable": true}),
                json!({"id": "C2", "name": "Ideas", "isAnswerable": false}),
                json!({"id": "C3", "name": r#"Projects and "Issues""#, "isAnswerable": true}),
            ]),
            search(vec![
                discussion_node("D1", "Q&A", &["question"], days_ago(30), Some(false)),
                discussion_node("D2", "Q&A", &["question"], days_ago(31), Some(false)),
                discussion_node("D3", "Q&A", &[], days_ago(1), Some(false)),
            ]),
            search(vec![discussion_node(
                "D4",
                r#"Projects and "Issues""#,
                &["Question"],
                days_ago(2),
                Some(false),
            )]),
        ]);

        let questions = repo(&transport).all_unanswered_questions(30).await.unwrap();
        let ids: Vec<_> = questions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D4"]);

        let searches = transport.requests_containing("SearchDiscussions");
        assert_eq!(searches.len(), 2);
        let first = searches[0].1["query"].as_str().unwrap();
        assert!(first.contains(r#"category:"Q&A""#));
        assert!(first.contains("is:unanswered"));
        let second = searches[1].1["query"].as_str().unwrap();
        assert!(second.contains(r#"category:"Projects and \"Issues\"""#));
    }

    #[tokio::test]
    async fn unrepresentable_category_fails_before_searching() {
        let transport = ScriptedTransport::new(vec![categories(vec![
            json!({"id": "C1", "name": "Q&A", "isAnswerable": true}),
            json!({"id": "C2", "name": "Broken\nName", "isAnswerable": true}),
        ])]);

        let err = repo(&transport)
            .all_unanswered_questions(30)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QueryConstruction { .. }));
        assert!(transport.requests_containing("SearchDiscussions").is_empty());
    }

    #[tokio::test]
    async fn dormant_candidates_boundary_is_inclusive() {
        let transport = ScriptedTransport::new(vec![search(vec![
            discussion_node("AT", "General", &[], days_ago(60), None),
            discussion_node("BELOW", "General", &[], days_ago(59), None),
            discussion_node("ANSWERED", "Q&A", &[], days_ago(90), Some(true)),
            discussion_node("INCIDENT", "General", &["incident: open"], days_ago(90), None),
            discussion_node("LABELLED", "General", &["inactive"], days_ago(90), None),
        ])]);

        let candidates = repo(&transport).dormant_candidates(60).await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["AT"]);

        let query = transport.requests()[0].1["query"].as_str().unwrap().to_string();
        assert!(query.contains(r#"-label:"inactive""#));
        assert!(query.contains(r#"-category:"Incidents""#));
        assert!(query.contains("updated:<=2024-04-02"));
    }

    #[tokio::test]
    async fn closable_requires_inactivity_label() {
        let transport = ScriptedTransport::new(vec![search(vec![
            discussion_node("LABELLED", "General", &["inactive"], days_ago(30), None),
            discussion_node("NEVER_LABELLED", "General", &[], days_ago(400), None),
            discussion_node("RECENT", "General", &["inactive"], days_ago(29), None),
        ])]);

        let closable = repo(&transport).closable(30).await.unwrap();
        let ids: Vec<_> = closable.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["LABELLED"]);
    }

    #[tokio::test]
    async fn has_bot_commented_checks_every_page() {
        let transport = ScriptedTransport::new(vec![
            json!({"node": {"comments": {
                "nodes": [{"id": "C1", "body": "hi", "createdAt": "2024-01-01T00:00:00Z", "author": {"login": "octocat"}}],
                "pageInfo": {"hasNextPage": true, "endCursor": "p1"}
            }}}),
            json!({"node": {"comments": {
                "nodes": [{"id": "C2", "body": "ack", "createdAt": "2024-01-02T00:00:00Z", "author": {"login": "github-actions"}}],
                "pageInfo": {"hasNextPage": false, "endCursor": "p2"}
            }}}),
        ]);

        let commented = repo(&transport)
            .has_bot_commented(&discussion("D1"))
            .await
            .unwrap();
        assert!(commented);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn has_bot_commented_false_without_comments() {
        let transport =
            ScriptedTransport::new(vec![connection(&["node", "comments"], vec![])]);
        let commented = repo(&transport)
            .has_bot_commented(&discussion("D1"))
            .await
            .unwrap();
        assert!(!commented);
    }

    #[tokio::test]
    async fn apply_label_resolves_id_first() {
        let transport = ScriptedTransport::new(vec![
            json!({"repository": {"label": {"id": "LA_1", "name": "inactive"}}}),
            json!({"addLabelsToLabelable": {"clientMutationId": null}}),
        ]);
        repo(&transport)
            .apply_label(&discussion("D1"), "inactive")
            .await
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].0.contains("LabelByName"));
        assert_eq!(requests[0].1["label"], json!("inactive"));
        assert!(requests[1].0.contains("addLabelsToLabelable"));
        assert_eq!(requests[1].1, json!({"id": "D1", "labelIds": ["LA_1"]}));
    }

    #[tokio::test]
    async fn unknown_label_fails_without_mutation() {
        let transport = ScriptedTransport::new(vec![json!({"repository": {"label": null}})]);
        let err = repo(&transport)
            .remove_label(&discussion("D1"), "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LabelNotFound { ref name } if name == "nope"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn post_comment_returns_created_comment() {
        let transport = ScriptedTransport::new(vec![json!({"addDiscussionComment": {"comment": {
            "id": "DC_1", "body": "hello", "createdAt": "2024-06-01T12:00:00Z",
            "author": {"login": "github-actions"}
        }}})]);
        let comment = repo(&transport)
            .post_comment(&discussion("D1"), "hello")
            .await
            .unwrap();
        assert_eq!(comment.id, "DC_1");
        assert_eq!(comment.author.as_deref(), Some("github-actions"));
    }

    #[tokio::test]
    async fn close_twice_is_not_an_error() {
        let transport = ScriptedTransport::new(vec![
            node_by_id("D1", false),
            json!({"closeDiscussion": {"discussion": {"id": "D1", "closed": true}}}),
            node_by_id("D1", true),
            node_by_id("D1", true),
        ]);
        let repo = repo(&transport);
        let d = discussion("D1");

        assert_eq!(
            repo.close(&d, CloseReason::Outdated).await.unwrap(),
            MutationOutcome::Applied
        );
        assert_eq!(
            repo.close(&d, CloseReason::Outdated).await.unwrap(),
            MutationOutcome::Unchanged
        );
        assert_eq!(
            repo.close(&d, CloseReason::Outdated).await.unwrap(),
            MutationOutcome::Unchanged
        );

        let closes = transport.requests_containing("closeDiscussion(");
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].1["reason"], json!("OUTDATED"));
    }

    #[tokio::test]
    async fn reopen_open_discussion_is_unchanged() {
        let transport = ScriptedTransport::new(vec![node_by_id("D1", false)]);
        let outcome = repo(&transport).reopen(&discussion("D1")).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert!(transport.requests_containing("reopenDiscussion(").is_empty());
    }

    #[tokio::test]
    async fn mark_inactive_reports_which_step_succeeded() {
        let transport = ScriptedTransport::new(vec![
            json!({"repository": {"label": {"id": "LA_1", "name": "inactive"}}}),
            json!({"addLabelsToLabelable": {"clientMutationId": null}}),
        ])
        .then_fail(Error::GraphQl {
            messages: vec!["was submitted too quickly".to_string()],
        });

        let err = repo(&transport)
            .mark_inactive(&discussion("D1"), "Closing soon")
            .await
            .unwrap_err();

        match err {
            Error::PartialMutation {
                completed,
                failed,
                source,
            } => {
                assert_eq!(completed, vec!["apply label inactive".to_string()]);
                assert_eq!(failed, "post comment");
                assert!(source.is_transport());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn mark_inactive_label_failure_is_not_partial() {
        let transport = ScriptedTransport::new(vec![json!({"repository": {"label": null}})]);
        let err = repo(&transport)
            .mark_inactive(&discussion("D1"), "Closing soon")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LabelNotFound { .. }));
    }

    #[tokio::test]
    async fn discussion_rejects_non_discussion_nodes() {
        let transport = ScriptedTransport::new(vec![json!({"node": {}})]);
        let err = repo(&transport).discussion("I_1").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
