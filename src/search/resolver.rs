//! search::resolver
//!
//! Turn a user-supplied reference into an entity id by matching it against
//! a candidate list.
//!
//! # Matching
//!
//! 1. The reference is normalized; an empty result is
//!    [`ResolveError::EmptyReference`].
//! 2. A candidate whose lowercased id equals the normalized reference wins.
//! 3. Otherwise the first candidate, in list order, whose normalized name
//!    contains every term of the reference wins.
//! 4. Otherwise [`ResolveError::NotFound`].
//!
//! List order is the server's order, so ties always break the same way.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use super::normalize::{is_similar, normalize};
use crate::api::ApiError;
use crate::core::cancel::CancelToken;

/// Kinds of entities a reference can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Workspace,
    Client,
    Project,
    Task,
    Tag,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Workspace => "workspace",
            EntityKind::Client => "client",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Tag => "tag",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

/// Scope a lookup ran in, reported on misses (`workspace`, `project`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(pub Vec<(&'static str, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, " ({})", parts.join(", "))
    }
}

/// Errors from resolving references.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("{kind} reference is empty")]
    EmptyReference { kind: EntityKind },

    #[error("no {kind} matches \"{reference}\"{filters}")]
    NotFound {
        kind: EntityKind,
        reference: String,
        filters: Filters,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// One entity as the resolver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    /// The text matched by the similarity pass.
    pub name: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Resolve `reference` against an already-fetched candidate list.
pub fn resolve(
    reference: &str,
    kind: EntityKind,
    candidates: &[Candidate],
    filters: &Filters,
) -> Result<String, ResolveError> {
    let query = normalize(reference);
    if query.is_empty() {
        return Err(ResolveError::EmptyReference { kind });
    }

    if let Some(c) = candidates.iter().find(|c| c.id.to_lowercase() == query) {
        return Ok(c.id.clone());
    }

    candidates
        .iter()
        .find(|c| is_similar(&query, &normalize(&c.name)))
        .map(|c| c.id.clone())
        .ok_or_else(|| ResolveError::NotFound {
            kind,
            reference: reference.trim().to_string(),
            filters: filters.clone(),
        })
}

/// Fetch the candidates with `list` and resolve one reference.
pub async fn resolve_one<F, Fut>(
    reference: &str,
    kind: EntityKind,
    filters: &Filters,
    list: F,
) -> Result<String, ResolveError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Candidate>, ApiError>>,
{
    if normalize(reference).is_empty() {
        return Err(ResolveError::EmptyReference { kind });
    }
    let candidates = list().await?;
    resolve(reference, kind, &candidates, filters)
}

/// Fetch the candidates once, then resolve every reference concurrently.
///
/// Ids come back in the order of `references`. Every spawned lookup is
/// awaited before returning; when any fails, the failure of the earliest
/// reference is returned.
pub async fn resolve_many<F, Fut>(
    references: &[String],
    kind: EntityKind,
    filters: &Filters,
    cancel: &CancelToken,
    list: F,
) -> Result<Vec<String>, ResolveError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Candidate>, ApiError>>,
{
    if references.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = Arc::new(list().await?);
    if cancel.is_cancelled() {
        return Err(ApiError::Cancelled.into());
    }

    let handles = references.iter().map(|reference| {
        let candidates = Arc::clone(&candidates);
        let reference = reference.clone();
        let filters = filters.clone();
        tokio::spawn(async move { resolve(&reference, kind, &candidates, &filters) })
    });

    let mut ids = Vec::with_capacity(references.len());
    for joined in join_all(handles).await {
        let result = joined.map_err(ApiError::from)?;
        ids.push(result?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clients() -> Vec<Candidate> {
        vec![
            Candidate::new("c1", "Coderockr"),
            Candidate::new("c2", "Other"),
        ]
    }

    #[test]
    fn by_name() {
        let id = resolve("other", EntityKind::Client, &clients(), &Filters::new()).unwrap();
        assert_eq!(id, "c2");
    }

    #[test]
    fn miss_reports_kind_and_reference() {
        let err = resolve("xx", EntityKind::Client, &clients(), &Filters::new()).unwrap_err();
        match err {
            ResolveError::NotFound {
                kind, reference, ..
            } => {
                assert_eq!(kind, EntityKind::Client);
                assert_eq!(reference, "xx");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn id_match_beats_name_match() {
        let list = vec![
            Candidate::new("aaaaaaaaaaaaaaaaaaaaaaa2", "aaaaaaaaaaaaaaaaaaaaaaa1"),
            Candidate::new("aaaaaaaaaaaaaaaaaaaaaaa1", "First"),
        ];
        let id = resolve(
            "AAAAAAAAAAAAAAAAAAAAAAA1",
            EntityKind::Tag,
            &list,
            &Filters::new(),
        )
        .unwrap();
        assert_eq!(id, "aaaaaaaaaaaaaaaaaaaaaaa1");
    }

    #[test]
    fn first_similar_in_list_order_wins() {
        let list = vec![
            Candidate::new("p1", "Clockify CLI"),
            Candidate::new("p2", "CLI tools"),
        ];
        assert_eq!(
            resolve("cli", EntityKind::Project, &list, &Filters::new()).unwrap(),
            "p1"
        );
    }

    #[test]
    fn empty_reference() {
        let err = resolve(" [] ", EntityKind::Tag, &clients(), &Filters::new()).unwrap_err();
        assert!(matches!(err, ResolveError::EmptyReference { .. }));
    }

    #[test]
    fn filters_in_message() {
        let filters = Filters::new().with("project", "p1").with("workspace", "w1");
        let err = resolve("nope", EntityKind::Task, &[], &filters).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no task matches \"nope\" (project: p1, workspace: w1)"
        );
    }

    #[tokio::test]
    async fn many_preserves_order_and_lists_once() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let refs = vec!["other".to_string(), "code".to_string(), "c2".to_string()];
        let ids = resolve_many(
            &refs,
            EntityKind::Client,
            &Filters::new(),
            &CancelToken::new(),
            || {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async { Ok(clients()) }
            },
        )
        .await
        .unwrap();
        assert_eq!(ids, vec!["c2", "c1", "c2"]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn many_fails_on_earliest_miss() {
        let refs = vec!["other".to_string(), "zz".to_string(), "yy".to_string()];
        let err = resolve_many(
            &refs,
            EntityKind::Client,
            &Filters::new(),
            &CancelToken::new(),
            || async { Ok(clients()) },
        )
        .await
        .unwrap_err();
        match err {
            ResolveError::NotFound { reference, .. } => assert_eq!(reference, "zz"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_skips_listing_for_empty_reference() {
        let err = resolve_one("  ", EntityKind::Project, &Filters::new(), || async {
            Err(ApiError::Transport("listed for an empty reference".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyReference { .. }));
    }
}
