use crate::store::Session;
use crate::Error;
use models::{Comment, Id, Issue, Notification, Repository, User};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Upper bound on the key cardinality of one bulk-lookup round. Pages
/// larger than this load in several bounded queries rather than one
/// unbounded IN-clause.
pub const MAX_BATCH_KEYS: usize = 50;

/// Explicit load state of a view association. `Unloaded` means no loader
/// has resolved it yet, distinct from "resolved to nothing", which the
/// comment slots express as `Loaded(None)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Unloaded,
    Loaded(T),
}

impl<T> Slot<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Slot::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Unloaded => None,
            Slot::Loaded(value) => Some(value),
        }
    }
}

/// A notification together with whatever associations have been loaded for
/// display. Views are immutable from the caller's perspective: loaders
/// consume a list and return a new one with more slots filled, rather than
/// mutating shared records in place.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub notification: Notification,
    pub repository: Slot<Arc<Repository>>,
    pub issue: Slot<Arc<Issue>>,
    /// The comment the notification points at; `Loaded(None)` when the
    /// record references no comment.
    pub comment: Slot<Option<Arc<Comment>>>,
    /// The newest comment on the issue, for subject rendering.
    pub latest_comment: Slot<Option<Arc<Comment>>>,
    pub user: Slot<Arc<User>>,
}

impl NotificationView {
    fn new(notification: Notification) -> Self {
        Self {
            notification,
            repository: Slot::Unloaded,
            issue: Slot::Unloaded,
            comment: Slot::Unloaded,
            latest_comment: Slot::Unloaded,
            user: Slot::Unloaded,
        }
    }
}

/// An ordered page of notifications under batched association loading.
#[derive(Debug, Clone, Default)]
pub struct NotificationList {
    views: Vec<NotificationView>,
}

impl NotificationList {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            views: notifications
                .into_iter()
                .map(NotificationView::new)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
    pub fn views(&self) -> &[NotificationView] {
        &self.views
    }
    pub fn into_views(self) -> Vec<NotificationView> {
        self.views
    }

    /// Loads the repositories referenced by views that don't carry one yet,
    /// and additionally returns the distinct repositories of the whole list
    /// (one entry per repository identity, in first-reference order).
    pub async fn load_repositories<S: Session>(
        mut self,
        session: &mut S,
    ) -> Result<(Self, Vec<Arc<Repository>>), Error> {
        let pending = distinct_keys(
            self.views
                .iter()
                .filter(|view| !view.repository.is_loaded())
                .map(|view| view.notification.repo_id),
        );
        let mut loaded = HashMap::with_capacity(pending.len());
        for chunk in pending.chunks(MAX_BATCH_KEYS) {
            for repo in session.repositories_by_ids(chunk).await? {
                loaded.insert(repo.id, Arc::new(repo));
            }
        }

        let mut distinct = Vec::new();
        let mut seen = HashSet::new();
        for view in &mut self.views {
            if !view.repository.is_loaded() {
                if let Some(repo) = loaded.get(&view.notification.repo_id) {
                    view.repository = Slot::Loaded(repo.clone());
                }
            }
            if let Some(repo) = view.repository.get() {
                if seen.insert(repo.id) {
                    distinct.push(repo.clone());
                }
            }
        }
        Ok((self, distinct))
    }

    pub async fn load_issues<S: Session>(mut self, session: &mut S) -> Result<Self, Error> {
        let pending = distinct_keys(
            self.views
                .iter()
                .filter(|view| !view.issue.is_loaded())
                .map(|view| view.notification.issue_id),
        );
        let mut loaded = HashMap::with_capacity(pending.len());
        for chunk in pending.chunks(MAX_BATCH_KEYS) {
            for issue in session.issues_by_ids(chunk).await? {
                loaded.insert(issue.id, Arc::new(issue));
            }
        }

        for view in &mut self.views {
            if !view.issue.is_loaded() {
                if let Some(issue) = loaded.get(&view.notification.issue_id) {
                    view.issue = Slot::Loaded(issue.clone());
                }
            }
        }
        Ok(self)
    }

    /// Loads the comments views point at. A `comment_id` of zero resolves
    /// to `Loaded(None)` without a lookup.
    pub async fn load_comments<S: Session>(mut self, session: &mut S) -> Result<Self, Error> {
        for view in &mut self.views {
            if !view.comment.is_loaded() && view.notification.comment_id.is_zero() {
                view.comment = Slot::Loaded(None);
            }
        }
        let pending = distinct_keys(
            self.views
                .iter()
                .filter(|view| !view.comment.is_loaded())
                .map(|view| view.notification.comment_id),
        );
        let mut loaded = HashMap::with_capacity(pending.len());
        for chunk in pending.chunks(MAX_BATCH_KEYS) {
            for comment in session.comments_by_ids(chunk).await? {
                loaded.insert(comment.id, Arc::new(comment));
            }
        }

        for view in &mut self.views {
            if !view.comment.is_loaded() {
                if let Some(comment) = loaded.get(&view.notification.comment_id) {
                    view.comment = Slot::Loaded(Some(comment.clone()));
                }
            }
        }
        Ok(self)
    }

    /// Loads the newest comment of each referenced issue, batched. Unlike
    /// `load_comments`, an issue with no comments is a definitive answer,
    /// so every queried view ends up `Loaded`.
    pub async fn load_latest_comments<S: Session>(
        mut self,
        session: &mut S,
    ) -> Result<Self, Error> {
        let pending = distinct_keys(
            self.views
                .iter()
                .filter(|view| !view.latest_comment.is_loaded())
                .map(|view| view.notification.issue_id),
        );
        let mut loaded = HashMap::with_capacity(pending.len());
        for chunk in pending.chunks(MAX_BATCH_KEYS) {
            for comment in session.last_comments_of_issues(chunk).await? {
                loaded.insert(comment.issue_id, Arc::new(comment));
            }
        }

        let queried: HashSet<Id> = pending.into_iter().collect();
        for view in &mut self.views {
            if !view.latest_comment.is_loaded() && queried.contains(&view.notification.issue_id) {
                view.latest_comment =
                    Slot::Loaded(loaded.get(&view.notification.issue_id).cloned());
            }
        }
        Ok(self)
    }

    pub async fn load_users<S: Session>(mut self, session: &mut S) -> Result<Self, Error> {
        let pending = distinct_keys(
            self.views
                .iter()
                .filter(|view| !view.user.is_loaded())
                .map(|view| view.notification.user_id),
        );
        let mut loaded = HashMap::with_capacity(pending.len());
        for chunk in pending.chunks(MAX_BATCH_KEYS) {
            for user in session.users_by_ids(chunk).await? {
                loaded.insert(user.id, Arc::new(user));
            }
        }

        for view in &mut self.views {
            if !view.user.is_loaded() {
                if let Some(user) = loaded.get(&view.notification.user_id) {
                    view.user = Slot::Loaded(user.clone());
                }
            }
        }
        Ok(self)
    }

    /// Loads every association kind in turn.
    pub async fn load_attributes<S: Session>(self, session: &mut S) -> Result<Self, Error> {
        let (list, _) = self.load_repositories(session).await?;
        let list = list.load_issues(session).await?;
        let list = list.load_comments(session).await?;
        let list = list.load_latest_comments(session).await?;
        list.load_users(session).await
    }
}

fn distinct_keys(keys: impl Iterator<Item = Id>) -> Vec<Id> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(*key)).collect()
}
