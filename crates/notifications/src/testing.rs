//! A deterministic in-memory store for exercising the engine without a
//! database.
//!
//! Sessions clone the shared state on begin and write it back on commit, so
//! rollback semantics match the production binding: work dropped without a
//! commit is never visible. Time is a counter: every notification write
//! advances a one-second tick from a fixed epoch, which makes recency
//! ordering assertions exact.

use crate::store::{Session, Store};
use crate::Error;
use chrono::{DateTime, Duration, TimeZone, Utc};
use models::{
    Comment, Id, Issue, IssueWatch, NewNotification, Notification, NotificationStatus, Predicate,
    Repository, UnitKind, User, Watch,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<Id, User>,
    repos: BTreeMap<Id, Repository>,
    units: BTreeMap<Id, BTreeSet<UnitKind>>,
    collaborators: BTreeSet<(Id, Id)>,
    issues: BTreeMap<Id, Issue>,
    comments: BTreeMap<Id, Comment>,
    issue_watches: Vec<IssueWatch>,
    watches: Vec<Watch>,
    notifications: BTreeMap<Id, Notification>,
    next_id: i64,
    clock: i64,
    // Writes remaining before injected failure, when set.
    writes_before_failure: Option<usize>,
}

impl State {
    fn allocate_id(&mut self) -> Id {
        self.next_id += 1;
        Id::new(self.next_id)
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.clock)
    }

    fn check_write(&mut self) -> Result<(), Error> {
        match self.writes_before_failure {
            Some(0) => Err(Error::Store(anyhow::anyhow!(
                "injected notification write failure"
            ))),
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Batch-lookup observability, shared across sessions.
#[derive(Debug, Default)]
pub struct Stats {
    repo_batch_rounds: AtomicUsize,
    repo_rows_fetched: AtomicUsize,
}

impl Stats {
    pub fn repo_batch_rounds(&self) -> usize {
        self.repo_batch_rounds.load(Ordering::Relaxed)
    }
    pub fn repo_rows_fetched(&self) -> usize {
        self.repo_rows_fetched.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<State>>,
    stats: Arc<Stats>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Makes the N+1'th notification write of any later session fail, for
    /// rollback coverage.
    pub fn fail_notification_writes_after(&self, writes: usize) {
        self.state.lock().unwrap().writes_before_failure = Some(writes);
    }

    // Fixture construction. These mutate the shared base state directly,
    // outside any session.

    pub fn add_user(&self, name: &str) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        state.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                full_name: String::new(),
            },
        );
        id
    }

    /// Adds a repository owned by `owner`, with both units enabled.
    pub fn add_repo(&self, owner: Id, name: &str, is_private: bool) -> Id {
        let mut state = self.state.lock().unwrap();
        let owner_name = state
            .users
            .get(&owner)
            .map(|user| user.name.clone())
            .unwrap_or_default();
        let id = state.allocate_id();
        state.repos.insert(
            id,
            Repository {
                id,
                owner_id: owner,
                owner_name,
                name: name.to_string(),
                is_private,
            },
        );
        state.units.insert(
            id,
            [UnitKind::Issues, UnitKind::PullRequests].into_iter().collect(),
        );
        id
    }

    pub fn set_units(&self, repo: Id, units: &[UnitKind]) {
        self.state
            .lock()
            .unwrap()
            .units
            .insert(repo, units.iter().copied().collect());
    }

    pub fn add_collaborator(&self, repo: Id, user: Id) {
        self.state.lock().unwrap().collaborators.insert((repo, user));
    }

    pub fn add_issue(&self, repo: Id, title: &str, is_pull: bool, poster: Id) -> Id {
        let mut state = self.state.lock().unwrap();
        let index = state
            .issues
            .values()
            .filter(|issue| issue.repo_id == repo)
            .count() as i64
            + 1;
        let id = state.allocate_id();
        state.issues.insert(
            id,
            Issue {
                id,
                repo_id: repo,
                index,
                title: title.to_string(),
                is_pull,
                poster_id: poster,
            },
        );
        id
    }

    pub fn add_comment(&self, issue: Id, poster: Id) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        let created_at = state.tick();
        state.comments.insert(
            id,
            Comment {
                id,
                issue_id: issue,
                poster_id: poster,
                created_at,
            },
        );
        id
    }

    pub fn watch_issue(&self, user: Id, issue: Id, is_watching: bool) {
        self.state.lock().unwrap().issue_watches.push(IssueWatch {
            user_id: user,
            issue_id: issue,
            is_watching,
        });
    }

    pub fn watch_repo(&self, user: Id, repo: Id) {
        self.state.lock().unwrap().watches.push(Watch {
            user_id: user,
            repo_id: repo,
        });
    }

    // Direct inspection of committed state.

    pub fn notifications(&self) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .values()
            .cloned()
            .collect()
    }

    pub fn notification_for(&self, user: Id, issue: Id) -> Option<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .values()
            .find(|n| n.user_id == user && n.issue_id == issue)
            .cloned()
    }
}

#[async_trait::async_trait]
impl Store for MemStore {
    type Session = MemSession;

    async fn begin(&self) -> Result<MemSession, Error> {
        let work = self.state.lock().unwrap().clone();
        Ok(MemSession {
            shared: self.state.clone(),
            stats: self.stats.clone(),
            work,
        })
    }
}

pub struct MemSession {
    shared: Arc<Mutex<State>>,
    stats: Arc<Stats>,
    work: State,
}

#[async_trait::async_trait]
impl Session for MemSession {
    async fn issue_by_id(&mut self, id: Id) -> Result<Issue, Error> {
        self.work
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("issue", id))
    }

    async fn repository_by_id(&mut self, id: Id) -> Result<Repository, Error> {
        self.work
            .repos
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("repository", id))
    }

    async fn user_by_id(&mut self, id: Id) -> Result<User, Error> {
        self.work
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("user", id))
    }

    async fn comment_by_id(&mut self, id: Id) -> Result<Comment, Error> {
        self.work
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("comment", id))
    }

    async fn issues_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Issue>, Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.issues.get(id).cloned())
            .collect())
    }

    async fn repositories_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Repository>, Error> {
        let rows: Vec<Repository> = ids
            .iter()
            .filter_map(|id| self.work.repos.get(id).cloned())
            .collect();
        self.stats.repo_batch_rounds.fetch_add(1, Ordering::Relaxed);
        self.stats
            .repo_rows_fetched
            .fetch_add(rows.len(), Ordering::Relaxed);
        Ok(rows)
    }

    async fn users_by_ids(&mut self, ids: &[Id]) -> Result<Vec<User>, Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.users.get(id).cloned())
            .collect())
    }

    async fn comments_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Comment>, Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.work.comments.get(id).cloned())
            .collect())
    }

    async fn last_comments_of_issues(&mut self, issue_ids: &[Id]) -> Result<Vec<Comment>, Error> {
        Ok(issue_ids
            .iter()
            .filter_map(|issue_id| {
                self.work
                    .comments
                    .values()
                    .filter(|comment| comment.issue_id == *issue_id)
                    .max_by_key(|comment| (comment.created_at, comment.id))
                    .cloned()
            })
            .collect())
    }

    async fn issue_watchers(&mut self, issue_id: Id) -> Result<Vec<IssueWatch>, Error> {
        Ok(self
            .work
            .issue_watches
            .iter()
            .filter(|watch| watch.issue_id == issue_id)
            .copied()
            .collect())
    }

    async fn repository_watchers(&mut self, repo_id: Id) -> Result<Vec<Watch>, Error> {
        Ok(self
            .work
            .watches
            .iter()
            .filter(|watch| watch.repo_id == repo_id)
            .copied()
            .collect())
    }

    async fn check_unit_user(
        &mut self,
        repo_id: Id,
        user_id: Id,
        unit: UnitKind,
    ) -> Result<bool, Error> {
        let Some(repo) = self.work.repos.get(&repo_id) else {
            return Ok(false);
        };
        let enabled = self
            .work
            .units
            .get(&repo_id)
            .map_or(false, |units| units.contains(&unit));
        if !enabled {
            return Ok(false);
        }
        Ok(!repo.is_private
            || repo.owner_id == user_id
            || self.work.collaborators.contains(&(repo_id, user_id)))
    }

    async fn insert_notification(&mut self, new: NewNotification) -> Result<Notification, Error> {
        self.work.check_write()?;
        let id = self.work.allocate_id();
        let now = self.work.tick();
        let notification = Notification {
            id,
            user_id: new.user_id,
            repo_id: new.repo_id,
            issue_id: new.issue_id,
            status: NotificationStatus::Unread,
            source: new.source,
            commit_id: None,
            comment_id: new.comment_id,
            updated_by: new.updated_by,
            created_at: now,
            updated_at: now,
        };
        self.work.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn notification_by_id(&mut self, id: Id) -> Result<Notification, Error> {
        self.work
            .notifications
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("notification", id))
    }

    async fn notification_for_user_issue(
        &mut self,
        user_id: Id,
        issue_id: Id,
    ) -> Result<Option<Notification>, Error> {
        Ok(self
            .work
            .notifications
            .values()
            .find(|n| n.user_id == user_id && n.issue_id == issue_id)
            .cloned())
    }

    async fn notifications_by_issue(&mut self, issue_id: Id) -> Result<Vec<Notification>, Error> {
        Ok(self
            .work
            .notifications
            .values()
            .filter(|n| n.issue_id == issue_id)
            .cloned()
            .collect())
    }

    async fn search_notifications(
        &mut self,
        predicate: &Predicate,
        page: Option<(i64, i64)>,
    ) -> Result<Vec<Notification>, Error> {
        let mut rows: Vec<Notification> = self
            .work
            .notifications
            .values()
            .filter(|n| predicate.matches(n))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (b.updated_at, b.id).cmp(&(a.updated_at, a.id))
        });
        if let Some((page, per_page)) = page {
            let skip = ((page - 1) * per_page) as usize;
            rows = rows.into_iter().skip(skip).take(per_page as usize).collect();
        }
        Ok(rows)
    }

    async fn count_notifications(&mut self, predicate: &Predicate) -> Result<i64, Error> {
        Ok(self
            .work
            .notifications
            .values()
            .filter(|n| predicate.matches(n))
            .count() as i64)
    }

    async fn resurface_notification(
        &mut self,
        id: Id,
        comment_id: Id,
        updated_by: Id,
    ) -> Result<(), Error> {
        self.work.check_write()?;
        let now = self.work.tick();
        let notification = self
            .work
            .notifications
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("notification", id))?;
        notification.status = NotificationStatus::Unread;
        notification.comment_id = comment_id;
        notification.updated_by = updated_by;
        notification.updated_at = now;
        Ok(())
    }

    async fn touch_notification(&mut self, id: Id, updated_by: Id) -> Result<(), Error> {
        self.work.check_write()?;
        let now = self.work.tick();
        let notification = self
            .work
            .notifications
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("notification", id))?;
        notification.updated_by = updated_by;
        notification.updated_at = now;
        Ok(())
    }

    async fn set_notification_status(
        &mut self,
        id: Id,
        status: NotificationStatus,
    ) -> Result<(), Error> {
        self.work.check_write()?;
        let now = self.work.tick();
        let notification = self
            .work
            .notifications
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("notification", id))?;
        notification.status = status;
        notification.updated_at = now;
        Ok(())
    }

    async fn bulk_update_status(
        &mut self,
        user_id: Id,
        from: NotificationStatus,
        to: NotificationStatus,
        updated_by: Id,
    ) -> Result<u64, Error> {
        self.work.check_write()?;
        let now = self.work.tick();
        let mut changed = 0;
        for notification in self.work.notifications.values_mut() {
            if notification.user_id == user_id && notification.status == from {
                notification.status = to;
                notification.updated_by = updated_by;
                notification.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn commit(self) -> Result<(), Error> {
        *self.shared.lock().unwrap() = self.work;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        Ok(())
    }
}
