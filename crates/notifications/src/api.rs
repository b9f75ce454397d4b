//! The outward representation of notifications: one thread per record,
//! with URLs anchored at the application's base URL.

use crate::list::{NotificationList, NotificationView};
use crate::Slot;
use anyhow::Context;
use chrono::{DateTime, Utc};
use models::{Comment, Id, Issue, NotificationSource, NotificationStatus, Repository};
use serde::Serialize;

/// Renders notification views into API threads. The base application URL
/// is injected at construction and validated once; there is no global
/// settings handle.
#[derive(Debug, Clone)]
pub struct ThreadFormatter {
    // Always ends with a slash, so URL building is plain concatenation.
    base_url: String,
}

impl ThreadFormatter {
    pub fn new(app_base_url: &str) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(app_base_url).context("parsing application base URL")?;
        if parsed.cannot_be_a_base() {
            anyhow::bail!("application base URL {app_base_url:?} cannot be a base");
        }
        let mut base_url = parsed.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self { base_url })
    }

    /// The canonical URL of one notification thread.
    pub fn thread_url(&self, id: Id) -> String {
        format!("{}api/v1/notifications/threads/{}", self.base_url, id)
    }

    pub fn thread(&self, view: &NotificationView) -> NotificationThread {
        let n = &view.notification;
        NotificationThread {
            id: n.id.as_i64(),
            unread: !matches!(
                n.status,
                NotificationStatus::Read | NotificationStatus::Pinned
            ),
            pinned: n.status == NotificationStatus::Pinned,
            updated_at: n.updated_at,
            url: self.thread_url(n.id),
            // Users only ever list notifications they may read, so the
            // minimal read-mode summary is the right amount of repository.
            repository: view
                .repository
                .get()
                .map(|repo| RepositorySummary::of(repo)),
            subject: self.subject(view),
        }
    }

    pub fn threads(&self, list: &NotificationList) -> Vec<NotificationThread> {
        list.views().iter().map(|view| self.thread(view)).collect()
    }

    /// The HTML location a thread links to: its comment when one is
    /// attached, else its issue. `None` until the relevant associations are
    /// loaded.
    pub fn html_url(&self, view: &NotificationView) -> Option<String> {
        let issue = view.issue.get()?;
        let repo = view.repository.get()?;
        match view.comment.get() {
            Some(Some(comment)) => Some(self.comment_html_url(repo, issue, comment)),
            _ => Some(self.issue_html_url(repo, issue)),
        }
    }

    fn subject(&self, view: &NotificationView) -> NotificationSubject {
        let n = &view.notification;
        let kind = match n.source {
            NotificationSource::Issue => SubjectType::Issue,
            NotificationSource::PullRequest => SubjectType::Pull,
            NotificationSource::Commit => SubjectType::Commit,
        };
        if kind == SubjectType::Commit {
            return NotificationSubject {
                kind,
                title: n.commit_id.clone(),
                url: None,
                latest_comment_url: None,
            };
        }

        let issue = view.issue.get();
        let repo = view.repository.get();
        let (title, url) = match (issue, repo) {
            (Some(issue), Some(repo)) => (
                Some(issue.title.clone()),
                Some(self.issue_api_url(repo, issue)),
            ),
            _ => (None, None),
        };
        let latest_comment_url = match (&view.latest_comment, repo) {
            (Slot::Loaded(Some(comment)), Some(repo)) => {
                Some(self.comment_api_url(repo, comment.id))
            }
            _ => None,
        };
        NotificationSubject {
            kind,
            title,
            url,
            latest_comment_url,
        }
    }

    fn issue_api_url(&self, repo: &Repository, issue: &Issue) -> String {
        format!(
            "{}api/v1/repos/{}/issues/{}",
            self.base_url,
            repo.full_name(),
            issue.index
        )
    }

    fn comment_api_url(&self, repo: &Repository, comment_id: Id) -> String {
        format!(
            "{}api/v1/repos/{}/issues/comments/{}",
            self.base_url,
            repo.full_name(),
            comment_id
        )
    }

    fn issue_html_url(&self, repo: &Repository, issue: &Issue) -> String {
        let kind = if issue.is_pull { "pulls" } else { "issues" };
        format!(
            "{}{}/{}/{}",
            self.base_url,
            repo.full_name(),
            kind,
            issue.index
        )
    }

    fn comment_html_url(&self, repo: &Repository, issue: &Issue, comment: &Comment) -> String {
        format!(
            "{}#issuecomment-{}",
            self.issue_html_url(repo, issue),
            comment.id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationThread {
    pub id: i64,
    pub unread: bool,
    pub pinned: bool,
    pub updated_at: DateTime<Utc>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositorySummary>,
    pub subject: NotificationSubject,
}

/// The read-visibility summary of a repository embedded in a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub private: bool,
}

impl RepositorySummary {
    fn of(repo: &Repository) -> Self {
        Self {
            id: repo.id.as_i64(),
            name: repo.name.clone(),
            full_name: repo.full_name(),
            owner: repo.owner_name.clone(),
            private: repo.is_private,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSubject {
    #[serde(rename = "type")]
    pub kind: SubjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_comment_url: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SubjectType {
    Issue,
    Pull,
    Commit,
}
