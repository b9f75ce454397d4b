use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    pub id: Id,
    pub name: String,
    pub full_name: String,
}

/// A repository, the container of issues and pull requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Repository {
    pub id: Id,
    pub owner_id: Id,
    pub owner_name: String,
    pub name: String,
    pub is_private: bool,
}

impl Repository {
    /// The `{owner}/{name}` path under which the repository is addressed.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner_name, self.name)
    }
}

/// An issue or pull request. Pull requests share the issue table and are
/// distinguished by `is_pull`; `index` is the repository-scoped sequence
/// number used in URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Issue {
    pub id: Id,
    pub repo_id: Id,
    pub index: i64,
    pub title: String,
    pub is_pull: bool,
    pub poster_id: Id,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Comment {
    pub id: Id,
    pub issue_id: Id,
    pub poster_id: Id,
    pub created_at: DateTime<Utc>,
}

/// A user's per-issue subscription. `is_watching: false` is an explicit
/// opt-out which must suppress repository-level watching as well, and is a
/// distinct state from the row simply not existing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct IssueWatch {
    pub user_id: Id,
    pub issue_id: Id,
    pub is_watching: bool,
}

/// A user's repository-level subscription.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Watch {
    pub user_id: Id,
    pub repo_id: Id,
}

/// A capability area of a repository, gating per-user read access.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[serde(rename_all = "camelCase")]
#[repr(i16)]
pub enum UnitKind {
    Issues = 1,
    PullRequests = 2,
}
