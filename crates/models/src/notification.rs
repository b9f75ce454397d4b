use super::{Field, Id, Predicate, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a notification.
///
/// `Pinned` is user-controlled: activity merges never move a pinned record
/// back to `Unread`; only an explicit status set can change it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum NotificationStatus {
    Unread = 1,
    Read = 2,
    Pinned = 3,
}

/// What kind of subject a notification points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[serde(rename_all = "camelCase")]
#[repr(i16)]
pub enum NotificationSource {
    Issue = 1,
    PullRequest = 2,
    Commit = 3,
}

/// One (user, issue) notification relationship and its mutable status.
///
/// At most one row exists per (`user_id`, `issue_id`) pair: fan-out updates
/// the existing row rather than inserting a second one. `comment_id` is
/// `Id::ZERO` when the notification points at no specific comment, and
/// `commit_id` is set only for commit-sourced rows. Display-ready
/// association state is not part of the record; see the list loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: Id,
    pub user_id: Id,
    pub repo_id: Id,
    pub issue_id: Id,
    pub status: NotificationStatus,
    pub source: NotificationSource,
    pub commit_id: Option<String>,
    pub comment_id: Id,
    pub updated_by: Id,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the notification should surface as unread to its user.
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

/// The insertable shape of a notification. Stores always create new rows
/// with status `Unread`; there is deliberately no way to insert in another
/// state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Id,
    pub repo_id: Id,
    pub issue_id: Id,
    pub source: NotificationSource,
    pub comment_id: Id,
    pub updated_by: Id,
}

/// An immutable notification filter. `None` fields are unconstrained, and
/// present fields compose conjunctively.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FindOptions {
    pub user_id: Option<Id>,
    pub repo_id: Option<Id>,
    pub issue_id: Option<Id>,
    pub status: Option<NotificationStatus>,
    pub updated_after: Option<DateTime<Utc>>,
    pub updated_before: Option<DateTime<Utc>>,
}

impl FindOptions {
    /// Lowers the filter into the typed predicate consumed by stores.
    pub fn as_predicate(&self) -> Predicate {
        let mut terms = Vec::new();
        if let Some(user_id) = self.user_id {
            terms.push(Predicate::Eq(Field::UserId, Value::Id(user_id)));
        }
        if let Some(repo_id) = self.repo_id {
            terms.push(Predicate::Eq(Field::RepoId, Value::Id(repo_id)));
        }
        if let Some(issue_id) = self.issue_id {
            terms.push(Predicate::Eq(Field::IssueId, Value::Id(issue_id)));
        }
        if let Some(status) = self.status {
            terms.push(Predicate::Eq(Field::Status, Value::Status(status)));
        }
        if let Some(after) = self.updated_after {
            terms.push(Predicate::Gte(Field::UpdatedAt, Value::Time(after)));
        }
        if let Some(before) = self.updated_before {
            terms.push(Predicate::Lte(Field::UpdatedAt, Value::Time(before)));
        }
        Predicate::And(terms)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn find_options_lower_in_field_order() {
        let after = Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap();
        let opts = FindOptions {
            user_id: Some(Id::new(3)),
            status: Some(NotificationStatus::Unread),
            updated_after: Some(after),
            ..Default::default()
        };
        assert_eq!(
            opts.as_predicate(),
            Predicate::And(vec![
                Predicate::Eq(Field::UserId, Value::Id(Id::new(3))),
                Predicate::Eq(Field::Status, Value::Status(NotificationStatus::Unread)),
                Predicate::Gte(Field::UpdatedAt, Value::Time(after)),
            ])
        );
    }

    #[test]
    fn empty_find_options_lower_to_an_empty_conjunction() {
        assert_eq!(
            FindOptions::default().as_predicate(),
            Predicate::And(Vec::new())
        );
    }
}
