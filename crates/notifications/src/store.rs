use crate::Error;
use anyhow::Context;
use models::{
    Comment, Id, Issue, IssueWatch, NewNotification, Notification, NotificationStatus, Predicate,
    Repository, UnitKind, User, Watch,
};

/// A handle which can open transactional sessions against the backing
/// store. The fan-out orchestrator begins one session per event so that an
/// event's notification writes land all-or-nothing.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    type Session: Session;

    async fn begin(&self) -> Result<Self::Session, Error>;
}

/// One transaction's view of the store.
///
/// Every operation of this crate takes its session as an explicit
/// parameter, which makes transaction boundaries the caller's decision and
/// keeps the engine testable against the in-memory implementation. Writes
/// become durable only on `commit`; dropping a session without committing
/// discards them.
#[async_trait::async_trait]
pub trait Session: Send {
    // Collaborator lookups. The by-id forms fail with `Error::NotFound`;
    // the batched forms return only the rows that exist.
    async fn issue_by_id(&mut self, id: Id) -> Result<Issue, Error>;
    async fn repository_by_id(&mut self, id: Id) -> Result<Repository, Error>;
    async fn user_by_id(&mut self, id: Id) -> Result<User, Error>;
    async fn comment_by_id(&mut self, id: Id) -> Result<Comment, Error>;
    async fn issues_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Issue>, Error>;
    async fn repositories_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Repository>, Error>;
    async fn users_by_ids(&mut self, ids: &[Id]) -> Result<Vec<User>, Error>;
    async fn comments_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Comment>, Error>;
    /// The most recent comment per listed issue; issues without comments
    /// yield no entry.
    async fn last_comments_of_issues(&mut self, issue_ids: &[Id]) -> Result<Vec<Comment>, Error>;

    async fn issue_watchers(&mut self, issue_id: Id) -> Result<Vec<IssueWatch>, Error>;
    async fn repository_watchers(&mut self, repo_id: Id) -> Result<Vec<Watch>, Error>;
    /// Stateless read-permission predicate for one unit of one repository.
    async fn check_unit_user(
        &mut self,
        repo_id: Id,
        user_id: Id,
        unit: UnitKind,
    ) -> Result<bool, Error>;

    // Notification row primitives. Inserts always create unread rows;
    // every write bumps `updated_at`.
    async fn insert_notification(&mut self, new: NewNotification) -> Result<Notification, Error>;
    async fn notification_by_id(&mut self, id: Id) -> Result<Notification, Error>;
    async fn notification_for_user_issue(
        &mut self,
        user_id: Id,
        issue_id: Id,
    ) -> Result<Option<Notification>, Error>;
    async fn notifications_by_issue(&mut self, issue_id: Id) -> Result<Vec<Notification>, Error>;
    /// Predicate search ordered by `updated_at` descending; `page` is a
    /// validated 1-based (page, per_page) pair.
    async fn search_notifications(
        &mut self,
        predicate: &Predicate,
        page: Option<(i64, i64)>,
    ) -> Result<Vec<Notification>, Error>;
    async fn count_notifications(&mut self, predicate: &Predicate) -> Result<i64, Error>;
    async fn resurface_notification(
        &mut self,
        id: Id,
        comment_id: Id,
        updated_by: Id,
    ) -> Result<(), Error>;
    async fn touch_notification(&mut self, id: Id, updated_by: Id) -> Result<(), Error>;
    async fn set_notification_status(
        &mut self,
        id: Id,
        status: NotificationStatus,
    ) -> Result<(), Error>;
    async fn bulk_update_status(
        &mut self,
        user_id: Id,
        from: NotificationStatus,
        to: NotificationStatus,
        updated_by: Id,
    ) -> Result<u64, Error>;

    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

/// The production store, bound to Postgres through the `tracker-sql` query
/// layer.
#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, Error> {
        let txn = self
            .pool
            .begin()
            .await
            .context("beginning store transaction")?;
        Ok(PgSession { txn })
    }
}

pub struct PgSession {
    txn: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait::async_trait]
impl Session for PgSession {
    async fn issue_by_id(&mut self, id: Id) -> Result<Issue, Error> {
        tracker_sql::issues::by_id(&mut self.txn, id)
            .await
            .context("fetching issue")?
            .ok_or_else(|| Error::not_found("issue", id))
    }

    async fn repository_by_id(&mut self, id: Id) -> Result<Repository, Error> {
        tracker_sql::repos::by_id(&mut self.txn, id)
            .await
            .context("fetching repository")?
            .ok_or_else(|| Error::not_found("repository", id))
    }

    async fn user_by_id(&mut self, id: Id) -> Result<User, Error> {
        tracker_sql::users::by_id(&mut self.txn, id)
            .await
            .context("fetching user")?
            .ok_or_else(|| Error::not_found("user", id))
    }

    async fn comment_by_id(&mut self, id: Id) -> Result<Comment, Error> {
        tracker_sql::comments::by_id(&mut self.txn, id)
            .await
            .context("fetching comment")?
            .ok_or_else(|| Error::not_found("comment", id))
    }

    async fn issues_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Issue>, Error> {
        Ok(tracker_sql::issues::by_ids(&mut self.txn, ids)
            .await
            .context("fetching issues")?)
    }

    async fn repositories_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Repository>, Error> {
        Ok(tracker_sql::repos::by_ids(&mut self.txn, ids)
            .await
            .context("fetching repositories")?)
    }

    async fn users_by_ids(&mut self, ids: &[Id]) -> Result<Vec<User>, Error> {
        Ok(tracker_sql::users::by_ids(&mut self.txn, ids)
            .await
            .context("fetching users")?)
    }

    async fn comments_by_ids(&mut self, ids: &[Id]) -> Result<Vec<Comment>, Error> {
        Ok(tracker_sql::comments::by_ids(&mut self.txn, ids)
            .await
            .context("fetching comments")?)
    }

    async fn last_comments_of_issues(&mut self, issue_ids: &[Id]) -> Result<Vec<Comment>, Error> {
        Ok(tracker_sql::comments::last_for_issues(&mut self.txn, issue_ids)
            .await
            .context("fetching latest comments")?)
    }

    async fn issue_watchers(&mut self, issue_id: Id) -> Result<Vec<IssueWatch>, Error> {
        Ok(tracker_sql::watches::issue_watchers(&mut self.txn, issue_id)
            .await
            .context("fetching issue watchers")?)
    }

    async fn repository_watchers(&mut self, repo_id: Id) -> Result<Vec<Watch>, Error> {
        Ok(
            tracker_sql::watches::repository_watchers(&mut self.txn, repo_id)
                .await
                .context("fetching repository watchers")?,
        )
    }

    async fn check_unit_user(
        &mut self,
        repo_id: Id,
        user_id: Id,
        unit: UnitKind,
    ) -> Result<bool, Error> {
        Ok(
            tracker_sql::repos::check_unit_user(&mut self.txn, repo_id, user_id, unit)
                .await
                .context("checking unit access")?,
        )
    }

    async fn insert_notification(&mut self, new: NewNotification) -> Result<Notification, Error> {
        Ok(tracker_sql::notifications::insert(&mut self.txn, &new)
            .await
            .context("inserting notification")?)
    }

    async fn notification_by_id(&mut self, id: Id) -> Result<Notification, Error> {
        tracker_sql::notifications::by_id(&mut self.txn, id)
            .await
            .context("fetching notification")?
            .ok_or_else(|| Error::not_found("notification", id))
    }

    async fn notification_for_user_issue(
        &mut self,
        user_id: Id,
        issue_id: Id,
    ) -> Result<Option<Notification>, Error> {
        Ok(
            tracker_sql::notifications::for_user_issue(&mut self.txn, user_id, issue_id)
                .await
                .context("fetching user-issue notification")?,
        )
    }

    async fn notifications_by_issue(&mut self, issue_id: Id) -> Result<Vec<Notification>, Error> {
        Ok(
            tracker_sql::notifications::by_issue(&mut self.txn, issue_id)
                .await
                .context("fetching issue notifications")?,
        )
    }

    async fn search_notifications(
        &mut self,
        predicate: &Predicate,
        page: Option<(i64, i64)>,
    ) -> Result<Vec<Notification>, Error> {
        Ok(
            tracker_sql::notifications::search(&mut self.txn, predicate, page)
                .await
                .context("searching notifications")?,
        )
    }

    async fn count_notifications(&mut self, predicate: &Predicate) -> Result<i64, Error> {
        Ok(tracker_sql::notifications::count(&mut self.txn, predicate)
            .await
            .context("counting notifications")?)
    }

    async fn resurface_notification(
        &mut self,
        id: Id,
        comment_id: Id,
        updated_by: Id,
    ) -> Result<(), Error> {
        Ok(
            tracker_sql::notifications::resurface(&mut self.txn, id, comment_id, updated_by)
                .await
                .context("resurfacing notification")?,
        )
    }

    async fn touch_notification(&mut self, id: Id, updated_by: Id) -> Result<(), Error> {
        Ok(
            tracker_sql::notifications::touch(&mut self.txn, id, updated_by)
                .await
                .context("touching notification")?,
        )
    }

    async fn set_notification_status(
        &mut self,
        id: Id,
        status: NotificationStatus,
    ) -> Result<(), Error> {
        Ok(
            tracker_sql::notifications::set_status(&mut self.txn, id, status)
                .await
                .context("setting notification status")?,
        )
    }

    async fn bulk_update_status(
        &mut self,
        user_id: Id,
        from: NotificationStatus,
        to: NotificationStatus,
        updated_by: Id,
    ) -> Result<u64, Error> {
        Ok(tracker_sql::notifications::bulk_update_status(
            &mut self.txn,
            user_id,
            from,
            to,
            updated_by,
        )
        .await
        .context("bulk-updating notification statuses")?)
    }

    async fn commit(self) -> Result<(), Error> {
        Ok(self.txn.commit().await.context("committing transaction")?)
    }

    async fn rollback(self) -> Result<(), Error> {
        Ok(self
            .txn
            .rollback()
            .await
            .context("rolling back transaction")?)
    }
}
