//! Read and write paths over a user's notifications. Every operation takes
//! its session explicitly; transaction boundaries belong to the caller.

use crate::store::Session;
use crate::Error;
use models::{Field, FindOptions, Id, Notification, NotificationStatus, Predicate, Value};

/// All notifications matching the filter, most recently updated first.
pub async fn find_by_options<S: Session>(
    session: &mut S,
    opts: &FindOptions,
) -> Result<Vec<Notification>, Error> {
    session
        .search_notifications(&opts.as_predicate(), None)
        .await
}

/// A user's notifications restricted to the given statuses, most recently
/// updated first. Fails closed: an empty status list yields an empty
/// result, never "all statuses". Pagination applies only when both `page`
/// and `per_page` are positive.
pub async fn notifications_for_user<S: Session>(
    session: &mut S,
    user_id: Id,
    statuses: &[NotificationStatus],
    page: i64,
    per_page: i64,
) -> Result<Vec<Notification>, Error> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let predicate = Predicate::And(vec![
        Predicate::Eq(Field::UserId, Value::Id(user_id)),
        Predicate::In(
            Field::Status,
            statuses.iter().copied().map(Value::Status).collect(),
        ),
    ]);
    let page = (page > 0 && per_page > 0).then_some((page, per_page));
    session.search_notifications(&predicate, page).await
}

pub async fn notification_by_id<S: Session>(
    session: &mut S,
    id: Id,
) -> Result<Notification, Error> {
    session.notification_by_id(id).await
}

/// Overwrites the status of a notification owned by `acting_user`. Direct
/// user action always wins; no merge logic applies here.
pub async fn set_status<S: Session>(
    session: &mut S,
    notification_id: Id,
    acting_user: Id,
    status: NotificationStatus,
) -> Result<(), Error> {
    let notification = session.notification_by_id(notification_id).await?;
    if notification.user_id != acting_user {
        return Err(Error::Permission {
            notification: notification_id,
            user: acting_user,
        });
    }
    session
        .set_notification_status(notification_id, status)
        .await
}

/// Transitions the (user, issue) notification to read, if it exists and is
/// currently unread. Callers invoke this speculatively; a missing record
/// is success, not an error.
pub async fn mark_read_if_unread<S: Session>(
    session: &mut S,
    user_id: Id,
    issue_id: Id,
) -> Result<(), Error> {
    let Some(notification) = session.notification_for_user_issue(user_id, issue_id).await? else {
        return Ok(());
    };
    if notification.status != NotificationStatus::Unread {
        return Ok(());
    }
    session
        .set_notification_status(notification.id, NotificationStatus::Read)
        .await
}

/// Moves all of a user's notifications in `from` to `to` with one bulk
/// update, recording `acting_user` as the last toucher. Returns how many
/// rows changed.
pub async fn update_statuses<S: Session>(
    session: &mut S,
    user_id: Id,
    from: NotificationStatus,
    to: NotificationStatus,
    acting_user: Id,
) -> Result<u64, Error> {
    let changed = session
        .bulk_update_status(user_id, from, to, acting_user)
        .await?;
    tracing::debug!(%user_id, ?from, ?to, changed, "bulk notification status transition");
    Ok(changed)
}

/// Exact count of a user's notifications in the given status.
pub async fn count<S: Session>(
    session: &mut S,
    user_id: Id,
    status: NotificationStatus,
) -> Result<i64, Error> {
    let predicate = Predicate::And(vec![
        Predicate::Eq(Field::UserId, Value::Id(user_id)),
        Predicate::Eq(Field::Status, Value::Status(status)),
    ]);
    session.count_notifications(&predicate).await
}
