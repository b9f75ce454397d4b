use super::predicate::{render, BindValue};
use models::{Id, NewNotification, Notification, NotificationStatus, Predicate};

const COLUMNS: &str = "id, user_id, repo_id, issue_id, status, source, \
     commit_id, comment_id, updated_by, created_at, updated_at";

/// Inserts a new, unread notification and returns the stored row.
pub async fn insert(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new: &NewNotification,
) -> sqlx::Result<Notification> {
    let sql = format!(
        "insert into notifications \
            (user_id, repo_id, issue_id, status, source, comment_id, updated_by) \
         values ($1, $2, $3, $4, $5, $6, $7) \
         returning {COLUMNS}"
    );
    sqlx::query_as::<_, Notification>(&sql)
        .bind(new.user_id)
        .bind(new.repo_id)
        .bind(new.issue_id)
        .bind(NotificationStatus::Unread)
        .bind(new.source)
        .bind(new.comment_id)
        .bind(new.updated_by)
        .fetch_one(&mut *txn)
        .await
}

pub async fn by_id(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
) -> sqlx::Result<Option<Notification>> {
    let sql = format!("select {COLUMNS} from notifications where id = $1");
    sqlx::query_as::<_, Notification>(&sql)
        .bind(id)
        .fetch_optional(&mut *txn)
        .await
}

/// The unique row for a (user, issue) pair, if any.
pub async fn for_user_issue(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Id,
    issue_id: Id,
) -> sqlx::Result<Option<Notification>> {
    let sql = format!("select {COLUMNS} from notifications where user_id = $1 and issue_id = $2");
    sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(issue_id)
        .fetch_optional(&mut *txn)
        .await
}

pub async fn by_issue(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    issue_id: Id,
) -> sqlx::Result<Vec<Notification>> {
    let sql = format!("select {COLUMNS} from notifications where issue_id = $1");
    sqlx::query_as::<_, Notification>(&sql)
        .bind(issue_id)
        .fetch_all(&mut *txn)
        .await
}

/// Runs a rendered predicate query ordered by recency. `page` is the
/// 1-based (page, per_page) pair; pagination is already validated by the
/// caller.
#[tracing::instrument(level = "debug", skip(txn, predicate))]
pub async fn search(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    predicate: &Predicate,
    page: Option<(i64, i64)>,
) -> sqlx::Result<Vec<Notification>> {
    let mut rendered = render(predicate);
    let mut sql = format!(
        "select {COLUMNS} from notifications where {} \
         order by updated_at desc, id desc",
        rendered.clause
    );
    if let Some((page, per_page)) = page {
        rendered.binds.push(BindValue::Int(per_page));
        sql.push_str(&format!(" limit ${}", rendered.binds.len()));
        rendered.binds.push(BindValue::Int((page - 1) * per_page));
        sql.push_str(&format!(" offset ${}", rendered.binds.len()));
    }

    let mut query = sqlx::query_as::<_, Notification>(&sql);
    for bind in &rendered.binds {
        query = match *bind {
            BindValue::Int(v) => query.bind(v),
            BindValue::SmallInt(v) => query.bind(v),
            BindValue::Timestamp(v) => query.bind(v),
        };
    }
    query.fetch_all(&mut *txn).await
}

pub async fn count(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    predicate: &Predicate,
) -> sqlx::Result<i64> {
    let rendered = render(predicate);
    let sql = format!(
        "select count(*) from notifications where {}",
        rendered.clause
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &rendered.binds {
        query = match *bind {
            BindValue::Int(v) => query.bind(v),
            BindValue::SmallInt(v) => query.bind(v),
            BindValue::Timestamp(v) => query.bind(v),
        };
    }
    query.fetch_one(&mut *txn).await
}

/// Re-surfaces a previously read row: back to unread, pointing at the new
/// comment.
pub async fn resurface(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
    comment_id: Id,
    updated_by: Id,
) -> sqlx::Result<()> {
    sqlx::query(
        "update notifications set \
            status = $2, comment_id = $3, updated_by = $4, updated_at = now() \
         where id = $1",
    )
    .bind(id)
    .bind(NotificationStatus::Unread)
    .bind(comment_id)
    .bind(updated_by)
    .execute(&mut *txn)
    .await?;
    Ok(())
}

/// Records the latest actor without touching the comment pointer.
pub async fn touch(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
    updated_by: Id,
) -> sqlx::Result<()> {
    sqlx::query("update notifications set updated_by = $2, updated_at = now() where id = $1")
        .bind(id)
        .bind(updated_by)
        .execute(&mut *txn)
        .await?;
    Ok(())
}

pub async fn set_status(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
    status: NotificationStatus,
) -> sqlx::Result<()> {
    sqlx::query("update notifications set status = $2, updated_at = now() where id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *txn)
        .await?;
    Ok(())
}

/// Moves every row of `user_id` in `from` to `to` in one statement,
/// returning the affected-row count.
pub async fn bulk_update_status(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Id,
    from: NotificationStatus,
    to: NotificationStatus,
    updated_by: Id,
) -> sqlx::Result<u64> {
    let done = sqlx::query(
        "update notifications set status = $3, updated_by = $4, updated_at = now() \
         where user_id = $1 and status = $2",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .bind(updated_by)
    .execute(&mut *txn)
    .await?;
    Ok(done.rows_affected())
}
