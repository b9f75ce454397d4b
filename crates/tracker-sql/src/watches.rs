use models::{Id, IssueWatch, Watch};

/// Every per-issue subscription row of the issue, including explicit
/// opt-outs (`is_watching = false`).
pub async fn issue_watchers(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    issue_id: Id,
) -> sqlx::Result<Vec<IssueWatch>> {
    sqlx::query_as::<_, IssueWatch>(
        "select user_id, issue_id, is_watching from issue_watches where issue_id = $1",
    )
    .bind(issue_id)
    .fetch_all(&mut *txn)
    .await
}

pub async fn repository_watchers(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    repo_id: Id,
) -> sqlx::Result<Vec<Watch>> {
    sqlx::query_as::<_, Watch>("select user_id, repo_id from watches where repo_id = $1")
        .bind(repo_id)
        .fetch_all(&mut *txn)
        .await
}
