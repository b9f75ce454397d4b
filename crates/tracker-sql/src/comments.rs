use super::id_params;
use models::{Comment, Id};

const COLUMNS: &str = "id, issue_id, poster_id, created_at";

pub async fn by_id(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
) -> sqlx::Result<Option<Comment>> {
    let sql = format!("select {COLUMNS} from comments where id = $1");
    sqlx::query_as::<_, Comment>(&sql)
        .bind(id)
        .fetch_optional(&mut *txn)
        .await
}

pub async fn by_ids(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[Id],
) -> sqlx::Result<Vec<Comment>> {
    let sql = format!("select {COLUMNS} from comments where id = any($1)");
    sqlx::query_as::<_, Comment>(&sql)
        .bind(id_params(ids))
        .fetch_all(&mut *txn)
        .await
}

/// The most recent comment of each listed issue, one row per issue that has
/// any. Issues without comments produce no row.
pub async fn last_for_issues(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    issue_ids: &[Id],
) -> sqlx::Result<Vec<Comment>> {
    let sql = format!(
        "select distinct on (issue_id) {COLUMNS} \
         from comments where issue_id = any($1) \
         order by issue_id, created_at desc, id desc"
    );
    sqlx::query_as::<_, Comment>(&sql)
        .bind(id_params(issue_ids))
        .fetch_all(&mut *txn)
        .await
}
