use super::id_params;
use models::{Id, Issue};

const COLUMNS: &str = "id, repo_id, index, title, is_pull, poster_id";

pub async fn by_id(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
) -> sqlx::Result<Option<Issue>> {
    let sql = format!("select {COLUMNS} from issues where id = $1");
    sqlx::query_as::<_, Issue>(&sql)
        .bind(id)
        .fetch_optional(&mut *txn)
        .await
}

/// One batch round of issue lookups; absent ids are simply not returned.
pub async fn by_ids(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[Id],
) -> sqlx::Result<Vec<Issue>> {
    let sql = format!("select {COLUMNS} from issues where id = any($1)");
    sqlx::query_as::<_, Issue>(&sql)
        .bind(id_params(ids))
        .fetch_all(&mut *txn)
        .await
}
