use super::id_params;
use models::{Id, User};

const COLUMNS: &str = "id, name, full_name";

pub async fn by_id(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
) -> sqlx::Result<Option<User>> {
    let sql = format!("select {COLUMNS} from users where id = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(&mut *txn)
        .await
}

pub async fn by_ids(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[Id],
) -> sqlx::Result<Vec<User>> {
    let sql = format!("select {COLUMNS} from users where id = any($1)");
    sqlx::query_as::<_, User>(&sql)
        .bind(id_params(ids))
        .fetch_all(&mut *txn)
        .await
}
