use super::id_params;
use models::{Id, Repository, UnitKind};

const COLUMNS: &str = "id, owner_id, owner_name, name, is_private";

pub async fn by_id(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Id,
) -> sqlx::Result<Option<Repository>> {
    let sql = format!("select {COLUMNS} from repositories where id = $1");
    sqlx::query_as::<_, Repository>(&sql)
        .bind(id)
        .fetch_optional(&mut *txn)
        .await
}

/// One batch round of repository lookups; absent ids are simply not
/// returned.
pub async fn by_ids(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ids: &[Id],
) -> sqlx::Result<Vec<Repository>> {
    let sql = format!("select {COLUMNS} from repositories where id = any($1)");
    sqlx::query_as::<_, Repository>(&sql)
        .bind(id_params(ids))
        .fetch_all(&mut *txn)
        .await
}

/// Whether `user_id` may read the given unit of the repository: the unit
/// must be enabled, and a private repository additionally requires the user
/// to be its owner or a collaborator.
pub async fn check_unit_user(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    repo_id: Id,
    user_id: Id,
    unit: UnitKind,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "select exists(
            select 1 from repositories r
            join repo_units u on u.repo_id = r.id and u.kind = $3
            where r.id = $1 and (
                not r.is_private
                or r.owner_id = $2
                or exists(
                    select 1 from collaborations c
                    where c.repo_id = r.id and c.user_id = $2
                )
            )
        )",
    )
    .bind(repo_id)
    .bind(user_id)
    .bind(unit)
    .fetch_one(&mut *txn)
    .await
}
