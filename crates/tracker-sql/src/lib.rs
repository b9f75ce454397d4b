//! Postgres query layer for the tracker.
//!
//! Every function takes the transaction it runs in as an explicit parameter;
//! there is no ambient connection handle. Queries use the runtime sqlx API
//! (this crate ships without a prepared offline query cache), and rows decode
//! through the `sqlx-support` impls of the `models` crate.

pub mod comments;
pub mod issues;
pub mod notifications;
pub mod predicate;
pub mod repos;
pub mod users;
pub mod watches;

use models::Id;

pub(crate) fn id_params(ids: &[Id]) -> Vec<i64> {
    ids.iter().map(Id::as_i64).collect()
}
