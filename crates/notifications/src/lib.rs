//! Notification fan-out and lifecycle tracking.
//!
//! When an issue or pull request receives activity, every user watching it
//! (or watching its repository) must end up with exactly one notification
//! row reflecting that activity. This crate owns that fan-out, the merge
//! rules which keep a user's unseen-comment pointer intact, the batched
//! loading of a display-ready inbox, and the status read/write surface.
//!
//! The module split:
//! - `store`: the session traits every operation runs against, plus the
//!   Postgres binding. Each public entry point takes its session explicitly;
//!   there is no ambient store handle.
//! - `fanout`: recipient resolution and the create-or-merge upsert, applied
//!   atomically per event.
//! - `list`: batched association loading for pages of notifications.
//! - `status`: find/count/mark-read/bulk-transition operations.
//! - `api`: the outward thread representation and its URL scheme.
//! - `testing`: a deterministic in-memory store used by this crate's tests.

pub mod api;
pub mod fanout;
pub mod list;
pub mod status;
pub mod store;
pub mod testing;

pub use fanout::create_or_update_issue_notifications;
pub use list::{NotificationList, NotificationView, Slot};
pub use store::{Session, Store};

use models::Id;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: Id },
    #[error("notification {notification} does not belong to user {user}")]
    Permission { notification: Id, user: Id },
    #[error("store failure")]
    Store(#[source] anyhow::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(anyhow::Error::new(err))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}
