mod entity;
mod id;
mod notification;
mod predicate;

pub use entity::{Comment, Issue, IssueWatch, Repository, UnitKind, User, Watch};
pub use id::Id;
pub use notification::{
    FindOptions, NewNotification, Notification, NotificationSource, NotificationStatus,
};
pub use predicate::{Field, Predicate, Value};
