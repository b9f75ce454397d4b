use super::{Id, Notification, NotificationStatus};
use chrono::{DateTime, Utc};

/// A filterable column of the notification relation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Field {
    UserId,
    RepoId,
    IssueId,
    Status,
    UpdatedAt,
}

/// A comparable value for a `Field`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Id(Id),
    Status(NotificationStatus),
    Time(DateTime<Utc>),
}

/// A typed query condition over notifications.
///
/// Stores consume this in place of ad-hoc string-keyed condition maps: the
/// Postgres layer renders it to a parameterized WHERE clause, and the
/// in-memory store evaluates it directly via [`Predicate::matches`]. An
/// empty conjunction matches everything.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Field, Value),
    Gte(Field, Value),
    Lte(Field, Value),
    In(Field, Vec<Value>),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, n: &Notification) -> bool {
        match self {
            Predicate::Eq(field, value) => field_of(field, n) == lower(value),
            Predicate::Gte(field, value) => field_of(field, n) >= lower(value),
            Predicate::Lte(field, value) => field_of(field, n) <= lower(value),
            Predicate::In(field, values) => {
                let have = field_of(field, n);
                values.iter().any(|value| lower(value) == have)
            }
            Predicate::And(terms) => terms.iter().all(|term| term.matches(n)),
        }
    }
}

/// Values lower into a common ordered representation so that range terms
/// work uniformly across field kinds. A kind mismatch (say, a timestamp
/// compared against an id column) never matches: the variants compare
/// unordered and unequal.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
enum Lowered {
    Int(i64),
    Time(DateTime<Utc>),
}

fn lower(value: &Value) -> Lowered {
    match value {
        Value::Id(id) => Lowered::Int(id.as_i64()),
        Value::Status(status) => Lowered::Int(*status as i64),
        Value::Time(ts) => Lowered::Time(*ts),
    }
}

fn field_of(field: &Field, n: &Notification) -> Lowered {
    match field {
        Field::UserId => Lowered::Int(n.user_id.as_i64()),
        Field::RepoId => Lowered::Int(n.repo_id.as_i64()),
        Field::IssueId => Lowered::Int(n.issue_id.as_i64()),
        Field::Status => Lowered::Int(n.status as i64),
        Field::UpdatedAt => Lowered::Time(n.updated_at),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::NotificationSource;
    use chrono::TimeZone;

    fn fixture() -> Notification {
        let ts = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();
        Notification {
            id: Id::new(1),
            user_id: Id::new(7),
            repo_id: Id::new(2),
            issue_id: Id::new(5),
            status: NotificationStatus::Unread,
            source: NotificationSource::Issue,
            commit_id: None,
            comment_id: Id::ZERO,
            updated_by: Id::new(9),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn conjunction_requires_every_term() {
        let n = fixture();
        let both = Predicate::And(vec![
            Predicate::Eq(Field::UserId, Value::Id(Id::new(7))),
            Predicate::Eq(Field::Status, Value::Status(NotificationStatus::Unread)),
        ]);
        assert!(both.matches(&n));

        let miss = Predicate::And(vec![
            Predicate::Eq(Field::UserId, Value::Id(Id::new(7))),
            Predicate::Eq(Field::Status, Value::Status(NotificationStatus::Read)),
        ]);
        assert!(!miss.matches(&n));

        assert!(Predicate::And(Vec::new()).matches(&n));
    }

    #[test]
    fn membership_and_ranges() {
        let n = fixture();
        assert!(Predicate::In(
            Field::Status,
            vec![
                Value::Status(NotificationStatus::Unread),
                Value::Status(NotificationStatus::Pinned),
            ],
        )
        .matches(&n));
        assert!(!Predicate::In(Field::Status, Vec::new()).matches(&n));

        let earlier = Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2023, 4, 2, 0, 0, 0).unwrap();
        assert!(Predicate::Gte(Field::UpdatedAt, Value::Time(earlier)).matches(&n));
        assert!(Predicate::Lte(Field::UpdatedAt, Value::Time(later)).matches(&n));
        assert!(!Predicate::Gte(Field::UpdatedAt, Value::Time(later)).matches(&n));
    }
}
