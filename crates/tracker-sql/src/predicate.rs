use chrono::{DateTime, Utc};
use models::{Field, Predicate, Value};

/// A predicate rendered to a parameterized WHERE clause plus its bind
/// values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub clause: String,
    pub binds: Vec<BindValue>,
}

/// An owned bind value. Everything the predicate grammar can express
/// lowers to one of these Postgres-native shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindValue {
    Int(i64),
    SmallInt(i16),
    Timestamp(DateTime<Utc>),
}

pub fn render(predicate: &Predicate) -> SqlPredicate {
    let mut rendered = SqlPredicate {
        clause: String::new(),
        binds: Vec::new(),
    };
    render_into(predicate, &mut rendered);
    if rendered.clause.is_empty() {
        rendered.clause.push_str("true");
    }
    rendered
}

fn render_into(predicate: &Predicate, out: &mut SqlPredicate) {
    match predicate {
        Predicate::Eq(field, value) => render_comparison(field, "=", value, out),
        Predicate::Gte(field, value) => render_comparison(field, ">=", value, out),
        Predicate::Lte(field, value) => render_comparison(field, "<=", value, out),
        Predicate::In(field, values) => {
            // An empty membership list matches nothing.
            if values.is_empty() {
                out.clause.push_str("false");
                return;
            }
            out.clause.push_str(column(field));
            out.clause.push_str(" in (");
            for (index, value) in values.iter().enumerate() {
                if index != 0 {
                    out.clause.push_str(", ");
                }
                push_bind(value, out);
            }
            out.clause.push(')');
        }
        Predicate::And(terms) => {
            for (index, term) in terms.iter().enumerate() {
                if index != 0 {
                    out.clause.push_str(" and ");
                }
                render_into(term, out);
            }
        }
    }
}

fn render_comparison(field: &Field, op: &str, value: &Value, out: &mut SqlPredicate) {
    out.clause.push_str(column(field));
    out.clause.push(' ');
    out.clause.push_str(op);
    out.clause.push(' ');
    push_bind(value, out);
}

fn push_bind(value: &Value, out: &mut SqlPredicate) {
    out.binds.push(match value {
        Value::Id(id) => BindValue::Int(id.as_i64()),
        Value::Status(status) => BindValue::SmallInt(*status as i16),
        Value::Time(ts) => BindValue::Timestamp(*ts),
    });
    out.clause.push('$');
    out.clause.push_str(&out.binds.len().to_string());
}

fn column(field: &Field) -> &'static str {
    match field {
        Field::UserId => "user_id",
        Field::RepoId => "repo_id",
        Field::IssueId => "issue_id",
        Field::Status => "status",
        Field::UpdatedAt => "updated_at",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use models::{FindOptions, Id, NotificationStatus};

    #[test]
    fn renders_conjunctions_with_ordered_placeholders() {
        let opts = FindOptions {
            user_id: Some(Id::new(3)),
            repo_id: Some(Id::new(11)),
            status: Some(NotificationStatus::Unread),
            updated_after: Some(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let rendered = render(&opts.as_predicate());

        insta::assert_snapshot!(
            rendered.clause,
            @"user_id = $1 and repo_id = $2 and status = $3 and updated_at >= $4"
        );
        assert_eq!(
            rendered.binds,
            vec![
                BindValue::Int(3),
                BindValue::Int(11),
                BindValue::SmallInt(1),
                BindValue::Timestamp(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn renders_membership() {
        let predicate = Predicate::And(vec![
            Predicate::Eq(Field::UserId, Value::Id(Id::new(3))),
            Predicate::In(
                Field::Status,
                vec![
                    Value::Status(NotificationStatus::Unread),
                    Value::Status(NotificationStatus::Pinned),
                ],
            ),
        ]);
        let rendered = render(&predicate);
        insta::assert_snapshot!(rendered.clause, @"user_id = $1 and status in ($2, $3)");
    }

    #[test]
    fn empty_conjunction_matches_everything() {
        let rendered = render(&Predicate::And(Vec::new()));
        assert_eq!(rendered.clause, "true");
        assert!(rendered.binds.is_empty());
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let rendered = render(&Predicate::In(Field::Status, Vec::new()));
        assert_eq!(rendered.clause, "false");
        assert!(rendered.binds.is_empty());
    }
}
