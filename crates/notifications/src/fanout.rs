use crate::store::{Session, Store};
use crate::Error;
use models::{
    Id, Issue, NewNotification, Notification, NotificationSource, NotificationStatus, UnitKind,
};
use std::collections::HashSet;

/// Applies one issue event: for every watcher of the issue or its
/// repository, create or merge that user's notification row, atomically.
///
/// `comment_id` is the triggering comment (`Id::ZERO` for events without
/// one, such as a status change) and `actor_id` the user whose own action
/// triggered the event, who is never notified for it. Any failure rolls
/// the whole fan-out back; partial delivery is never visible.
#[tracing::instrument(level = "debug", err, skip(store))]
pub async fn create_or_update_issue_notifications<St: Store>(
    store: &St,
    issue_id: Id,
    comment_id: Id,
    actor_id: Id,
) -> Result<(), Error> {
    let mut session = store.begin().await?;

    match fan_out(&mut session, issue_id, comment_id, actor_id).await {
        Ok(()) => session.commit().await,
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                tracing::warn!(error = %rollback_err, "failed to roll back notification fan-out");
            }
            Err(err)
        }
    }
}

async fn fan_out<S: Session>(
    session: &mut S,
    issue_id: Id,
    comment_id: Id,
    actor_id: Id,
) -> Result<(), Error> {
    let issue_watches = session.issue_watchers(issue_id).await?;
    let issue = session.issue_by_id(issue_id).await?;
    let repo = session.repository_by_id(issue.repo_id).await?;
    let repo_watches = session.repository_watchers(repo.id).await?;

    // Rows already present for this issue, loaded once so the per-recipient
    // upsert needn't re-query. Within this transaction the list stays
    // authoritative: the decided-set guarantees each (user, issue) pair is
    // touched at most once per fan-out.
    let existing = session.notifications_by_issue(issue_id).await?;

    let mut decided: HashSet<Id> =
        HashSet::with_capacity(issue_watches.len() + repo_watches.len());

    // Issue-level entries come first: an explicit unwatch recorded here
    // wins over any repository-level watch of the same user.
    for watch in &issue_watches {
        if !watch.is_watching {
            decided.insert(watch.user_id);
            continue;
        }
        notify_user(
            session,
            &existing,
            &issue,
            watch.user_id,
            comment_id,
            actor_id,
            &mut decided,
        )
        .await?;
    }

    let unit = if issue.is_pull {
        UnitKind::PullRequests
    } else {
        UnitKind::Issues
    };
    for watch in &repo_watches {
        if watch.user_id == actor_id || decided.contains(&watch.user_id) {
            continue;
        }
        if !session
            .check_unit_user(repo.id, watch.user_id, unit)
            .await?
        {
            continue;
        }
        notify_user(
            session,
            &existing,
            &issue,
            watch.user_id,
            comment_id,
            actor_id,
            &mut decided,
        )
        .await?;
    }

    Ok(())
}

/// Creates or merges one user's notification for the issue. Idempotent per
/// (user, issue) pair within a fan-out via the decided-set.
async fn notify_user<S: Session>(
    session: &mut S,
    existing: &[Notification],
    issue: &Issue,
    user_id: Id,
    comment_id: Id,
    actor_id: Id,
    decided: &mut HashSet<Id>,
) -> Result<(), Error> {
    if user_id == actor_id {
        return Ok(());
    }
    if !decided.insert(user_id) {
        return Ok(());
    }

    let current = existing
        .iter()
        .find(|n| n.issue_id == issue.id && n.user_id == user_id);
    match current {
        None => {
            let source = if issue.is_pull {
                NotificationSource::PullRequest
            } else {
                NotificationSource::Issue
            };
            session
                .insert_notification(NewNotification {
                    user_id,
                    repo_id: issue.repo_id,
                    issue_id: issue.id,
                    source,
                    comment_id,
                    updated_by: actor_id,
                })
                .await?;
            Ok(())
        }
        Some(n) if n.status == NotificationStatus::Read => {
            // A read notification catching new activity resurfaces and
            // points at the new comment.
            session
                .resurface_notification(n.id, comment_id, actor_id)
                .await
        }
        Some(n) => {
            // Unread or pinned: keep the comment pointer on the oldest
            // unseen comment so intermediate activity is not skipped; only
            // the last-toucher metadata is refreshed.
            session.touch_notification(n.id, actor_id).await
        }
    }
}
