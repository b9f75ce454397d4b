use models::{FindOptions, Id, NotificationStatus};
use notifications::store::{Session, Store};
use notifications::testing::MemStore;
use notifications::{create_or_update_issue_notifications, status, Error};
use pretty_assertions::assert_eq;

/// One watcher, three issues, one fan-out per issue in order.
async fn seed_inbox(store: &MemStore) -> (Id, Vec<Id>) {
    let author = store.add_user("alice");
    let watcher = store.add_user("walt");
    let repo = store.add_repo(author, "widgets", false);
    store.watch_repo(watcher, repo);

    let mut issues = Vec::new();
    for title in ["first", "second", "third"] {
        let issue = store.add_issue(repo, title, false, author);
        let comment = store.add_comment(issue, author);
        create_or_update_issue_notifications(store, issue, comment, author)
            .await
            .unwrap();
        issues.push(issue);
    }
    (watcher, issues)
}

#[tokio::test]
async fn empty_statuses_fail_closed() {
    let store = MemStore::new();
    let (watcher, _) = seed_inbox(&store).await;

    let mut session = store.begin().await.unwrap();
    let rows = status::notifications_for_user(&mut session, watcher, &[], 0, 0)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn for_user_orders_by_recency_and_paginates() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;

    // A fresh event on the first issue bumps it back to the top.
    let author = store.add_user("amber");
    let comment = store.add_comment(issues[0], author);
    create_or_update_issue_notifications(&store, issues[0], comment, author)
        .await
        .unwrap();

    let mut session = store.begin().await.unwrap();
    let unread = &[NotificationStatus::Unread];

    let rows = status::notifications_for_user(&mut session, watcher, unread, 0, 0)
        .await
        .unwrap();
    assert_eq!(
        rows.iter().map(|n| n.issue_id).collect::<Vec<_>>(),
        vec![issues[0], issues[2], issues[1]],
    );

    // Pagination applies only when both page and per_page are positive.
    let page2 = status::notifications_for_user(&mut session, watcher, unread, 2, 1)
        .await
        .unwrap();
    assert_eq!(
        page2.iter().map(|n| n.issue_id).collect::<Vec<_>>(),
        vec![issues[2]],
    );
    let unpaged = status::notifications_for_user(&mut session, watcher, unread, 3, 0)
        .await
        .unwrap();
    assert_eq!(unpaged.len(), 3);
}

#[tokio::test]
async fn find_by_options_composes_conjunctively() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;

    let mut session = store.begin().await.unwrap();
    let by_issue = status::find_by_options(
        &mut session,
        &FindOptions {
            user_id: Some(watcher),
            issue_id: Some(issues[1]),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_issue.len(), 1);
    assert_eq!(by_issue[0].issue_id, issues[1]);

    let none = status::find_by_options(
        &mut session,
        &FindOptions {
            user_id: Some(watcher),
            status: Some(NotificationStatus::Pinned),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(none.is_empty());

    let all = status::find_by_options(&mut session, &FindOptions::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn set_status_requires_ownership() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;
    let stranger = store.add_user("sam");
    let n = store.notification_for(watcher, issues[0]).unwrap();

    let mut session = store.begin().await.unwrap();
    let err = status::set_status(&mut session, n.id, stranger, NotificationStatus::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Permission { .. }));

    // The owner's direct action always wins, including un-pinning.
    status::set_status(&mut session, n.id, watcher, NotificationStatus::Pinned)
        .await
        .unwrap();
    status::set_status(&mut session, n.id, watcher, NotificationStatus::Read)
        .await
        .unwrap();
    session.commit().await.unwrap();

    let n = store.notification_for(watcher, issues[0]).unwrap();
    assert_eq!(n.status, NotificationStatus::Read);
}

#[tokio::test]
async fn set_status_of_a_missing_notification_is_not_found() {
    let store = MemStore::new();
    let user = store.add_user("walt");

    let mut session = store.begin().await.unwrap();
    let err = status::set_status(&mut session, Id::new(404), user, NotificationStatus::Read)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn mark_read_if_unread_is_a_speculative_no_op() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;

    // No notification at all: success, no effect.
    let mut session = store.begin().await.unwrap();
    status::mark_read_if_unread(&mut session, watcher, Id::new(404))
        .await
        .unwrap();

    // Unread transitions to read.
    status::mark_read_if_unread(&mut session, watcher, issues[0])
        .await
        .unwrap();
    session.commit().await.unwrap();
    let n = store.notification_for(watcher, issues[0]).unwrap();
    assert_eq!(n.status, NotificationStatus::Read);

    // Pinned is left alone.
    let pinned = store.notification_for(watcher, issues[1]).unwrap();
    let mut session = store.begin().await.unwrap();
    status::set_status(&mut session, pinned.id, watcher, NotificationStatus::Pinned)
        .await
        .unwrap();
    status::mark_read_if_unread(&mut session, watcher, issues[1])
        .await
        .unwrap();
    session.commit().await.unwrap();
    assert_eq!(
        store.notification_for(watcher, issues[1]).unwrap().status,
        NotificationStatus::Pinned,
    );
}

#[tokio::test]
async fn bulk_transition_and_counts() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;

    let mut session = store.begin().await.unwrap();
    assert_eq!(
        status::count(&mut session, watcher, NotificationStatus::Unread)
            .await
            .unwrap(),
        3
    );

    // Pin one, then mark all unread as read.
    let pinned = store.notification_for(watcher, issues[2]).unwrap();
    status::set_status(&mut session, pinned.id, watcher, NotificationStatus::Pinned)
        .await
        .unwrap();
    let changed = status::update_statuses(
        &mut session,
        watcher,
        NotificationStatus::Unread,
        NotificationStatus::Read,
        watcher,
    )
    .await
    .unwrap();
    assert_eq!(changed, 2);
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    assert_eq!(
        status::count(&mut session, watcher, NotificationStatus::Unread)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        status::count(&mut session, watcher, NotificationStatus::Read)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        status::count(&mut session, watcher, NotificationStatus::Pinned)
            .await
            .unwrap(),
        1
    );
    for n in store.notifications() {
        if n.status == NotificationStatus::Read {
            assert_eq!(n.updated_by, watcher);
        }
    }
}

#[tokio::test]
async fn uncommitted_sessions_change_nothing() {
    let store = MemStore::new();
    let (watcher, issues) = seed_inbox(&store).await;
    let n = store.notification_for(watcher, issues[0]).unwrap();

    let mut session = store.begin().await.unwrap();
    status::set_status(&mut session, n.id, watcher, NotificationStatus::Read)
        .await
        .unwrap();
    session.rollback().await.unwrap();

    assert_eq!(
        store.notification_for(watcher, issues[0]).unwrap().status,
        NotificationStatus::Unread,
    );
}
