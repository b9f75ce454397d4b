use models::{Id, NotificationStatus};
use notifications::api::ThreadFormatter;
use notifications::store::Store;
use notifications::testing::MemStore;
use notifications::{create_or_update_issue_notifications, status, NotificationList, Slot};

/// `watchers` users watching one repository, one fan-out per issue title.
async fn seed(store: &MemStore, repo_name: &str, titles: &[&str], watchers: &[Id]) -> Vec<Id> {
    let author = store.add_user(&format!("author-of-{repo_name}"));
    let repo = store.add_repo(author, repo_name, false);
    for watcher in watchers {
        store.watch_repo(*watcher, repo);
    }
    let mut issues = Vec::new();
    for title in titles {
        let issue = store.add_issue(repo, title, false, author);
        let comment = store.add_comment(issue, author);
        create_or_update_issue_notifications(store, issue, comment, author)
            .await
            .unwrap();
        issues.push(issue);
    }
    issues
}

#[tokio::test]
async fn load_repositories_deduplicates_lookups_and_output() {
    let store = MemStore::new();
    let walt = store.add_user("walt");
    let wendy = store.add_user("wendy");
    // Five notifications across two distinct repositories.
    seed(&store, "widgets", &["a", "b"], &[walt, wendy]).await;
    seed(&store, "gears", &["c"], &[walt]).await;

    let mut session = store.begin().await.unwrap();
    let rows = status::find_by_options(&mut session, &Default::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);

    let (list, distinct) = NotificationList::new(rows)
        .load_repositories(&mut session)
        .await
        .unwrap();

    // Two repositories referenced five times: one batch round fetching
    // exactly two rows, and exactly two distinct entries out.
    assert_eq!(store.stats().repo_batch_rounds(), 1);
    assert_eq!(store.stats().repo_rows_fetched(), 2);
    assert_eq!(distinct.len(), 2);
    assert!(list.views().iter().all(|view| view.repository.is_loaded()));

    // Re-loading skips views that already carry their repository.
    let (_, distinct) = list.load_repositories(&mut session).await.unwrap();
    assert_eq!(store.stats().repo_batch_rounds(), 1);
    assert_eq!(distinct.len(), 2);
}

#[tokio::test]
async fn batch_rounds_are_bounded() {
    let store = MemStore::new();
    let walt = store.add_user("walt");
    // 120 distinct repositories, one notification each: three bounded
    // rounds of at most 50 keys.
    for i in 0..120 {
        seed(&store, &format!("repo-{i}"), &["only"], &[walt]).await;
    }

    let mut session = store.begin().await.unwrap();
    let rows = status::find_by_options(&mut session, &Default::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 120);

    let (_, distinct) = NotificationList::new(rows)
        .load_repositories(&mut session)
        .await
        .unwrap();
    assert_eq!(distinct.len(), 120);
    assert_eq!(store.stats().repo_batch_rounds(), 3);
    assert_eq!(store.stats().repo_rows_fetched(), 120);
}

#[tokio::test]
async fn load_attributes_fills_every_slot() {
    let store = MemStore::new();
    let walt = store.add_user("walt");
    let issues = seed(&store, "widgets", &["a"], &[walt]).await;
    // A second comment after the fan-out: the notification keeps pointing
    // at the first, while the latest-comment slot sees the newest.
    let amber = store.add_user("amber");
    let latest = store.add_comment(issues[0], amber);

    let mut session = store.begin().await.unwrap();
    let rows = status::find_by_options(&mut session, &Default::default())
        .await
        .unwrap();
    let list = NotificationList::new(rows)
        .load_attributes(&mut session)
        .await
        .unwrap();

    let view = &list.views()[0];
    assert_eq!(view.notification.user_id, walt);
    assert_eq!(view.repository.get().unwrap().name, "widgets");
    assert_eq!(view.issue.get().unwrap().title, "a");
    assert_eq!(view.user.get().unwrap().name, "walt");

    let pointed = view.comment.get().unwrap().as_ref().unwrap();
    assert_eq!(pointed.id, view.notification.comment_id);
    let newest = view.latest_comment.get().unwrap().as_ref().unwrap();
    assert_eq!(newest.id, latest);
    assert!(newest.id != pointed.id);
}

#[tokio::test]
async fn a_zero_comment_reference_resolves_without_lookup() {
    let store = MemStore::new();
    let owner = store.add_user("alice");
    let walt = store.add_user("walt");
    let repo = store.add_repo(owner, "widgets", false);
    let issue = store.add_issue(repo, "no comment yet", false, owner);
    store.watch_issue(walt, issue, true);
    create_or_update_issue_notifications(&store, issue, Id::ZERO, owner)
        .await
        .unwrap();

    let mut session = store.begin().await.unwrap();
    let rows = status::find_by_options(&mut session, &Default::default())
        .await
        .unwrap();
    let list = NotificationList::new(rows)
        .load_attributes(&mut session)
        .await
        .unwrap();

    let view = &list.views()[0];
    assert_eq!(view.comment, Slot::Loaded(None));
    // No comments on the issue at all, which is also a definitive answer.
    assert_eq!(view.latest_comment, Slot::Loaded(None));
}

#[tokio::test]
async fn loaded_lists_render_as_api_threads() {
    let store = MemStore::new();
    let walt = store.add_user("walt");
    seed(&store, "widgets", &["flange breaks", "gear slips"], &[walt]).await;

    let mut session = store.begin().await.unwrap();
    let rows = status::notifications_for_user(
        &mut session,
        walt,
        &[NotificationStatus::Unread],
        0,
        0,
    )
    .await
    .unwrap();
    let list = NotificationList::new(rows)
        .load_attributes(&mut session)
        .await
        .unwrap();

    let formatter = ThreadFormatter::new("https://tracker.example.com").unwrap();
    let threads = formatter.threads(&list);
    assert_eq!(threads.len(), 2);

    // Most recently updated first: the second seeded issue leads.
    let newest = &threads[0];
    assert!(newest.unread);
    assert_eq!(newest.subject.title.as_deref(), Some("gear slips"));
    assert_eq!(
        newest.repository.as_ref().unwrap().full_name,
        "author-of-widgets/widgets"
    );
    assert_eq!(
        newest.url,
        format!(
            "https://tracker.example.com/api/v1/notifications/threads/{}",
            newest.id
        )
    );
    assert!(newest
        .subject
        .url
        .as_deref()
        .unwrap()
        .starts_with("https://tracker.example.com/api/v1/repos/author-of-widgets/widgets/issues/"));
}
