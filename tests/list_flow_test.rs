mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{client, contact_page, no_retry, signed_in_session};
use mailboard::cache::{CacheOptions, CacheRead};
use mailboard::list::{ListController, ListView, ViewState};
use mailboard::model::Platform;
use mailboard::query::{CampaignFilters, ContactFilters, QueryDescriptor};
use mailboard::remote::Method;
use mailboard::remote::mock::MockTransport;
use mailboard::repository::{CampaignRepository, ContactRepository};
use mailboard::session::{Route, SessionEvent};

async fn wait_for_requests(mock: &MockTransport, count: usize) {
    for _ in 0..1000 {
        if mock.request_count() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "expected {count} requests, saw {}",
        mock.request_count()
    );
}

fn ids<R: mailboard::model::Record>(state: &ViewState<R>) -> Vec<String> {
    match state {
        ViewState::Ready(page) | ViewState::Revalidating(page) => {
            page.items.iter().map(|r| r.id().to_string()).collect()
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Filter changes
// ============================================================================

#[tokio::test]
async fn test_filter_change_resets_page_and_keeps_search() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .repeat()
        .respond(200, contact_page(&["c1"], 1, 1));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());

    let query = QueryDescriptor::<ContactFilters>::new(10)
        .unwrap()
        .with_page(2)
        .unwrap()
        .with_search(Some("acme"));
    let view = ListView::with_controller(
        repo.cache().pages().clone(),
        ListController::with_query(query),
        Duration::ZERO,
    );
    view.start().await.unwrap();

    view.set_filter("source", "referral")
        .unwrap()
        .expect("filter changed")
        .await
        .unwrap();

    let query = view.query();
    assert_eq!(query.page(), 1);
    assert_eq!(query.search(), Some("acme"));

    let requests = mock.requests_to(Method::Get, "/contacts");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query_param("page"), Some("2"));
    let last = &requests[1];
    assert_eq!(last.query_param("page"), Some("1"));
    assert_eq!(last.query_param("search"), Some("acme"));
    assert_eq!(last.query_param("source"), Some("referral"));
}

#[tokio::test]
async fn test_platform_filter_on_campaigns_resets_to_first_page() {
    let repo = CampaignRepository::demo(CacheOptions::default());
    let query = QueryDescriptor::<CampaignFilters>::new(10)
        .unwrap()
        .with_page(2)
        .unwrap()
        .with_search(Some("campaign"));
    let view = ListView::with_controller(
        repo.cache().pages().clone(),
        ListController::with_query(query),
        Duration::ZERO,
    );
    view.start().await.unwrap();

    view.set_filter("platform", "tiktok")
        .unwrap()
        .expect("filter changed")
        .await
        .unwrap();

    let query = view.query();
    assert_eq!(query.page(), 1);
    assert_eq!(query.search(), Some("campaign"));
    assert_eq!(query.filters().platform, Some(Platform::TikTok));
    match view.settled().await {
        ViewState::Ready(page) => {
            assert!(!page.items.is_empty());
            assert!(page.items.iter().all(|c| c.platform == Platform::TikTok));
        }
        other => panic!("unexpected state {other:?}"),
    }
}

// ============================================================================
// Ordering and authentication
// ============================================================================

#[tokio::test]
async fn test_late_page_response_never_replaces_newer_page() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .with_query("page", "1")
        .respond(200, contact_page(&["p1"], 1, 30));
    let release_page_2 = mock
        .on(Method::Get, "/contacts")
        .with_query("page", "2")
        .respond_gated(200, contact_page(&["p2"], 2, 30));
    mock.on(Method::Get, "/contacts")
        .with_query("page", "3")
        .respond(200, contact_page(&["p3"], 3, 30));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());

    let view = repo.cache().view(10, Duration::ZERO).unwrap();
    view.start().await.unwrap();
    assert_eq!(ids(&view.state()), vec!["p1"]);

    let to_page_2 = view.next_page().expect("page 2 exists");
    let to_page_3 = view.go_to_page(3).unwrap().expect("page 3 differs");
    to_page_3.await.unwrap();
    assert_eq!(ids(&view.state()), vec!["p3"]);

    release_page_2.send(()).unwrap();
    to_page_2.await.unwrap();

    assert_eq!(view.query().page(), 3);
    assert_eq!(ids(&view.state()), vec!["p3"]);
    // The late page is still cached under its own descriptor.
    let page_2 = QueryDescriptor::<ContactFilters>::new(10)
        .unwrap()
        .with_page(2)
        .unwrap();
    assert!(repo.cache().pages().peek(&page_2).is_some());
}

#[tokio::test]
async fn test_unauthorized_response_signs_out_after_view_is_gone() {
    let mock = Arc::new(MockTransport::new());
    let release = mock
        .on(Method::Get, "/contacts")
        .respond_gated(401, json!({ "message": "token expired" }));
    let session = signed_in_session();
    let mut events = session.subscribe();
    let repo = ContactRepository::new(client(&mock, session.clone()), no_retry());

    let view = repo.cache().view(10, Duration::ZERO).unwrap();
    let _pending = view.start();
    wait_for_requests(&mock, 1).await;
    drop(view);

    release.send(()).unwrap();
    tokio::time::timeout(
        Duration::from_secs(5),
        events.wait_for(|s| s.route == Route::SignIn),
    )
    .await
    .expect("session was not invalidated")
    .unwrap();

    assert!(!session.is_authenticated());
    assert!(session.bearer().is_none());
    assert_eq!(session.snapshot().last_event, SessionEvent::Invalidated);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_deleted_contact_is_not_resurrected() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .respond(200, contact_page(&["c1", "c2", "c3"], 1, 3));
    let release_refetch = mock
        .on(Method::Get, "/contacts")
        .respond_gated(200, contact_page(&["c1", "c2", "c3"], 1, 3));
    mock.on(Method::Delete, "/contacts/c2").respond(204, json!(null));
    mock.on(Method::Get, "/contacts")
        .respond(200, contact_page(&["c1", "c3"], 1, 2));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());
    let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();

    let view = repo.cache().view(10, Duration::ZERO).unwrap();
    view.start().await.unwrap();
    assert_eq!(ids(&view.state()), vec!["c1", "c2", "c3"]);

    // A background refetch is in flight when the delete lands.
    repo.cache().invalidate_lists();
    assert!(matches!(
        repo.cache().pages().read(&query),
        CacheRead::Stale { .. }
    ));
    wait_for_requests(&mock, 2).await;

    repo.delete("c2").await.unwrap();
    assert!(view.remove_record("c2"));
    assert_eq!(ids(&view.state()), vec!["c1", "c3"]);
    assert_eq!(mock.requests_to(Method::Get, "/contacts").len(), 2);

    release_refetch.send(()).unwrap();
    let page = repo.cache().list(&query).await.unwrap();
    assert!(!page.contains("c2"));
    assert_eq!(page.pagination.total, 2);
    assert!(!repo.cache().pages().peek(&query).unwrap().contains("c2"));
    assert_eq!(mock.requests_to(Method::Get, "/contacts").len(), 3);
}

#[tokio::test]
async fn test_view_refresh_in_flight_does_not_bring_back_deleted_contact() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .respond(200, contact_page(&["c1", "c2", "c3"], 1, 3));
    let release_refresh = mock
        .on(Method::Get, "/contacts")
        .respond_gated(200, contact_page(&["c1", "c2", "c3"], 1, 3));
    mock.on(Method::Delete, "/contacts/c2").respond(204, json!(null));
    mock.on(Method::Get, "/contacts")
        .respond(200, contact_page(&["c1", "c3"], 1, 2));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());

    let view = repo.cache().view(10, Duration::ZERO).unwrap();
    view.start().await.unwrap();
    assert_eq!(ids(&view.state()), vec!["c1", "c2", "c3"]);

    let refreshing = view.refresh();
    wait_for_requests(&mock, 2).await;

    repo.delete("c2").await.unwrap();
    view.remove_record("c2");
    assert_eq!(ids(&view.state()), vec!["c1", "c3"]);

    release_refresh.send(()).unwrap();
    refreshing.await.unwrap();

    match view.settled().await {
        ViewState::Ready(page) => {
            assert!(!page.contains("c2"));
            assert_eq!(page.pagination.total, 2);
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(mock.requests_to(Method::Get, "/contacts").len(), 3);
}

// ============================================================================
// Cache keys
// ============================================================================

#[tokio::test]
async fn test_invalidating_twice_refetches_once() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .repeat()
        .respond(200, contact_page(&["c1"], 1, 1));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());
    let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();

    repo.cache().list(&query).await.unwrap();
    assert_eq!(repo.cache().invalidate_lists(), 1);
    repo.cache().invalidate_lists();

    repo.cache().list(&query).await.unwrap();
    repo.cache().list(&query).await.unwrap();
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_descriptors_are_independent_entries() {
    let mock = Arc::new(MockTransport::new());
    mock.on(Method::Get, "/contacts")
        .with_query("search", "acme")
        .repeat()
        .respond(200, contact_page(&["acme-1"], 1, 1));
    mock.on(Method::Get, "/contacts")
        .repeat()
        .respond(200, contact_page(&["any-1", "any-2"], 1, 2));
    let repo = ContactRepository::new(client(&mock, signed_in_session()), no_retry());

    let everything = QueryDescriptor::<ContactFilters>::new(10).unwrap();
    let acme = everything.clone().with_search(Some("acme"));
    let acme_page_2 = acme.clone().with_page(2).unwrap();

    assert!(repo.cache().list(&acme).await.unwrap().contains("acme-1"));
    assert!(repo.cache().list(&everything).await.unwrap().contains("any-1"));
    assert!(repo.cache().list(&acme).await.unwrap().contains("acme-1"));
    assert_eq!(mock.request_count(), 2);

    repo.cache().list(&acme_page_2).await.unwrap();
    assert_eq!(mock.request_count(), 3);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty_not_clamped() {
    let repo = CampaignRepository::demo(CacheOptions::default());
    let query = QueryDescriptor::<CampaignFilters>::new(10)
        .unwrap()
        .with_page(20)
        .unwrap();

    let page = repo.cache().list(&query).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.pagination.page, 20);
    assert_eq!(page.pagination.total, 150);
    assert_eq!(page.pagination.total_pages, 15);
}
