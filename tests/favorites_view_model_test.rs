use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cinelist_lib::modules::auth::{AuthSession, AuthUser};
use cinelist_lib::modules::catalog::{domain::Movie, infrastructure::TmdbClient};
use cinelist_lib::modules::favorites::{
    application::{FavoritesState, FavoritesViewModel},
    domain::{FavoriteEntry, FavoritesStore, FavoritesSubscription, SnapshotSink},
    infrastructure::InMemoryFavoritesStore,
};
use cinelist_lib::shared::{AppConfig, AppError, AppResult};
use cinelist_lib::AppServices;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every write in call order and hands the test each listener's sink
#[derive(Default)]
struct FakeStore {
    calls: Mutex<Vec<String>>,
    fail_writes: AtomicBool,
    fail_observe: AtomicBool,
    sinks: Mutex<HashMap<String, Vec<Arc<SnapshotSink>>>>,
}

impl FakeStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn latest_sink(&self, uid: &str) -> Option<Arc<SnapshotSink>> {
        self.sinks
            .lock()
            .unwrap()
            .get(uid)
            .and_then(|sinks| sinks.last().cloned())
    }

    /// Detach the newest sink; only succeeds when nothing else holds it
    fn take_sink(&self, uid: &str) -> Option<SnapshotSink> {
        self.sinks
            .lock()
            .unwrap()
            .get_mut(uid)
            .and_then(|sinks| sinks.pop())
            .and_then(|sink| Arc::try_unwrap(sink).ok())
    }

    async fn sink_for(&self, uid: &str) -> Arc<SnapshotSink> {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(sink) = self.latest_sink(uid) {
                    return sink;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listener started")
    }
}

#[async_trait]
impl FavoritesStore for FakeStore {
    async fn add(&self, _user: &AuthUser, movie: &Movie) -> AppResult<()> {
        self.calls.lock().unwrap().push(format!("add {}", movie.id));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreWriteError("permission denied".to_string()));
        }
        Ok(())
    }

    async fn remove(&self, _user: &AuthUser, movie_id: i64) -> AppResult<()> {
        self.calls.lock().unwrap().push(format!("remove {}", movie_id));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreWriteError("permission denied".to_string()));
        }
        Ok(())
    }

    async fn observe(&self, user: &AuthUser) -> AppResult<FavoritesSubscription> {
        if self.fail_observe.load(Ordering::SeqCst) {
            return Err(AppError::StoreSubscriptionError("offline".to_string()));
        }
        let (sink, subscription) = FavoritesSubscription::channel();
        self.sinks
            .lock()
            .unwrap()
            .entry(user.uid.clone())
            .or_default()
            .push(Arc::new(sink));
        Ok(subscription)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn alice() -> AuthUser {
    AuthUser::new("alice", "token-a")
}

fn bob() -> AuthUser {
    AuthUser::new("bob", "token-b")
}

fn entry(uid: &str, movie_id: i64, secs: i64) -> FavoriteEntry {
    FavoriteEntry::from_movie(
        uid,
        &Movie::new(movie_id, format!("Movie {}", movie_id)),
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
    )
}

fn ids(state: &FavoritesState) -> Vec<i64> {
    state.favorites.iter().map(|m| m.id).collect()
}

async fn settle<F: Fn(&FavoritesState) -> bool>(
    view_model: &FavoritesViewModel,
    predicate: F,
) -> FavoritesState {
    let mut changes = view_model.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let state = changes.borrow_and_update();
                if predicate(&state) {
                    return state.clone();
                }
            }
            changes.changed().await.expect("view model alive");
        }
    })
    .await
    .expect("state settled")
}

async fn wait_for_calls(store: &FakeStore, count: usize) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let calls = store.calls();
            if calls.len() >= count {
                return calls;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("writes dispatched")
}

async fn signed_in_with_fake() -> (Arc<FakeStore>, FavoritesViewModel, Arc<SnapshotSink>) {
    let store = Arc::new(FakeStore::default());
    let view_model = FavoritesViewModel::new(store.clone());
    view_model.reset_for_new_user(Some(alice()));
    let sink = store.sink_for("alice").await;
    assert!(sink.emit(Vec::new()).await);
    settle(&view_model, |s| !s.is_loading).await;
    (store, view_model, sink)
}

#[tokio::test]
async fn test_repeated_add_never_duplicates() {
    let (store, view_model, _sink) = signed_in_with_fake().await;

    view_model.add(Movie::new(10, "Heat"));
    view_model.add(Movie::new(10, "Heat"));

    assert_eq!(ids(&view_model.state()), vec![10]);
    assert_eq!(wait_for_calls(&store, 1).await, vec!["add 10"]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.calls(), vec!["add 10"]);
}

#[tokio::test]
async fn test_optimistic_add_then_snapshot_wins() {
    let (_store, view_model, sink) = signed_in_with_fake().await;

    view_model.add(Movie::new(10, "Heat"));
    // Visible before any await
    assert!(view_model.is_favorite(10));

    assert!(sink.emit(vec![entry("alice", 20, 0)]).await);
    let state = settle(&view_model, |s| !s.contains(10)).await;
    assert_eq!(ids(&state), vec![20]);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_add_then_remove_dispatches_in_order() {
    let (store, view_model, _sink) = signed_in_with_fake().await;

    view_model.add(Movie::new(10, "Heat"));
    view_model.remove(10);
    assert!(!view_model.is_favorite(10));

    assert_eq!(wait_for_calls(&store, 2).await, vec!["add 10", "remove 10"]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.calls().len(), 2);
    assert!(!view_model.is_favorite(10));
}

#[tokio::test]
async fn test_failed_add_is_rolled_back() {
    let (store, view_model, _sink) = signed_in_with_fake().await;
    store.fail_writes.store(true, Ordering::SeqCst);

    view_model.add(Movie::new(10, "Heat"));
    assert!(view_model.is_favorite(10));

    let state = settle(&view_model, |s| s.error.is_some()).await;
    assert!(!state.contains(10));
}

#[tokio::test]
async fn test_failed_remove_restores_movie_at_front() {
    let (store, view_model, sink) = signed_in_with_fake().await;
    assert!(
        sink.emit(vec![entry("alice", 2, 20), entry("alice", 1, 10)])
            .await
    );
    settle(&view_model, |s| s.favorites.len() == 2).await;

    store.fail_writes.store(true, Ordering::SeqCst);
    view_model.remove(1);
    assert_eq!(ids(&view_model.state()), vec![2]);

    let state = settle(&view_model, |s| s.error.is_some()).await;
    assert_eq!(ids(&state), vec![1, 2]);
}

#[tokio::test]
async fn test_listener_error_keeps_favorites() {
    let (store, view_model, sink) = signed_in_with_fake().await;
    assert!(sink.emit(vec![entry("alice", 1, 0)]).await);
    settle(&view_model, |s| s.contains(1)).await;
    drop(sink);

    let sink = store.take_sink("alice").expect("sole owner of the sink");
    sink.fail(AppError::StoreSubscriptionError("listen failed".to_string()))
        .await;

    let state = settle(&view_model, |s| s.error.is_some()).await;
    assert_eq!(ids(&state), vec![1]);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_recovered_listener_clears_error() {
    let (_store, view_model, sink) = signed_in_with_fake().await;
    assert!(sink.emit(vec![entry("alice", 1, 0)]).await);
    settle(&view_model, |s| s.contains(1)).await;

    assert!(
        sink.report(AppError::NetworkError("connection reset".to_string()))
            .await
    );
    let state = settle(&view_model, |s| s.error.is_some()).await;
    assert_eq!(ids(&state), vec![1]);

    assert!(sink.emit(vec![entry("alice", 2, 5), entry("alice", 1, 0)]).await);
    let state = settle(&view_model, |s| s.error.is_none()).await;
    assert_eq!(ids(&state), vec![2, 1]);
}

#[tokio::test]
async fn test_observe_failure_is_reported() {
    let store = Arc::new(FakeStore::default());
    store.fail_observe.store(true, Ordering::SeqCst);
    let view_model = FavoritesViewModel::new(store.clone());

    view_model.reset_for_new_user(Some(alice()));
    assert!(view_model.state().is_loading);

    let state = settle(&view_model, |s| !s.is_loading).await;
    assert!(state.error.is_some());
    assert!(state.favorites.is_empty());
}

#[tokio::test]
async fn test_signed_out_edits_change_nothing() {
    let store = Arc::new(FakeStore::default());
    let view_model = FavoritesViewModel::new(store.clone());
    view_model.reset_for_new_user(None);

    view_model.add(Movie::new(10, "Heat"));
    view_model.remove(10);

    let state = view_model.state();
    assert!(state.favorites.is_empty());
    assert!(!state.is_loading);
    assert!(state.error.is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_user_switch_drops_previous_user_emissions() {
    let (store, view_model, alice_sink) = signed_in_with_fake().await;
    assert!(alice_sink.emit(vec![entry("alice", 1, 0)]).await);
    settle(&view_model, |s| s.contains(1)).await;

    view_model.reset_for_new_user(Some(bob()));
    let state = view_model.state();
    assert!(state.favorites.is_empty());
    assert!(state.is_loading);
    assert_eq!(state.user_id.as_deref(), Some("bob"));

    // A late emission from Alice's listener must not land in Bob's state
    let _ = alice_sink.emit(vec![entry("alice", 2, 5)]).await;
    let bob_sink = store.sink_for("bob").await;
    assert!(bob_sink.emit(vec![entry("bob", 3, 0)]).await);

    let state = settle(&view_model, |s| !s.is_loading).await;
    assert_eq!(ids(&state), vec![3]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ids(&view_model.state()), vec![3]);
}

#[tokio::test]
async fn test_bound_session_follows_sign_in_and_out() {
    let store = Arc::new(InMemoryFavoritesStore::new());
    store.add(&alice(), &Movie::new(1, "Alien")).await.unwrap();
    store.add(&bob(), &Movie::new(2, "Aliens")).await.unwrap();

    let auth = AuthSession::new();
    let view_model = FavoritesViewModel::new(store.clone());
    let _binding = view_model.bind_session(&auth);
    assert_eq!(view_model.state().user_id, None);

    auth.sign_in(alice()).unwrap();
    let state = settle(&view_model, |s| {
        s.user_id.as_deref() == Some("alice") && !s.is_loading
    })
    .await;
    assert_eq!(ids(&state), vec![1]);

    auth.sign_in(bob()).unwrap();
    let state = settle(&view_model, |s| {
        s.user_id.as_deref() == Some("bob") && !s.is_loading
    })
    .await;
    assert_eq!(ids(&state), vec![2]);

    auth.sign_out();
    let state = settle(&view_model, |s| s.user_id.is_none()).await;
    assert!(state.favorites.is_empty());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_app_services_share_one_favorites_view_model() {
    let config = AppConfig::from_lookup(|key| match key {
        "TMDB_API_KEY" => Some("test-key".to_string()),
        _ => None,
    })
    .unwrap();
    let catalog = Arc::new(TmdbClient::new(&config.catalog));
    let store = Arc::new(InMemoryFavoritesStore::new());
    let services = AppServices::with_parts(config, catalog, store.clone(), AuthSession::new());

    services.auth.sign_in(alice()).unwrap();
    let favorites = services.favorites.clone();
    settle(&favorites, |s| s.user_id.is_some() && !s.is_loading).await;

    favorites.add(Movie::new(42, "Contact"));
    assert!(services.favorites.is_favorite(42));

    settle(&services.favorites, |s| s.contains(42) && !s.is_loading).await;
    tokio::time::timeout(Duration::from_secs(2), async {
        while store.snapshot("alice").is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}
