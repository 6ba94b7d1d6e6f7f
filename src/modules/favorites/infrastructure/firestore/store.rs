use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::models::{favorites_query, FirestoreDocument, RunQueryResponseItem, FAVORITES_COLLECTION};
use crate::modules::auth::AuthUser;
use crate::modules::catalog::domain::Movie;
use crate::modules::favorites::domain::{
    document_id, entities::sort_newest_first, FavoriteEntry, FavoritesStore,
    FavoritesSubscription, SnapshotSink,
};
use crate::shared::config::FirestoreConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::RateLimitClient;
use crate::shared::utils::LogContext;
use crate::{log_debug, log_warn};

/// Shortest accepted interval between two listener polls
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Favorites kept in a Firestore collection, one document per (user, movie).
///
/// The realtime listener re-runs the user's query on an interval and emits
/// only when the result differs from the previous emission. Transient poll
/// failures are emitted as errors and polling continues; auth, missing
/// collection and decode failures end the listener.
pub struct FirestoreFavoritesStore {
    http_client: Arc<RateLimitClient>,
    documents_url: String,
    poll_interval: Duration,
}

impl FirestoreFavoritesStore {
    pub fn new(config: &FirestoreConfig, timeout: Duration) -> Self {
        Self::with_client(
            Arc::new(RateLimitClient::for_firestore(timeout)),
            config.documents_url(),
            config.poll_interval(),
        )
    }

    /// Point the store at another documents root (emulator, tests)
    pub fn with_client(
        http_client: Arc<RateLimitClient>,
        documents_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http_client,
            documents_url: documents_url.into().trim_end_matches('/').to_string(),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn document_url(&self, user_id: &str, movie_id: i64) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            FAVORITES_COLLECTION,
            urlencoding::encode(&document_id(user_id, movie_id))
        )
    }

    pub fn query_url(&self) -> String {
        format!("{}:runQuery", self.documents_url)
    }
}

/// Run the user's favorites query once
async fn fetch_snapshot(
    http_client: &RateLimitClient,
    query_url: &str,
    user: &AuthUser,
) -> AppResult<Vec<FavoriteEntry>> {
    let items: Vec<RunQueryResponseItem> = http_client
        .send_json(
            Method::POST,
            query_url,
            Some(&favorites_query(&user.uid)),
            Some(&user.id_token),
        )
        .await?;

    let mut entries = Vec::with_capacity(items.len());
    for document in items.into_iter().filter_map(|item| item.document) {
        match document.to_entry() {
            Ok(entry) if entry.user_id == user.uid => entries.push(entry),
            Ok(entry) => log_warn!(
                "Ignoring favorite of user {} returned for {}",
                entry.user_id,
                user.uid
            ),
            Err(e) => log_warn!("Skipping malformed favorite document: {}", e),
        }
    }
    sort_newest_first(&mut entries);
    Ok(entries)
}

async fn run_listener(
    http_client: Arc<RateLimitClient>,
    query_url: String,
    user: AuthUser,
    poll_interval: Duration,
    sink: SnapshotSink,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<Vec<FavoriteEntry>> = None;

    loop {
        tokio::select! {
            _ = sink.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = sink.cancelled() => break,
            result = fetch_snapshot(&http_client, &query_url, &user) => result,
        };

        match result {
            Ok(snapshot) => {
                if last.as_ref() == Some(&snapshot) {
                    continue;
                }
                if !sink.emit(snapshot.clone()).await {
                    break;
                }
                last = Some(snapshot);
            }
            Err(e) if e.is_transient() => {
                log_warn!("Favorites poll for {} failed, retrying: {}", user.uid, e);
                // Re-emit the next good snapshot even if unchanged, so the error clears
                last = None;
                if !sink.report(e).await {
                    break;
                }
            }
            Err(e) => {
                log_warn!("Favorites listener for {} failed: {}", user.uid, e);
                sink.fail(AppError::StoreSubscriptionError(e.to_string()))
                    .await;
                return;
            }
        }
    }
    log_debug!("Favorites listener for {} stopped", user.uid);
}

#[async_trait]
impl FavoritesStore for FirestoreFavoritesStore {
    async fn add(&self, user: &AuthUser, movie: &Movie) -> AppResult<()> {
        LogContext::store_operation("add", &user.uid, Some(movie.id));
        let entry = FavoriteEntry::from_movie(&user.uid, movie, Utc::now());
        let body = serde_json::to_value(FirestoreDocument::from_entry(&entry))?;

        let _: Value = self
            .http_client
            .send_json(
                Method::PATCH,
                &self.document_url(&user.uid, movie.id),
                Some(&body),
                Some(&user.id_token),
            )
            .await
            .map_err(|e| AppError::StoreWriteError(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, user: &AuthUser, movie_id: i64) -> AppResult<()> {
        LogContext::store_operation("remove", &user.uid, Some(movie_id));
        let result: AppResult<Value> = self
            .http_client
            .send_json(
                Method::DELETE,
                &self.document_url(&user.uid, movie_id),
                None,
                Some(&user.id_token),
            )
            .await;

        match result {
            Ok(_) | Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(AppError::StoreWriteError(e.to_string())),
        }
    }

    async fn observe(&self, user: &AuthUser) -> AppResult<FavoritesSubscription> {
        LogContext::store_operation("observe", &user.uid, None);
        if user.id_token.is_empty() {
            return Err(AppError::AuthError(
                "Favorites listener needs an ID token".to_string(),
            ));
        }

        let (sink, subscription) = FavoritesSubscription::channel();
        tokio::spawn(run_listener(
            Arc::clone(&self.http_client),
            self.query_url(),
            user.clone(),
            self.poll_interval,
            sink,
        ));
        Ok(subscription)
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}
