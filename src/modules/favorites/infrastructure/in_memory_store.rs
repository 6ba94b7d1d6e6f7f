use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::modules::auth::AuthUser;
use crate::modules::catalog::domain::Movie;
use crate::modules::favorites::domain::{
    entities::sort_newest_first, document_id, FavoriteEntry, FavoritesStore,
    FavoritesSubscription,
};
use crate::shared::errors::AppResult;
use crate::shared::utils::LogContext;

/// Process-local favorites store used when no Firestore project is configured
pub struct InMemoryFavoritesStore {
    documents: Arc<DashMap<String, FavoriteEntry>>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for InMemoryFavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFavoritesStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            documents: Arc::new(DashMap::new()),
            version: Arc::new(version),
        }
    }

    /// Current favorites of `user_id`, newest first
    pub fn snapshot(&self, user_id: &str) -> Vec<FavoriteEntry> {
        snapshot_for(&self.documents, user_id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn bump_version(&self) {
        self.version.send_modify(|version| *version += 1);
    }
}

fn snapshot_for(documents: &DashMap<String, FavoriteEntry>, user_id: &str) -> Vec<FavoriteEntry> {
    let mut entries: Vec<FavoriteEntry> = documents
        .iter()
        .filter(|entry| entry.value().user_id == user_id)
        .map(|entry| entry.value().clone())
        .collect();
    sort_newest_first(&mut entries);
    entries
}

#[async_trait]
impl FavoritesStore for InMemoryFavoritesStore {
    async fn add(&self, user: &AuthUser, movie: &Movie) -> AppResult<()> {
        LogContext::store_operation("add", &user.uid, Some(movie.id));
        let entry = FavoriteEntry::from_movie(&user.uid, movie, Utc::now());
        self.documents.insert(entry.document_id(), entry);
        self.bump_version();
        Ok(())
    }

    async fn remove(&self, user: &AuthUser, movie_id: i64) -> AppResult<()> {
        LogContext::store_operation("remove", &user.uid, Some(movie_id));
        if self
            .documents
            .remove(&document_id(&user.uid, movie_id))
            .is_some()
        {
            self.bump_version();
        }
        Ok(())
    }

    async fn observe(&self, user: &AuthUser) -> AppResult<FavoritesSubscription> {
        LogContext::store_operation("observe", &user.uid, None);
        let (sink, subscription) = FavoritesSubscription::channel();
        let documents = Arc::clone(&self.documents);
        let mut version = self.version.subscribe();
        let user_id = user.uid.clone();

        tokio::spawn(async move {
            let mut last: Option<Vec<FavoriteEntry>> = None;
            loop {
                version.borrow_and_update();
                let snapshot = snapshot_for(&documents, &user_id);
                if last.as_ref() != Some(&snapshot) {
                    if !sink.emit(snapshot.clone()).await {
                        break;
                    }
                    last = Some(snapshot);
                }

                tokio::select! {
                    _ = sink.cancelled() => break,
                    changed = version.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            log::debug!("In-memory favorites listener for {} stopped", user_id);
        });

        Ok(subscription)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
