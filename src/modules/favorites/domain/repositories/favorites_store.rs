use async_trait::async_trait;

use crate::modules::auth::AuthUser;
use crate::modules::catalog::domain::Movie;
use crate::modules::favorites::domain::subscription::FavoritesSubscription;
use crate::shared::errors::AppResult;

/// Remote document store holding one favorites document per (user, movie)
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Write the favorite document for `movie`. Failures are `StoreWriteError`.
    async fn add(&self, user: &AuthUser, movie: &Movie) -> AppResult<()>;

    /// Delete the favorite document; deleting an absent document succeeds
    async fn remove(&self, user: &AuthUser, movie_id: i64) -> AppResult<()>;

    /// Start a realtime listener over `user`'s favorites
    async fn observe(&self, user: &AuthUser) -> AppResult<FavoritesSubscription>;

    /// Label for logs
    fn name(&self) -> &'static str;
}
