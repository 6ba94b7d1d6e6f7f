pub mod entities;
pub mod repositories;
pub mod subscription;

// Re-exports for easy access
pub use entities::{document_id, FavoriteEntry};
pub use repositories::FavoritesStore;
pub use subscription::{FavoritesSubscription, SnapshotResult, SnapshotSink};
