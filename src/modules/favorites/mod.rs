pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{FavoritesState, FavoritesViewModel};
pub use domain::{FavoriteEntry, FavoritesStore, FavoritesSubscription};
pub use infrastructure::{FirestoreFavoritesStore, InMemoryFavoritesStore};
