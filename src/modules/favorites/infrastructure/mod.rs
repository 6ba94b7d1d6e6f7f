pub mod firestore;
pub mod in_memory_store;

pub use firestore::FirestoreFavoritesStore;
pub use in_memory_store::InMemoryFavoritesStore;
