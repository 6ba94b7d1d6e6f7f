pub mod adapters;

// Re-export commonly used types
pub use adapters::{image_url, CatalogEndpoint, TmdbClient};
