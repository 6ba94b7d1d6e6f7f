// Shared kernel used by the catalog, favorites and auth modules

pub mod application; // Shared application layer patterns
pub mod config; // Environment driven configuration
pub mod errors; // Shared error types
pub mod infrastructure; // Shared infrastructure (HTTP client)
pub mod utils; // Logging and validation

// Re-exports for convenience
pub use config::{AppConfig, CatalogConfig, FirestoreConfig};
pub use errors::{AppError, AppResult};
