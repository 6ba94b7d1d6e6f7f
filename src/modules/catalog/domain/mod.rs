pub mod entities;
pub mod repositories;

// Re-exports for easy access
pub use entities::{select_trailer, Genre, Movie, MovieDetails, Video, VideoKind};
pub use repositories::MovieCatalog;
