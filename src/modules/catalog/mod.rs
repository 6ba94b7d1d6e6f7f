pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{GenresViewModel, MovieDetailsViewModel, PagedMoviesViewModel};
pub use domain::{Genre, Movie, MovieCatalog, MovieDetails, Video};
pub use infrastructure::TmdbClient;
