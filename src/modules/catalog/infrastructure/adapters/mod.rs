pub mod tmdb;

pub use tmdb::{image_url, CatalogEndpoint, TmdbClient};
