use async_trait::async_trait;

use crate::modules::catalog::domain::entities::{Genre, Movie, MovieDetails, Video};
use crate::shared::{application::Page, errors::AppResult};

/// Read access to the remote movie catalog
///
/// Every call is independent: no retry and no caching happen behind it.
/// `language` is an ISO 639-1 code with optional region ("en-US").
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Genre list with names localized to `language`
    async fn genres(&self, language: &str) -> AppResult<Vec<Genre>>;

    /// Movies tagged with `genre_id`, 1-based `page`
    async fn discover_by_genre(
        &self,
        genre_id: i64,
        page: u32,
        language: &str,
    ) -> AppResult<Page<Movie>>;

    /// Title search, 1-based `page`
    async fn search(&self, query: &str, page: u32, language: &str) -> AppResult<Page<Movie>>;

    async fn movie_details(&self, movie_id: i64, language: &str) -> AppResult<MovieDetails>;

    async fn videos(&self, movie_id: i64, language: &str) -> AppResult<Vec<Video>>;

    async fn recommendations(
        &self,
        movie_id: i64,
        page: u32,
        language: &str,
    ) -> AppResult<Page<Movie>>;
}
