use crate::{
    modules::catalog::domain::{
        entities::{Genre, Movie, MovieDetails, Video},
        MovieCatalog,
    },
    shared::{
        application::{validate_page, Page},
        config::CatalogConfig,
        errors::AppResult,
        infrastructure::RateLimitClient,
        utils::Validator,
    },
};
use async_trait::async_trait;

use super::endpoint::CatalogEndpoint;
use super::mapper::TmdbMapper;
use super::models::*;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB (The Movie Database) client over the v3 REST API
pub struct TmdbClient {
    http_client: RateLimitClient,
    base_url: String,
    api_key: String,
    mapper: TmdbMapper,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_client(
            RateLimitClient::for_tmdb(config.requests_per_second, config.timeout()),
            config,
        )
    }

    /// Create client with custom HTTP client (for testing)
    pub fn with_client(http_client: RateLimitClient, config: &CatalogConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            mapper: TmdbMapper::new(),
        }
    }

    /// Build the full request URL: base, path, api key, language, endpoint parameters
    pub fn build_url(&self, endpoint: &CatalogEndpoint, language: &str) -> String {
        let mut url = format!(
            "{}{}?api_key={}&language={}",
            self.base_url,
            endpoint.path(),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(language)
        );
        for (key, value) in endpoint.query_params() {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(&value)));
        }
        url
    }

    /// Issue one request against `endpoint` and decode the body as `T`
    pub async fn request<T>(&self, endpoint: CatalogEndpoint, language: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Validator::validate_language(language)?;
        if let Some(page) = endpoint.page() {
            validate_page(page)?;
        }

        let url = self.build_url(&endpoint, language);
        self.http_client.get(&url).await
    }

    /// Build full image URL from file path
    pub fn build_image_url(&self, file_path: &str, size: &str) -> String {
        image_url(file_path, size)
    }

    async fn movie_page(&self, endpoint: CatalogEndpoint, language: &str) -> AppResult<Page<Movie>> {
        let response: TmdbMoviePage = self.request(endpoint, language).await?;
        Ok(response.map(|movie| self.mapper.map_movie(movie)))
    }
}

/// Full image URL for a poster/backdrop path ("w500", "original", ...)
pub fn image_url(file_path: &str, size: &str) -> String {
    format!("{}/{}{}", IMAGE_BASE_URL, size, file_path)
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn genres(&self, language: &str) -> AppResult<Vec<Genre>> {
        log::info!("TMDB: Getting movie genres ({})", language);

        let response: TmdbGenreList = self.request(CatalogEndpoint::Genres, language).await?;
        let genres: Vec<Genre> = response
            .genres
            .into_iter()
            .map(|genre| self.mapper.map_genre(genre))
            .collect();

        log::info!("TMDB: Found {} genres", genres.len());
        Ok(genres)
    }

    async fn discover_by_genre(
        &self,
        genre_id: i64,
        page: u32,
        language: &str,
    ) -> AppResult<Page<Movie>> {
        log::info!("TMDB: Discovering genre {} (page {})", genre_id, page);

        let movies = self
            .movie_page(CatalogEndpoint::DiscoverByGenre { genre_id, page }, language)
            .await?;

        log::info!(
            "TMDB: Genre {} page {} returned {} movies",
            genre_id,
            page,
            movies.results.len()
        );
        Ok(movies)
    }

    async fn search(&self, query: &str, page: u32, language: &str) -> AppResult<Page<Movie>> {
        Validator::validate_search_query(query)?;
        log::info!("TMDB: Searching for '{}' (page {})", query, page);

        let movies = self
            .movie_page(
                CatalogEndpoint::Search {
                    query: query.trim().to_string(),
                    page,
                },
                language,
            )
            .await?;

        log::info!(
            "TMDB: Found {} results for '{}' (page {}/{})",
            movies.results.len(),
            query,
            movies.page,
            movies.total_pages
        );
        Ok(movies)
    }

    async fn movie_details(&self, movie_id: i64, language: &str) -> AppResult<MovieDetails> {
        Validator::validate_movie_id(movie_id)?;
        log::info!("TMDB: Getting movie details for ID '{}'", movie_id);

        let response: TmdbMovieDetails = self
            .request(CatalogEndpoint::MovieDetail { movie_id }, language)
            .await?;

        Ok(self.mapper.map_details(response))
    }

    async fn videos(&self, movie_id: i64, language: &str) -> AppResult<Vec<Video>> {
        Validator::validate_movie_id(movie_id)?;
        log::info!("TMDB: Getting videos for movie ID '{}'", movie_id);

        let response: TmdbVideosResponse = self
            .request(CatalogEndpoint::Videos { movie_id }, language)
            .await?;

        let videos: Vec<Video> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|video| self.mapper.map_video(video))
            .collect();

        log::info!(
            "TMDB: Found {} videos for movie ID '{}'",
            videos.len(),
            movie_id
        );
        Ok(videos)
    }

    async fn recommendations(
        &self,
        movie_id: i64,
        page: u32,
        language: &str,
    ) -> AppResult<Page<Movie>> {
        Validator::validate_movie_id(movie_id)?;
        log::info!(
            "TMDB: Getting recommendations for movie ID '{}' (page {})",
            movie_id,
            page
        );

        self.movie_page(CatalogEndpoint::Recommendations { movie_id, page }, language)
            .await
    }
}
