use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::modules::catalog::domain::{Movie, MovieCatalog};
use crate::shared::application::FIRST_PAGE;
use crate::shared::errors::AppResult;
use crate::{log_debug, log_warn};

/// Where the pages of a movie list come from
#[async_trait]
pub trait MoviePageSource: Send + Sync {
    /// Raw results of one 1-based page
    async fn fetch_page(&self, page: u32) -> AppResult<Vec<Movie>>;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// Movies of one genre, most popular first
pub struct GenreMovies {
    catalog: Arc<dyn MovieCatalog>,
    genre_id: i64,
    language: String,
}

impl GenreMovies {
    pub fn new(catalog: Arc<dyn MovieCatalog>, genre_id: i64, language: impl Into<String>) -> Self {
        Self {
            catalog,
            genre_id,
            language: language.into(),
        }
    }
}

#[async_trait]
impl MoviePageSource for GenreMovies {
    async fn fetch_page(&self, page: u32) -> AppResult<Vec<Movie>> {
        let page = self
            .catalog
            .discover_by_genre(self.genre_id, page, &self.language)
            .await?;
        Ok(page.results)
    }

    fn describe(&self) -> String {
        format!("genre {}", self.genre_id)
    }
}

/// Title search results
pub struct SearchMovies {
    catalog: Arc<dyn MovieCatalog>,
    query: String,
    language: String,
}

impl SearchMovies {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        query: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            query: query.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl MoviePageSource for SearchMovies {
    async fn fetch_page(&self, page: u32) -> AppResult<Vec<Movie>> {
        let page = self.catalog.search(&self.query, page, &self.language).await?;
        Ok(page.results)
    }

    fn describe(&self) -> String {
        format!("search '{}'", self.query)
    }
}

/// Recommendations for one movie
pub struct RecommendedMovies {
    catalog: Arc<dyn MovieCatalog>,
    movie_id: i64,
    language: String,
}

impl RecommendedMovies {
    pub fn new(catalog: Arc<dyn MovieCatalog>, movie_id: i64, language: impl Into<String>) -> Self {
        Self {
            catalog,
            movie_id,
            language: language.into(),
        }
    }
}

#[async_trait]
impl MoviePageSource for RecommendedMovies {
    async fn fetch_page(&self, page: u32) -> AppResult<Vec<Movie>> {
        let page = self
            .catalog
            .recommendations(self.movie_id, page, &self.language)
            .await?;
        Ok(page.results)
    }

    fn describe(&self) -> String {
        format!("recommendations for {}", self.movie_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagedMoviesState {
    pub movies: Vec<Movie>,
    /// Next page to request
    pub cursor: u32,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_loading_more: bool,
    pub error: Option<String>,
    /// Bumped by load_first/refresh; a load_more started under an older value is dropped
    generation: u64,
}

impl Default for PagedMoviesState {
    fn default() -> Self {
        Self {
            movies: Vec::new(),
            cursor: FIRST_PAGE,
            is_loading: false,
            is_refreshing: false,
            is_loading_more: false,
            error: None,
            generation: 0,
        }
    }
}

impl PagedMoviesState {
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_refreshing || self.is_loading_more
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstPageMode {
    Load,
    Refresh,
}

/// Paged movie list with duplicate filtering and a re-entrancy guard
pub struct PagedMoviesViewModel {
    source: Arc<dyn MoviePageSource>,
    state: watch::Sender<PagedMoviesState>,
}

impl PagedMoviesViewModel {
    pub fn new(source: Arc<dyn MoviePageSource>) -> Self {
        let (state, _) = watch::channel(PagedMoviesState::default());
        Self { source, state }
    }

    pub fn for_genre(catalog: Arc<dyn MovieCatalog>, genre_id: i64, language: &str) -> Self {
        Self::new(Arc::new(GenreMovies::new(catalog, genre_id, language)))
    }

    pub fn for_search(catalog: Arc<dyn MovieCatalog>, query: &str, language: &str) -> Self {
        Self::new(Arc::new(SearchMovies::new(catalog, query, language)))
    }

    pub fn for_recommendations(
        catalog: Arc<dyn MovieCatalog>,
        movie_id: i64,
        language: &str,
    ) -> Self {
        Self::new(Arc::new(RecommendedMovies::new(catalog, movie_id, language)))
    }

    pub fn state(&self) -> PagedMoviesState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PagedMoviesState> {
        self.state.subscribe()
    }

    /// Fetch page 1 and replace the list
    pub async fn load_first(&self) {
        self.fetch_first_page(FirstPageMode::Load).await;
    }

    /// Start over from page 1, clearing the list first
    pub async fn refresh(&self) {
        self.fetch_first_page(FirstPageMode::Refresh).await;
    }

    /// Append the page at the cursor. No-op while any fetch is outstanding.
    pub async fn load_more(&self) {
        let mut request = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            state.is_loading_more = true;
            state.error = None;
            request = Some((state.cursor, state.generation));
            true
        });

        let Some((page, generation)) = request else {
            log_debug!(
                "Skipping load_more for {}: a fetch is already running",
                self.source.describe()
            );
            return;
        };

        let result = self.source.fetch_page(page).await;

        self.state.send_if_modified(|state| {
            if state.generation != generation {
                log_debug!(
                    "Dropping stale page {} for {}",
                    page,
                    self.source.describe()
                );
                return false;
            }
            state.is_loading_more = false;
            match result {
                Ok(movies) => {
                    let raw_len = movies.len();
                    let mut known: HashSet<i64> = state.movies.iter().map(|m| m.id).collect();
                    state
                        .movies
                        .extend(movies.into_iter().filter(|movie| known.insert(movie.id)));
                    if raw_len > 0 {
                        state.cursor = page + 1;
                    }
                }
                Err(e) => {
                    log_warn!(
                        "Failed to load page {} for {}: {}",
                        page,
                        self.source.describe(),
                        e
                    );
                    state.error = Some(e.user_message());
                }
            }
            true
        });
    }

    async fn fetch_first_page(&self, mode: FirstPageMode) {
        let mut request = None;
        self.state.send_if_modified(|state| {
            if state.is_loading || state.is_refreshing {
                return false;
            }
            // Supersedes any load_more still in flight
            state.generation += 1;
            state.is_loading_more = false;
            state.error = None;
            match mode {
                // Cursor moves only once page 1 arrives; a failure keeps the list and its cursor
                FirstPageMode::Load => state.is_loading = true,
                FirstPageMode::Refresh => {
                    state.is_refreshing = true;
                    state.movies.clear();
                    state.cursor = FIRST_PAGE;
                }
            }
            request = Some(state.generation);
            true
        });

        let Some(generation) = request else {
            log_debug!(
                "Skipping {:?} for {}: first page already loading",
                mode,
                self.source.describe()
            );
            return;
        };

        let result = self.source.fetch_page(FIRST_PAGE).await;

        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            match mode {
                FirstPageMode::Load => state.is_loading = false,
                FirstPageMode::Refresh => state.is_refreshing = false,
            }
            match result {
                Ok(movies) => {
                    let advance = !movies.is_empty();
                    let mut known = HashSet::new();
                    state.movies = movies
                        .into_iter()
                        .filter(|movie| known.insert(movie.id))
                        .collect();
                    state.cursor = if advance { FIRST_PAGE + 1 } else { FIRST_PAGE };
                }
                Err(e) => {
                    log_warn!(
                        "Failed to load first page for {}: {}",
                        self.source.describe(),
                        e
                    );
                    state.error = Some(e.user_message());
                }
            }
            true
        });
    }
}
