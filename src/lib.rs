pub mod modules;
pub mod shared;

use modules::{
    auth::AuthSession,
    catalog::{
        application::{GenresViewModel, MovieDetailsViewModel, PagedMoviesViewModel},
        domain::MovieCatalog,
        infrastructure::TmdbClient,
    },
    favorites::{
        application::FavoritesViewModel,
        domain::FavoritesStore,
        infrastructure::{FirestoreFavoritesStore, InMemoryFavoritesStore},
    },
};
use shared::{
    utils::{init_logger, TimedOperation},
    AppConfig, AppResult,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Composition root: one catalog client, one favorites store and the
/// app-wide view-models, wired to a single auth session.
pub struct AppServices {
    pub config: AppConfig,
    pub catalog: Arc<dyn MovieCatalog>,
    pub auth: AuthSession,
    pub favorites: FavoritesViewModel,
    pub genres: Arc<GenresViewModel>,
    session_binding: JoinHandle<()>,
}

impl AppServices {
    /// Build every service from `config`. Must be called inside a Tokio runtime.
    pub fn bootstrap(config: AppConfig) -> Self {
        let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbClient::new(&config.catalog));

        let store: Arc<dyn FavoritesStore> = match &config.firestore {
            Some(firestore) => {
                log::info!(
                    "Favorites backed by Firestore project {}",
                    firestore.project_id
                );
                Arc::new(FirestoreFavoritesStore::new(
                    firestore,
                    config.catalog.timeout(),
                ))
            }
            None => Arc::new(InMemoryFavoritesStore::new()),
        };

        Self::with_parts(config, catalog, store, AuthSession::new())
    }

    /// Wire pre-built parts together (alternate backends, tests)
    pub fn with_parts(
        config: AppConfig,
        catalog: Arc<dyn MovieCatalog>,
        store: Arc<dyn FavoritesStore>,
        auth: AuthSession,
    ) -> Self {
        let favorites = FavoritesViewModel::new(store);
        let session_binding = favorites.bind_session(&auth);
        let genres = Arc::new(GenresViewModel::new(
            Arc::clone(&catalog),
            config.catalog.language.clone(),
        ));

        Self {
            config,
            catalog,
            auth,
            favorites,
            genres,
            session_binding,
        }
    }

    pub fn language(&self) -> &str {
        &self.config.catalog.language
    }

    pub fn genre_movies(&self, genre_id: i64) -> PagedMoviesViewModel {
        PagedMoviesViewModel::for_genre(Arc::clone(&self.catalog), genre_id, self.language())
    }

    pub fn search_movies(&self, query: &str) -> PagedMoviesViewModel {
        PagedMoviesViewModel::for_search(Arc::clone(&self.catalog), query, self.language())
    }

    pub fn recommended_movies(&self, movie_id: i64) -> PagedMoviesViewModel {
        PagedMoviesViewModel::for_recommendations(
            Arc::clone(&self.catalog),
            movie_id,
            self.language(),
        )
    }

    pub fn movie_details(&self) -> MovieDetailsViewModel {
        MovieDetailsViewModel::new(Arc::clone(&self.catalog), self.language())
    }
}

impl Drop for AppServices {
    fn drop(&mut self) {
        self.session_binding.abort();
    }
}

/// Headless run: load genres and the first page of the first genre
pub async fn run() -> AppResult<()> {
    init_logger();
    let config = AppConfig::from_env()?;
    let services = AppServices::bootstrap(config);

    let timer = TimedOperation::new("genres");
    services.genres.load().await;
    timer.finish();
    let genres = services.genres.state();
    if let Some(error) = genres.error {
        crate::log_error!("Could not load genres: {}", error);
        return Ok(());
    }
    log::info!("Loaded {} genres", genres.genres.len());

    if let Some(genre) = genres.genres.first() {
        let movies = services.genre_movies(genre.id);
        movies.load_first().await;
        let state = movies.state();
        match state.error {
            Some(error) => crate::log_error!("Could not load {} movies: {}", genre.name, error),
            None => {
                log::info!("First page of {}:", genre.name);
                for movie in &state.movies {
                    log::info!(
                        "  {} ({}) {:.1}",
                        movie.title,
                        movie
                            .release_year()
                            .map(|year| year.to_string())
                            .unwrap_or_else(|| "n/a".to_string()),
                        movie.vote_average
                    );
                }
            }
        }
    }

    Ok(())
}
