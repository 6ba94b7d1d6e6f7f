use std::sync::Arc;
use tokio::sync::watch;

use crate::modules::catalog::domain::{Genre, MovieCatalog};
use crate::{log_info, log_warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenresState {
    pub genres: Vec<Genre>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Genre list for the configured language, held for the session only
pub struct GenresViewModel {
    catalog: Arc<dyn MovieCatalog>,
    language: String,
    state: watch::Sender<GenresState>,
}

impl GenresViewModel {
    pub fn new(catalog: Arc<dyn MovieCatalog>, language: impl Into<String>) -> Self {
        let (state, _) = watch::channel(GenresState::default());
        Self {
            catalog,
            language: language.into(),
            state,
        }
    }

    pub fn state(&self) -> GenresState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenresState> {
        self.state.subscribe()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub async fn load(&self) {
        let started = self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            state.error = None;
            true
        });
        if !started {
            return;
        }

        let result = self.catalog.genres(&self.language).await;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match result {
                Ok(genres) => {
                    log_info!("Loaded {} genres ({})", genres.len(), self.language);
                    state.genres = genres;
                }
                Err(e) => {
                    log_warn!("Failed to load genres: {}", e);
                    state.error = Some(e.user_message());
                }
            }
        });
    }

    pub fn genre_name(&self, genre_id: i64) -> Option<String> {
        self.state
            .borrow()
            .genres
            .iter()
            .find(|genre| genre.id == genre_id)
            .map(|genre| genre.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::domain::repositories::MockMovieCatalog;
    use crate::shared::errors::AppError;

    #[tokio::test]
    async fn test_load_genres_for_language() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_genres()
            .withf(|language| language == "fr-FR")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    Genre {
                        id: 28,
                        name: "Action".to_string(),
                    },
                    Genre {
                        id: 35,
                        name: "Comédie".to_string(),
                    },
                ])
            });

        let view_model = GenresViewModel::new(Arc::new(catalog), "fr-FR");
        view_model.load().await;

        let state = view_model.state();
        assert_eq!(state.genres.len(), 2);
        assert!(!state.is_loading);
        assert_eq!(view_model.genre_name(35).as_deref(), Some("Comédie"));
        assert_eq!(view_model.genre_name(1), None);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_genres() {
        let mut catalog = MockMovieCatalog::new();
        let mut calls = 0;
        catalog.expect_genres().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![Genre {
                    id: 18,
                    name: "Drama".to_string(),
                }])
            } else {
                Err(AppError::NetworkError("offline".to_string()))
            }
        });

        let view_model = GenresViewModel::new(Arc::new(catalog), "en-US");
        view_model.load().await;
        view_model.load().await;

        let state = view_model.state();
        assert_eq!(state.genres.len(), 1);
        assert!(state.error.is_some());
    }
}
