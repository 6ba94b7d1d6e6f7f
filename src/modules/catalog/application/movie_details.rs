use std::sync::Arc;
use tokio::sync::watch;

use crate::modules::catalog::domain::{select_trailer, MovieCatalog, MovieDetails, Video};
use crate::shared::utils::TimedOperation;
use crate::{log_debug, log_warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieDetailsState {
    pub movie_id: Option<i64>,
    pub details: Option<MovieDetails>,
    pub trailer: Option<Video>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Details screen: movie record plus the trailer to play
pub struct MovieDetailsViewModel {
    catalog: Arc<dyn MovieCatalog>,
    language: String,
    state: watch::Sender<MovieDetailsState>,
}

impl MovieDetailsViewModel {
    pub fn new(catalog: Arc<dyn MovieCatalog>, language: impl Into<String>) -> Self {
        let (state, _) = watch::channel(MovieDetailsState::default());
        Self {
            catalog,
            language: language.into(),
            state,
        }
    }

    pub fn state(&self) -> MovieDetailsState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MovieDetailsState> {
        self.state.subscribe()
    }

    /// Load details and videos together. A missing trailer is not an error.
    pub async fn load(&self, movie_id: i64) {
        self.state.send_modify(|state| {
            *state = MovieDetailsState {
                movie_id: Some(movie_id),
                is_loading: true,
                ..MovieDetailsState::default()
            };
        });

        let timer = TimedOperation::new(&format!("movie_details {}", movie_id));
        let (details, videos) = tokio::join!(
            self.catalog.movie_details(movie_id, &self.language),
            self.catalog.videos(movie_id, &self.language)
        );
        timer.finish();

        let trailer = match videos {
            Ok(videos) => select_trailer(&videos).cloned(),
            Err(e) => {
                log_warn!("Videos unavailable for movie {}: {}", movie_id, e);
                None
            }
        };

        self.state.send_if_modified(|state| {
            // A later load() for another movie owns the state now
            if state.movie_id != Some(movie_id) {
                log_debug!("Dropping details for movie {}", movie_id);
                return false;
            }
            state.is_loading = false;
            match details {
                Ok(details) => {
                    state.details = Some(details);
                    state.trailer = trailer;
                }
                Err(e) => {
                    log_warn!("Failed to load movie {}: {}", movie_id, e);
                    state.error = Some(e.user_message());
                }
            }
            true
        });
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.state
            .borrow()
            .trailer
            .as_ref()
            .and_then(Video::youtube_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::domain::repositories::MockMovieCatalog;
    use crate::modules::catalog::domain::{Movie, VideoKind};
    use crate::shared::errors::AppError;

    fn details(id: i64) -> MovieDetails {
        MovieDetails {
            movie: Movie::new(id, "Alien"),
            backdrop_path: None,
            runtime: Some(117),
            tagline: Some("In space no one can hear you scream.".to_string()),
            genres: vec![],
            vote_count: 100,
            status: Some("Released".to_string()),
            homepage: None,
        }
    }

    fn trailer(key: &str, kind: VideoKind) -> Video {
        Video {
            key: key.to_string(),
            name: key.to_string(),
            site: "YouTube".to_string(),
            kind,
            official: true,
            size: 1080,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_load_picks_trailer() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movie_details()
            .returning(|id, _| Ok(details(id)));
        catalog.expect_videos().returning(|_, _| {
            Ok(vec![
                trailer("teaser", VideoKind::Teaser),
                trailer("trailer", VideoKind::Trailer),
            ])
        });

        let view_model = MovieDetailsViewModel::new(Arc::new(catalog), "en-US");
        view_model.load(348).await;

        let state = view_model.state();
        assert!(!state.is_loading);
        assert_eq!(state.details.unwrap().movie.id, 348);
        assert_eq!(state.trailer.unwrap().key, "trailer");
        assert_eq!(
            view_model.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=trailer")
        );
    }

    #[tokio::test]
    async fn test_video_failure_is_not_fatal() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movie_details()
            .returning(|id, _| Ok(details(id)));
        catalog
            .expect_videos()
            .returning(|_, _| Err(AppError::NetworkError("timeout".to_string())));

        let view_model = MovieDetailsViewModel::new(Arc::new(catalog), "en-US");
        view_model.load(348).await;

        let state = view_model.state();
        assert!(state.details.is_some());
        assert!(state.trailer.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_details_failure_sets_error() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_movie_details()
            .returning(|_, _| Err(AppError::NotFound("movie".to_string())));
        catalog.expect_videos().returning(|_, _| Ok(vec![]));

        let view_model = MovieDetailsViewModel::new(Arc::new(catalog), "en-US");
        view_model.load(1).await;

        let state = view_model.state();
        assert!(state.details.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some("The requested item could not be found.")
        );
    }
}
