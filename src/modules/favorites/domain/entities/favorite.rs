use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::catalog::domain::Movie;

/// One movie in a user's favorites, with enough display data to render it
/// without another catalog call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub user_id: String,
    pub movie_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f32,
    pub overview: String,
    pub release_date: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn from_movie(user_id: &str, movie: &Movie, added_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
            overview: movie.overview.clone(),
            release_date: movie.release_date.clone(),
            added_at,
        }
    }

    /// Store key; one document per (user, movie)
    pub fn document_id(&self) -> String {
        document_id(&self.user_id, self.movie_id)
    }

    pub fn to_movie(&self) -> Movie {
        Movie {
            id: self.movie_id,
            title: self.title.clone(),
            release_date: self.release_date.clone(),
            poster_path: self.poster_path.clone(),
            vote_average: self.vote_average,
            overview: self.overview.clone(),
            genre_ids: None,
        }
    }
}

pub fn document_id(user_id: &str, movie_id: i64) -> String {
    format!("{}_{}", user_id, movie_id)
}

/// Newest first, ties broken by movie id so snapshots compare stably
pub fn sort_newest_first(entries: &mut [FavoriteEntry]) {
    entries.sort_by(|a, b| {
        b.added_at
            .cmp(&a.added_at)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
}
