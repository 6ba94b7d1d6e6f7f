use super::models::{TmdbGenre, TmdbMovie, TmdbMovieDetails, TmdbVideo};
use crate::modules::catalog::domain::entities::{Genre, Movie, MovieDetails, Video, VideoKind};

/// Converts TMDB payloads into catalog entities
#[derive(Debug, Clone, Default)]
pub struct TmdbMapper;

impl TmdbMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map_movie(&self, source: TmdbMovie) -> Movie {
        Movie {
            id: source.id,
            title: title_or_fallback(source.title, source.original_title),
            release_date: non_empty(source.release_date),
            poster_path: non_empty(source.poster_path),
            vote_average: source.vote_average.unwrap_or(0.0),
            overview: source.overview.unwrap_or_default(),
            genre_ids: source.genre_ids,
        }
    }

    pub fn map_movies(&self, sources: Vec<TmdbMovie>) -> Vec<Movie> {
        sources
            .into_iter()
            .map(|source| self.map_movie(source))
            .collect()
    }

    pub fn map_details(&self, source: TmdbMovieDetails) -> MovieDetails {
        let genres: Vec<Genre> = source
            .genres
            .unwrap_or_default()
            .into_iter()
            .map(|genre| self.map_genre(genre))
            .collect();

        let movie = Movie {
            id: source.id,
            title: title_or_fallback(source.title, source.original_title),
            release_date: non_empty(source.release_date),
            poster_path: non_empty(source.poster_path),
            vote_average: source.vote_average.unwrap_or(0.0),
            overview: source.overview.unwrap_or_default(),
            genre_ids: Some(genres.iter().map(|genre| genre.id).collect()),
        };

        MovieDetails {
            movie,
            backdrop_path: non_empty(source.backdrop_path),
            runtime: source.runtime,
            tagline: non_empty(source.tagline),
            genres,
            vote_count: source.vote_count.unwrap_or(0),
            status: non_empty(source.status),
            homepage: non_empty(source.homepage),
        }
    }

    pub fn map_genre(&self, source: TmdbGenre) -> Genre {
        Genre {
            id: source.id,
            name: source.name,
        }
    }

    pub fn map_video(&self, source: TmdbVideo) -> Video {
        Video {
            kind: VideoKind::from_tmdb(&source.r#type),
            key: source.key,
            name: source.name,
            site: source.site,
            official: source.official.unwrap_or(false),
            size: source.size.unwrap_or(0),
            published_at: non_empty(source.published_at),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn title_or_fallback(title: Option<String>, original_title: Option<String>) -> String {
    non_empty(title)
        .or_else(|| non_empty(original_title))
        .unwrap_or_else(|| "Untitled".to_string())
}
