/// Endpoints of the TMDB v3 API used by the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEndpoint {
    Genres,
    DiscoverByGenre { genre_id: i64, page: u32 },
    Search { query: String, page: u32 },
    MovieDetail { movie_id: i64 },
    Videos { movie_id: i64 },
    Recommendations { movie_id: i64, page: u32 },
}

impl CatalogEndpoint {
    pub fn path(&self) -> String {
        match self {
            CatalogEndpoint::Genres => "/genre/movie/list".to_string(),
            CatalogEndpoint::DiscoverByGenre { .. } => "/discover/movie".to_string(),
            CatalogEndpoint::Search { .. } => "/search/movie".to_string(),
            CatalogEndpoint::MovieDetail { movie_id } => format!("/movie/{}", movie_id),
            CatalogEndpoint::Videos { movie_id } => format!("/movie/{}/videos", movie_id),
            CatalogEndpoint::Recommendations { movie_id, .. } => {
                format!("/movie/{}/recommendations", movie_id)
            }
        }
    }

    /// Endpoint specific query parameters (api key and language are added by the client)
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            CatalogEndpoint::Genres
            | CatalogEndpoint::MovieDetail { .. }
            | CatalogEndpoint::Videos { .. } => vec![],
            CatalogEndpoint::DiscoverByGenre { genre_id, page } => vec![
                ("with_genres", genre_id.to_string()),
                ("sort_by", "popularity.desc".to_string()),
                ("page", page.to_string()),
            ],
            CatalogEndpoint::Search { query, page } => vec![
                ("query", query.clone()),
                ("page", page.to_string()),
                ("include_adult", "false".to_string()),
            ],
            CatalogEndpoint::Recommendations { page, .. } => vec![("page", page.to_string())],
        }
    }

    pub fn page(&self) -> Option<u32> {
        match self {
            CatalogEndpoint::DiscoverByGenre { page, .. }
            | CatalogEndpoint::Search { page, .. }
            | CatalogEndpoint::Recommendations { page, .. } => Some(*page),
            _ => None,
        }
    }
}
