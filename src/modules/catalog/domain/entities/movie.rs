use serde::{Deserialize, Serialize};

/// Movie as listed by the catalog. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: f32,
    pub overview: String,
    pub genre_ids: Option<Vec<i64>>,
}

impl Movie {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            release_date: None,
            poster_path: None,
            vote_average: 0.0,
            overview: String::new(),
            genre_ids: None,
        }
    }

    /// Year part of the release date, if the date is present and well formed
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Full movie record for the details screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub movie: Movie,
    pub backdrop_path: Option<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub genres: Vec<Genre>,
    pub vote_count: u32,
    pub status: Option<String>,
    pub homepage: Option<String>,
}

impl MovieDetails {
    /// Runtime formatted as "2h 19m"
    pub fn formatted_runtime(&self) -> Option<String> {
        match self.runtime? {
            0 => None,
            minutes if minutes < 60 => Some(format!("{}m", minutes)),
            minutes => Some(format!("{}h {}m", minutes / 60, minutes % 60)),
        }
    }
}
