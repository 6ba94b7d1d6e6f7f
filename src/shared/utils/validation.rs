use regex::Regex;
use std::sync::OnceLock;

use crate::shared::errors::AppError;

pub struct Validator;

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ISO 639-1 with optional ISO 3166-1 region, e.g. "en" or "pt-BR"
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("valid language regex"))
}

impl Validator {
    pub fn validate_search_query(query: &str) -> Result<(), AppError> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        if query.len() > 255 {
            return Err(AppError::InvalidInput(
                "Search query too long (max 255 characters)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_language(language: &str) -> Result<(), AppError> {
        if !language_pattern().is_match(language) {
            return Err(AppError::InvalidInput(format!(
                "Invalid language code '{}'",
                language
            )));
        }
        Ok(())
    }

    pub fn validate_movie_id(movie_id: i64) -> Result<(), AppError> {
        if movie_id <= 0 {
            return Err(AppError::InvalidInput(
                "Movie ID must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
