pub mod genres;
pub mod movie_details;
pub mod paged_movies;

pub use genres::{GenresState, GenresViewModel};
pub use movie_details::{MovieDetailsState, MovieDetailsViewModel};
pub use paged_movies::{
    GenreMovies, MoviePageSource, PagedMoviesState, PagedMoviesViewModel, RecommendedMovies,
    SearchMovies,
};
