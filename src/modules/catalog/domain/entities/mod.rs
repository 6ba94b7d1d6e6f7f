pub mod movie;
pub mod video;

pub use movie::{Genre, Movie, MovieDetails};
pub use video::{select_trailer, Video, VideoKind};
