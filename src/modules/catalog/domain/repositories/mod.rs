mod movie_catalog;

pub use movie_catalog::MovieCatalog;
#[cfg(test)]
pub use movie_catalog::MockMovieCatalog;
