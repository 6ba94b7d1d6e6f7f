pub mod adapter;
pub mod endpoint;
pub mod mapper;
pub mod models;

pub use adapter::{image_url, TmdbClient};
pub use endpoint::CatalogEndpoint;
pub use mapper::TmdbMapper;
