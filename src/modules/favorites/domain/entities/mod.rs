pub mod favorite;

pub use favorite::{document_id, sort_newest_first, FavoriteEntry};
