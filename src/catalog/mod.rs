// src/catalog/mod.rs

pub mod search;
pub mod store;
pub mod types;

pub use store::{CatalogSearch, QdrantCatalogStore};
pub use types::CourseRecord;
