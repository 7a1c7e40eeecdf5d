use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog has no products, at least one is required")]
    Empty,
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to deserialize catalog: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
