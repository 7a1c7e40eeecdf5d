pub mod catalog;
pub mod deserialize_disallow_empty_string;
pub mod display;
pub mod errors;
pub mod image_cache;
pub mod product;
