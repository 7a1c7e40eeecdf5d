pub mod adapter;
pub mod errors;
pub mod row;

pub use adapter::ProductAdapter;
pub use errors::AdapterError;
pub use row::{ProductRow, RowId, RowImage, RowState};
