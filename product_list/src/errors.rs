use thiserror::Error;

use crate::row::RowId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Row {0} was never created by this adapter")]
    UnknownRow(RowId),
    #[error("Position {position} is outside of the {row_count} listed products")]
    PositionOutOfRange { position: usize, row_count: usize },
}
