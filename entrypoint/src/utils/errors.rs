use product_list::AdapterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShrineError {
    #[error("Failed to start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("Failed to bind product row: {0}")]
    Adapter(#[from] AdapterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_convert() {
        let err: ShrineError = AdapterError::PositionOutOfRange {
            position: 3,
            row_count: 1,
        }
        .into();

        assert_eq!(
            err.to_string(),
            "Failed to bind product row: Position 3 is outside of the 1 listed products"
        );
    }
}
