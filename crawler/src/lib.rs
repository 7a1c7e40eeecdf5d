pub mod errors;
pub mod request;
pub mod traits;
pub mod unprotected;
