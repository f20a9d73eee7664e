pub mod types;
pub mod auth;
pub mod error;

pub use types::*;
pub use auth::BinanceAuth;
pub use error::BinanceError;
