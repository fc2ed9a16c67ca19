pub mod config;
pub mod error;
pub mod types;

pub use config::SquariumConfig;
pub use error::{Result, SquariumError};
pub use types::*;
