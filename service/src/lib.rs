//! Fielder prediction service
//!
//! Async shell around `fielder-engine`: configuration, weather providers,
//! the research catalog and the end-to-end prediction pipeline.

pub mod config;
pub mod error;
pub mod external;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
