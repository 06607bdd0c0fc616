//! Common utilities and shared types for campus-resolve.
//!
//! - **Configuration**: layered settings via [`Config`]
//! - **Error handling**: unified error type via [`AppError`] and [`AppResult`]
//!
//! # Example
//!
//! ```no_run
//! use campus_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("backend at {}", config.api.base_url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
