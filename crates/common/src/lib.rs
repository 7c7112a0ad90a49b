//! Common utilities and shared types for photoshare.
//!
//! This crate provides foundational components used across all photoshare crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Storage**: Photo file storage backends (local filesystem, in-memory)
//!
//! # Example
//!
//! ```no_run
//! use photoshare_common::{AppResult, Config, LocalStorage};
//!
//! async fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let storage = LocalStorage::new(config.storage.base_path.clone());
//!     storage.init().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use storage::{
    LocalStorage, MemoryStorage, SharedStorage, StorageBackend, photo_storage_key,
};
