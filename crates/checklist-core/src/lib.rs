//! Checklist Core
//!
//! Durable storage for the tab checklist document. The document is a single
//! JSON file shared between the local service, the desktop widget (which
//! reads the file directly) and any editor that replaces it wholesale.

pub mod config;
pub mod document;
pub mod error;
pub mod store;

pub use config::{ServerConfig, DATA_FILE_NAME, DEFAULT_PORT};
pub use document::{validate_shape, Category, Checklist, Item, ShapeError, DEFAULT_CATEGORIES};
pub use error::{ConfigError, Result, StoreError};
pub use store::{Store, EMPTY_DOCUMENT};
