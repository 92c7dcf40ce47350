// ABOUTME: Persistence layer for letterbox, storing each user as one flat CSV file.
// ABOUTME: Provides configuration, save/load by handle, and enumeration of all stored users.

pub mod config;
pub mod listing;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use listing::UserIter;
pub use store::{StoreError, UserStore};
