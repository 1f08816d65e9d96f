//! NexGen Core: domain models, error types, and repository traits
//! shared by the owner console crates.

pub mod error;
pub mod invitation;
pub mod models;
pub mod repository;

pub use error::{NexgenError, NexgenResult};
