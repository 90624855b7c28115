//! linkspace/crates/ls-core/src/lib.rs
//!
//! The domain models, port traits and error taxonomy shared by every
//! LinkSpace crate.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
