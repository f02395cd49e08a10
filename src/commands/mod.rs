//! CLI commands implementation

pub mod build;
pub mod interactive;
pub mod query;

pub use build::*;
pub use interactive::*;
pub use query::*;
