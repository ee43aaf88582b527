//! Configuration loading and management.

mod layers;
mod loader;
mod schema;

pub use layers::*;
pub use loader::*;
pub use schema::*;
