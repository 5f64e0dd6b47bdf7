//! Shared types for the microtexto corpus dashboard.

pub mod categoria;
pub mod schema;
pub mod tags;

pub use categoria::Categoria;
pub use schema::corpus;
