//! Utilities shared across database connectors

pub mod lazy;

pub use lazy::LazyConnection;
