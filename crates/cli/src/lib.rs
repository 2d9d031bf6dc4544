//! gowatch library surface
//!
//! Exposes the watch engine so integration tests can drive it without the
//! binary.

pub mod engine;

pub use engine::{Admission, Engine};
