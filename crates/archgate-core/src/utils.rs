//! Utility functions for rule implementations.

pub mod names;

// Re-export commonly used utilities for rule implementations
#[doc(inline)]
pub use names::{simple_name, strip_generics};
