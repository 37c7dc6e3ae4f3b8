//! Chain Registry Module
//!
//! Chain descriptors, classification predicates and light-client specs.

pub mod types;
pub mod registry;
pub mod specs;

#[cfg(test)]
mod tests;

pub use types::*;
pub use registry::*;
pub use specs::*;
