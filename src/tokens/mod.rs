//! Token Module
//!
//! Token descriptors, XCM asset routes and extrinsic selection.

pub mod types;
pub mod route;
pub mod registry;

#[cfg(test)]
mod tests;

pub use types::*;
pub use route::*;
pub use registry::*;
