//! Utilities Module
//!
//! Common utilities used across the crate.

mod json;
mod math;
pub mod endpoint;
pub mod logging;
pub mod ss58;

pub use endpoint::*;
pub use json::*;
pub use math::*;
pub use ss58::AccountId;
