//! Fee Module
//!
//! Fee-asset locations, pool-based conversion quotes and generation-tagged
//! fee estimates.

mod conversion;
mod quote;


pub use conversion::*;
pub use quote::*;
