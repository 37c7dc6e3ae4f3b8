//! XCM Module
//!
//! Locations, assets and the cross-chain transfer argument builder.

pub mod location;
pub mod assets;
pub mod builder;


pub use location::*;
pub use assets::*;
pub use builder::*;
