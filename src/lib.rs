//! XCM Transfer Core Library
//!
//! Builds and submits cross-chain (XCM) and same-chain token transfers for
//! Substrate relay chains, system chains and parachains.
//!
//! # Architecture
//!
//! This crate provides:
//! - **chains**: Chain registry and light-client chain specs
//! - **tokens**: Token table, asset routes and extrinsic selectors
//! - **client**: Connection cascade (socket, external light client, embedded
//!   engine) and the typed-API cache
//! - **balances**: Spendable balances and existential deposits
//! - **direction**: Transfer direction classification
//! - **xcm**: Locations, assets and call construction
//! - **fees**: Fee-asset conversion through liquidity pools
//! - **transfer**: The [`TransferContext`] pipeline tying it all together
//!
//! # Example
//!
//! ```rust,ignore
//! use xcm_transfer::TransferContext;
//!
//! let context = TransferContext::new(chains, tokens, config, clients, factory)?;
//! let call = context.get_xcm_transfer_extrinsic(
//!     "polkadot-asset-hub",
//!     "hydration",
//!     "USDT",
//!     "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
//!     5_000_000,
//! )?;
//! println!("{}", serde_json::to_string_pretty(&call)?);
//! ```

pub mod error;
pub mod utils;
pub mod serde_bytes;
pub mod config;
pub mod storage;
pub mod chains;
pub mod tokens;
pub mod xcm;
pub mod client;
pub mod balances;
pub mod direction;
pub mod fees;
pub mod transfer;
pub mod mocks;

// Re-export key types for convenience
pub use error::{ErrorCode, TransferError, TransferResult};
pub use config::TransferConfig;
pub use chains::{Chain, ChainRegistry, ChainType};
pub use tokens::{Token, TokenRegistry};
pub use direction::{establish_direction, Direction};
pub use utils::AccountId;
pub use transfer::{PreparedTransfer, TransferContext, TransferRequest};
