//! vc_ledger - a single-process proof-of-work ledger where miner and spender
//! threads race against one shared chain.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod ledger;
pub mod registry;
mod serde_hex;
pub mod sim;
pub mod transaction;
pub mod wallet;
