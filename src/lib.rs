//! Library surface for the price-oracle publisher daemon. `main.rs` is a thin binary shell around
//! [`supervisor::Supervisor`]; everything else here is the reusable core.

pub mod accounts;
pub mod blockhash_cache;
pub mod config;
pub mod error;
mod keypair_ext;
pub mod keystore;
pub mod local_api;
pub mod oracle;
pub mod publish;
pub mod request;
pub mod rpc;
pub mod scheduler;
pub mod stats;
pub mod supervisor;
pub mod wire;
