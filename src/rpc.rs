//! Multiplexed JSON-RPC-over-HTTP (requests) and JSON-RPC-over-WebSocket (subscriptions) to the
//! chain RPC node.

pub mod http;
pub mod ws;

#[cfg(test)]
pub mod mock;

pub use http::{HttpTransport, RpcHttpClient};
pub use ws::WsSubscriptions;
