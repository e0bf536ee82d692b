//! Downstream JSON-RPC surface contract for local publishers.
//!
//! No HTTP/WebSocket listener is bound here — binding one is the out-of-scope "local JSON-RPC/
//! WebSocket server surface" collaborator. This module is only the trait the core exposes to
//! that surface: an external binary or test harness adapts a transport onto [`PublisherApi`],
//! whose methods marshal into the supervisor's event loop via a channel.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingStatus {
    Unknown,
    Trading,
    Halted,
    Auction,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub product_account: Pubkey,
    pub symbol: String,
    pub price_accounts: Vec<Pubkey>,
}

/// Error codes at this surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    ParseError,
    InvalidRequest,
    UnknownMethod,
    InvalidParams,
    UnknownSymbol,
    MissingPermission,
    NotReady,
}

impl ApiError {
    pub const fn code(self) -> i32 {
        match self {
            ApiError::ParseError => -32700,
            ApiError::InvalidRequest => -32600,
            ApiError::UnknownMethod => -32601,
            ApiError::InvalidParams => -32602,
            ApiError::UnknownSymbol => -32000,
            ApiError::MissingPermission => -32001,
            ApiError::NotReady => -32002,
        }
    }
}

#[async_trait]
pub trait PublisherApi: Send + Sync {
    async fn update_price(
        &self,
        account: Pubkey,
        price: i64,
        conf: u64,
        status: TradingStatus,
    ) -> Result<(), ApiError>;

    async fn subscribe_price(&self, account: Pubkey) -> Result<(), ApiError>;

    async fn subscribe_price_sched(&self, account: Pubkey) -> Result<(), ApiError>;

    async fn get_product_list(&self) -> Result<Vec<ProductSummary>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_the_documented_surface() {
        assert_eq!(ApiError::UnknownSymbol.code(), -32000);
        assert_eq!(ApiError::MissingPermission.code(), -32001);
        assert_eq!(ApiError::NotReady.code(), -32002);
    }
}
