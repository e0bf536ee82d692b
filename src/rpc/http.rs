//! The HTTP request/response channel.
//!
//! `solana_rpc_client::nonblocking::rpc_client::RpcClient` already does id-correlated
//! request/response matching internally; wrapping it in a second hand-rolled id table would
//! duplicate, not replace, the dependency.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, signature::Signature,
    transaction::Transaction,
};

use crate::error::CoreError;

/// The subset of chain RPC calls the daemon issues on its hot and bootstrap paths.
/// `async_trait`-boxed so it can be used as `Arc<dyn HttpTransport>` —
/// native `async fn` in traits isn't dyn-compatible, and the supervisor needs a trait object to
/// swap in a mock transport for tests without a live cluster.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, CoreError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, CoreError>;

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Account>, CoreError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, CoreError>;
}

pub struct RpcHttpClient {
    inner: RpcClient,
}

impl RpcHttpClient {
    pub fn new(url: String, commitment: CommitmentConfig) -> Self {
        Self {
            inner: RpcClient::new_with_commitment(url, commitment),
        }
    }
}

#[async_trait]
impl HttpTransport for RpcHttpClient {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, CoreError> {
        self.inner
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(|err| CoreError::transport(err.to_string()))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, CoreError> {
        self.inner
            .get_latest_blockhash()
            .await
            .map_err(|err| CoreError::transport(err.to_string()))
    }

    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<Account>, CoreError> {
        match self.inner.get_account(address).await {
            Ok(account) => Ok(Some(account)),
            Err(err) if is_account_not_found(&err) => Ok(None),
            Err(err) => Err(CoreError::transport(err.to_string())),
        }
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, CoreError> {
        self.inner
            .send_transaction_with_config(
                transaction,
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await
            .map_err(|err| CoreError::on_chain_reject(err.to_string()))
    }
}

fn is_account_not_found(err: &solana_rpc_client_api::client_error::Error) -> bool {
    err.to_string().contains("AccountNotFound")
}
