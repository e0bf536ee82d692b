//! The WebSocket subscription channel.
//!
//! Each subscription is one spawned task reading `solana_pubsub_client`'s own stream and
//! forwarding notifications into the owning mirror/request's channel, rather than a single
//! socket multiplexing a `subscription id -> request` dispatch table by hand. The supervisor
//! owns a `CancellationToken` that tears every subscription task down together on reconnect, so
//! it is the single owner of connection lifetime rather than each request tracking its own
//! socket state.

use solana_account_decoder::UiAccount;
use solana_program::pubkey::Pubkey;
use solana_pubsub_client::nonblocking::pubsub_client::PubsubClient;
use solana_rpc_client_api::{
    config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSignatureSubscribeConfig},
    response::{Response as RpcResponse, RpcKeyedAccount, RpcSignatureResult, SlotInfo},
};
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

pub struct WsSubscriptions {
    client: PubsubClient,
}

impl WsSubscriptions {
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let client = PubsubClient::new(url)
            .await
            .map_err(|err| CoreError::transport(err.to_string()))?;
        Ok(Self { client })
    }

    /// Every reconnect invalidates all subscription ids; callers re-subscribe against a freshly
    /// connected instance rather than resuming one.
    pub async fn slot_subscribe(
        &self,
        exit: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<SlotInfo>, CoreError> {
        let (mut stream, unsubscribe) = self
            .client
            .slot_subscribe()
            .await
            .map_err(|err| CoreError::transport(err.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = stream.next_item() => {
                        let Some(item) = item else { break };
                        if tx.send(item).is_err() {
                            break;
                        }
                    }
                    () = exit.cancelled() => break,
                }
            }
            unsubscribe().await;
        });

        Ok(rx)
    }

    pub async fn account_subscribe(
        &self,
        address: Pubkey,
        commitment: CommitmentConfig,
        exit: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<RpcResponse<UiAccount>>, CoreError> {
        let config = RpcAccountInfoConfig {
            commitment: Some(commitment),
            encoding: Some(solana_account_decoder::UiAccountEncoding::Base64),
            ..RpcAccountInfoConfig::default()
        };

        let (mut stream, unsubscribe) = self
            .client
            .account_subscribe(&address, Some(config))
            .await
            .map_err(|err| CoreError::transport(err.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = stream.next_item() => {
                        let Some(item) = item else { break };
                        if tx.send(item).is_err() {
                            break;
                        }
                    }
                    () = exit.cancelled() => break,
                }
            }
            unsubscribe().await;
        });

        Ok(rx)
    }

    pub async fn program_subscribe(
        &self,
        program_id: Pubkey,
        exit: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<RpcResponse<RpcKeyedAccount>>, CoreError> {
        let config = RpcProgramAccountsConfig {
            account_config: RpcAccountInfoConfig {
                encoding: Some(solana_account_decoder::UiAccountEncoding::Base64),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let (mut stream, unsubscribe) = self
            .client
            .program_subscribe(&program_id, Some(config))
            .await
            .map_err(|err| CoreError::transport(err.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = stream.next_item() => {
                        let Some(item) = item else { break };
                        if tx.send(item).is_err() {
                            break;
                        }
                    }
                    () = exit.cancelled() => break,
                }
            }
            unsubscribe().await;
        });

        Ok(rx)
    }

    pub async fn signature_subscribe(
        &self,
        signature: Signature,
        commitment: CommitmentConfig,
        exit: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<RpcResponse<RpcSignatureResult>>, CoreError> {
        let config = RpcSignatureSubscribeConfig {
            commitment: Some(commitment),
            enable_received_notification: Some(false),
        };

        let (mut stream, unsubscribe) = self
            .client
            .signature_subscribe(&signature, Some(config))
            .await
            .map_err(|err| CoreError::transport(err.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            // A signature subscription fires at most once before the chain auto-unsubscribes it;
            // one successful forward is sufficient life for this task.
            tokio::select! {
                item = stream.next_item() => {
                    if let Some(item) = item {
                        let _ = tx.send(item);
                    }
                }
                () = exit.cancelled() => {}
            }
            unsubscribe().await;
        });

        Ok(rx)
    }
}

trait StreamNextItem<T> {
    async fn next_item(&mut self) -> Option<T>;
}

impl<S, T> StreamNextItem<T> for S
where
    S: futures::Stream<Item = T> + Unpin,
{
    async fn next_item(&mut self) -> Option<T> {
        futures::StreamExt::next(self).await
    }
}
