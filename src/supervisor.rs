//! Connection supervisor: single Tokio task event loop, status bitmap, bootstrap gate, and
//! exponential-backoff reconnect.
//!
//! `run` assembles every other module in this crate into the actual pipeline: mapping discovery
//! feeds product discovery feeds price discovery feeds the scheduler; the scheduler's due ticks
//! feed the publish path; disconnects reset and resubmit every mirror.

use std::{collections::HashMap, sync::Arc, time::Duration};

use bitflags::bitflags;
use solana_program::pubkey::Pubkey;
use solana_rpc_client_api::response::{RpcSignatureResult, SlotInfo};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    accounts::{mapping::MappingMirror, price::PriceMirror, product::ProductMirror, MirrorState},
    blockhash_cache::BlockhashCache,
    config::Config,
    error::CoreError,
    publish::{Quote, UpdateOutcome, UpdatePriceRequest},
    request::{
        base::Lifecycle,
        composite::{CompositeOp, TwoPhase},
        ops::{InitMapping, NewAccount},
    },
    rpc::{HttpTransport, WsSubscriptions},
    scheduler::{self, Scheduler},
};

bitflags! {
    /// Monotone-set on success, cleared together on disconnect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const RPC_CONNECTED = 0b001;
        const HAS_BLOCK_HASH = 0b010;
        const HAS_MAPPING = 0b100;
    }
}

/// How often the blockhash cache is refreshed once the daemon is past bootstrap. Blockhashes
/// stay valid for roughly a couple of minutes; this is well inside that window.
const BLOCKHASH_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// `1s -> double -> cap 120s`, reset to `1s` on the next successful connect.
pub struct ReconnectBackoff {
    current: Duration,
    cap: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            current: Duration::from_secs(1),
            cap: Duration::from_secs(120),
        }
    }
}

impl ReconnectBackoff {
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn on_failure(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.cap);
        wait
    }

    pub fn on_success(&mut self) {
        self.current = Duration::from_secs(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    Mapping,
    Product,
    Price,
}

/// A decoded account-subscribe notification, tagged with which mirror it belongs to so the main
/// loop can route it without each subscription task borrowing the supervisor.
struct AccountEvent {
    kind: AccountKind,
    address: Pubkey,
    data: Vec<u8>,
}

pub struct Supervisor {
    config: Config,
    http: Arc<dyn HttpTransport>,
    tx_http: Arc<dyn HttpTransport>,
    blockhash_cache: BlockhashCache,
    status: Status,
    backoff: ReconnectBackoff,
    ws: Option<Arc<WsSubscriptions>>,
    mappings: HashMap<Pubkey, MappingMirror>,
    products: HashMap<Pubkey, ProductMirror>,
    prices: HashMap<Pubkey, PriceMirror>,
    scheduler: Scheduler,
    publish_key: Keypair,
    mapping_key: Option<Keypair>,
    account_tx: mpsc::UnboundedSender<AccountEvent>,
    account_rx: mpsc::UnboundedReceiver<AccountEvent>,
    settle_tx: mpsc::UnboundedSender<(Pubkey, Result<(), CoreError>)>,
    settle_rx: mpsc::UnboundedReceiver<(Pubkey, Result<(), CoreError>)>,
    exit: CancellationToken,
    start: Instant,
}

impl Supervisor {
    pub fn new(
        config: Config,
        http: Arc<dyn HttpTransport>,
        tx_http: Arc<dyn HttpTransport>,
        publish_key: Keypair,
        mapping_key: Option<Keypair>,
        exit: CancellationToken,
    ) -> Self {
        let interval = Duration::from_millis(config.publish_interval_ms);
        let (account_tx, account_rx) = mpsc::unbounded_channel();
        let (settle_tx, settle_rx) = mpsc::unbounded_channel();
        Self {
            config,
            http,
            tx_http,
            blockhash_cache: BlockhashCache::uninitialized(),
            status: Status::empty(),
            backoff: ReconnectBackoff::default(),
            ws: None,
            mappings: HashMap::new(),
            products: HashMap::new(),
            prices: HashMap::new(),
            scheduler: Scheduler::new(interval),
            publish_key,
            mapping_key,
            account_tx,
            account_rx,
            settle_tx,
            settle_rx,
            exit,
            start: Instant::now(),
        }
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn publish_pubkey(&self) -> Pubkey {
        self.publish_key.pubkey()
    }

    fn commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.config.commitment,
        }
    }

    /// Spin-poll until `(RPC_CONNECTED | HAS_BLOCK_HASH | [HAS_MAPPING if a mapping key is
    /// configured])` is reached or an error terminates. Reused verbatim after a reconnect: the
    /// mapping account already exists by then, so `init_mapping_if_missing`'s check is a no-op.
    pub async fn bootstrap(&mut self) -> Result<(), CoreError> {
        self.status.insert(Status::RPC_CONNECTED);

        self.blockhash_cache.init(&self.http_as_rpc_client()).await;
        self.status.insert(Status::HAS_BLOCK_HASH);

        if let Some(mapping_address) = self.config.mapping_key {
            if self.config.init_mapping_if_missing
                && self.http.get_account_info(&mapping_address).await?.is_none()
            {
                self.bootstrap_mapping_account(mapping_address).await?;
            }

            self.subscribe_mapping(mapping_address).await?;
            self.await_mapping_ready().await?;
            self.status.insert(Status::HAS_MAPPING);
        }

        self.backoff.on_success();
        Ok(())
    }

    /// `BlockhashCache::init` takes a borrowed `solana_rpc_client::nonblocking::rpc_client::RpcClient`
    /// directly rather than the `HttpTransport` trait object used elsewhere in this module; this
    /// builds one concrete client for that one seam.
    fn http_as_rpc_client(&self) -> solana_rpc_client::nonblocking::rpc_client::RpcClient {
        solana_rpc_client::nonblocking::rpc_client::RpcClient::new_with_commitment(
            self.config.rpc_http_url(),
            self.commitment(),
        )
    }

    async fn connect(&mut self, ws_url: &str) -> Result<mpsc::UnboundedReceiver<SlotInfo>, CoreError> {
        let ws = WsSubscriptions::connect(ws_url).await?;
        let slot_rx = ws.slot_subscribe(self.exit.child_token()).await?;
        self.ws = Some(Arc::new(ws));
        Ok(slot_rx)
    }

    /// Issues a real `account_subscribe` for `address` and routes every notification into
    /// `self.account_rx` tagged with `kind`, so the main loop's single `tokio::select!` can
    /// dispatch it to the right mirror. Marks the owning mirror `SentSubscribe` once the
    /// subscription is live.
    async fn spawn_account_listener(&mut self, kind: AccountKind, address: Pubkey) -> Result<(), CoreError> {
        let ws = self.ws.as_ref().ok_or_else(|| {
            CoreError::precondition("cannot account_subscribe before a WS connection is established")
        })?;
        let mut rx = ws
            .account_subscribe(address, self.commitment(), self.exit.child_token())
            .await?;

        match kind {
            AccountKind::Mapping => {
                if let Some(mirror) = self.mappings.get_mut(&address) {
                    mirror.state = MirrorState::SentSubscribe;
                }
            }
            AccountKind::Product => {
                if let Some(mirror) = self.products.get_mut(&address) {
                    mirror.state = MirrorState::SentSubscribe;
                }
            }
            AccountKind::Price => {
                if let Some(mirror) = self.prices.get_mut(&address) {
                    mirror.state = MirrorState::SentSubscribe;
                }
            }
        }

        let account_tx = self.account_tx.clone();
        tokio::spawn(async move {
            while let Some(response) = rx.recv().await {
                if let Some(account) = response.value.decode::<solana_sdk::account::Account>() {
                    if account_tx
                        .send(AccountEvent {
                            kind,
                            address,
                            data: account.data,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn subscribe_mapping(&mut self, address: Pubkey) -> Result<(), CoreError> {
        self.mappings
            .entry(address)
            .or_insert_with(|| MappingMirror::new(address));
        self.spawn_account_listener(AccountKind::Mapping, address).await
    }

    async fn subscribe_product(&mut self, address: Pubkey) -> Result<(), CoreError> {
        self.products
            .entry(address)
            .or_insert_with(|| ProductMirror::new(address));
        self.spawn_account_listener(AccountKind::Product, address).await
    }

    async fn subscribe_price(&mut self, address: Pubkey) -> Result<(), CoreError> {
        if !self.prices.contains_key(&address) {
            let phase = scheduler::phase_hash(&address);
            self.prices.insert(address, PriceMirror::new(address, phase));
            self.scheduler.register(address);
        }
        self.spawn_account_listener(AccountKind::Price, address).await
    }

    /// Blocks the caller (driving `self.account_rx` directly, since the main loop isn't running
    /// yet during bootstrap) until the configured mapping account has delivered at least one
    /// valid payload.
    async fn await_mapping_ready(&mut self) -> Result<(), CoreError> {
        let Some(root) = self.config.mapping_key else {
            return Ok(());
        };

        loop {
            match self.mappings.get(&root).map(|mirror| mirror.state) {
                Some(MirrorState::Ready) => return Ok(()),
                Some(MirrorState::Error) => {
                    return Err(CoreError::integrity("mapping account rejected"));
                }
                _ => {}
            }

            tokio::select! {
                Some(event) = self.account_rx.recv() => {
                    self.handle_account_event(event).await?;
                }
                () = self.exit.cancelled() => {
                    return Err(CoreError::transport("cancelled while waiting for the mapping account"));
                }
            }
        }
    }

    async fn handle_account_event(&mut self, event: AccountEvent) -> Result<(), CoreError> {
        match event.kind {
            AccountKind::Mapping => self.on_mapping_data(event.address, &event.data).await,
            AccountKind::Product => self.on_product_data(event.address, &event.data).await,
            AccountKind::Price => self.on_price_data(event.address, &event.data).await,
        }
    }

    async fn on_mapping_data(&mut self, address: Pubkey, data: &[u8]) -> Result<(), CoreError> {
        let Some(mirror) = self.mappings.get_mut(&address) else {
            return Ok(());
        };
        let update = mirror.on_data(data)?;

        for product_address in update.new_products {
            self.subscribe_product(product_address).await?;
        }
        if let Some(next_address) = update.next_mapping {
            self.subscribe_mapping(next_address).await?;
        }
        Ok(())
    }

    async fn on_product_data(&mut self, address: Pubkey, data: &[u8]) -> Result<(), CoreError> {
        let Some(mirror) = self.products.get_mut(&address) else {
            return Ok(());
        };
        let update = mirror.on_data(data)?;

        if let Some(price_address) = update.new_price_account {
            self.subscribe_price(price_address).await?;
        }
        Ok(())
    }

    async fn on_price_data(&mut self, address: Pubkey, data: &[u8]) -> Result<(), CoreError> {
        let local_publisher = self.publish_pubkey();
        let Some(mirror) = self.prices.get_mut(&address) else {
            return Ok(());
        };
        let next = mirror.on_data(data, &local_publisher)?;

        if let Some(next_address) = next {
            self.subscribe_price(next_address).await?;
        }
        Ok(())
    }

    /// Creates the configured mapping account on-chain via the `init_mapping` composite request
    /// before subscribing to it, for a fresh deployment where the account doesn't exist yet.
    async fn bootstrap_mapping_account(&mut self, mapping_address: Pubkey) -> Result<(), CoreError> {
        let Some(mapping_key) = self.mapping_key.as_ref() else {
            return Err(CoreError::config(
                "init_mapping_if_missing is set but no mapping_key_pair.json was loaded",
            ));
        };

        let space = std::mem::size_of::<crate::oracle::accounts::mapping::MappingAccount>() as u64;
        let lamports = self
            .http
            .get_minimum_balance_for_rent_exemption(space as usize)
            .await?;

        let op = InitMapping {
            program_id: self.config.program_key,
            account: NewAccount {
                funding_account: self.publish_key.pubkey(),
                new_account: mapping_address,
                lamports,
                space,
                owner: self.config.program_key,
            },
            permissions_account: None,
        };

        let publish_key = Keypair::from_bytes(&self.publish_key.to_bytes())
            .expect("a Keypair round-trips through to_bytes/from_bytes");
        let mapping_key = Keypair::from_bytes(&mapping_key.to_bytes())
            .expect("a Keypair round-trips through to_bytes/from_bytes");

        self.drive_composite(TwoPhase::new(op), &publish_key.pubkey(), &[&publish_key, &mapping_key])
            .await
    }

    /// Walks a [`TwoPhase`] composite request to completion against the live RPC transport:
    /// build, sign, submit, subscribe to the signature, feed the confirmation back in, repeat for
    /// the follow-up instruction if the operation has one.
    async fn drive_composite<Op: CompositeOp>(
        &self,
        mut request: TwoPhase<Op>,
        fee_payer: &Pubkey,
        signers: &[&Keypair],
    ) -> Result<(), CoreError> {
        let ws = self.ws.as_deref().ok_or_else(|| {
            CoreError::precondition("composite requests require an active WS connection")
        })?;

        request.mark_ready();
        loop {
            if let Some(instruction) = request.next_instruction() {
                match crate::wire::build_and_sign(
                    &[instruction],
                    fee_payer,
                    signers,
                    self.blockhash_cache.get(),
                ) {
                    Ok(transaction) => {
                        request.on_submitted();
                        match self.http.send_transaction(&transaction).await {
                            Ok(signature) => {
                                request.on_response(Ok(signature));
                                let confirmation = self.await_signature(ws, signature).await;
                                request.on_signature_confirmed(confirmation);
                            }
                            Err(err) => request.on_response(Err(err)),
                        }
                    }
                    Err(err) => request.on_response(Err(err)),
                }
            }

            if request.lifecycle().is_terminal() {
                break;
            }
        }

        match request.lifecycle() {
            Lifecycle::Done => Ok(()),
            Lifecycle::Error(err) => Err(err.clone()),
            _ => Err(CoreError::protocol(
                "composite request loop exited without a terminal lifecycle",
            )),
        }
    }

    async fn await_signature(&self, ws: &WsSubscriptions, signature: Signature) -> Result<(), CoreError> {
        let mut rx = ws
            .signature_subscribe(signature, self.commitment(), self.exit.child_token())
            .await?;
        match rx.recv().await {
            Some(response) => match response.value {
                RpcSignatureResult::ProcessedSignature(result) => match result.err {
                    None => Ok(()),
                    Some(err) => Err(CoreError::on_chain_reject(err.to_string())),
                },
                _ => Err(CoreError::protocol("unexpected signature_subscribe result shape")),
            },
            None => Err(CoreError::transport(
                "signature subscription closed before confirmation",
            )),
        }
    }

    /// Reconnect protocol: on disconnect, clear the bitmap together, back off, then on the
    /// next successful (re)connect reset the backoff and reset-and-resubmit every mirror
    /// (mapping, then each product, then each price). Publisher state machines in flight are not
    /// auto-retried.
    pub async fn handle_disconnect(&mut self) {
        self.status = Status::empty();
        self.ws = None;
        for mapping in self.mappings.values_mut() {
            mapping.state.reset();
        }
        for product in self.products.values_mut() {
            product.state.reset();
        }
        for price in self.prices.values_mut() {
            price.state.reset();
        }

        let wait = self.backoff.on_failure();
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = self.exit.cancelled() => {}
        }
    }

    /// Re-subscribes every already-known product/price after a reconnect. `bootstrap` handles
    /// mapping resubscribe on its own, but a re-delivered mapping payload reports no new products
    /// (they're already in `known_products`), so the products/prices discovered before the
    /// disconnect need their own direct resubscribe.
    async fn resubscribe_known_products_and_prices(&mut self) -> Result<(), CoreError> {
        let product_addresses: Vec<Pubkey> = self.products.keys().copied().collect();
        for address in product_addresses {
            self.spawn_account_listener(AccountKind::Product, address).await?;
        }

        let price_addresses: Vec<Pubkey> = self.prices.keys().copied().collect();
        for address in price_addresses {
            self.spawn_account_listener(AccountKind::Price, address).await?;
        }

        Ok(())
    }

    pub async fn run(&mut self, ws_url: String) -> Result<(), CoreError> {
        let mut slot_rx = self.connect(&ws_url).await?;
        self.bootstrap().await?;

        let mut scheduler_tick = tokio::time::interval(Duration::from_millis(10));
        let mut blockhash_tick = tokio::time::interval(BLOCKHASH_REFRESH_INTERVAL);

        loop {
            tokio::select! {
                slot = slot_rx.recv() => {
                    match slot {
                        Some(_slot_info) => {
                            let now = self.now();
                            self.scheduler.on_slot_tick(now);
                        }
                        None => {
                            self.handle_disconnect().await;
                            if self.exit.is_cancelled() {
                                return Ok(());
                            }
                            slot_rx = self.connect(&ws_url).await?;
                            self.bootstrap().await?;
                            self.resubscribe_known_products_and_prices().await?;
                        }
                    }
                }
                Some(event) = self.account_rx.recv() => {
                    if let Err(err) = self.handle_account_event(event).await {
                        log::warn!("account event rejected: {err}");
                    }
                }
                Some((address, result)) = self.settle_rx.recv() => {
                    self.handle_settlement(address, result).await;
                }
                _ = scheduler_tick.tick() => {
                    self.fire_due_publishes().await;
                }
                _ = blockhash_tick.tick() => {
                    self.refresh_blockhash().await;
                }
                () = self.exit.cancelled() => return Ok(()),
            }
        }
    }

    async fn refresh_blockhash(&mut self) {
        if let Err(err) = self.blockhash_cache.refresh(&self.http_as_rpc_client()).await {
            log::warn!("failed to refresh blockhash: {err}");
        }
    }

    /// Drains every price whose scheduled phase has come due and, if that mirror currently holds
    /// a fresh aggregate and the local publisher has a component slot, hands it to its embedded
    /// [`crate::publish::UpdatePriceRequest`].
    async fn fire_due_publishes(&mut self) {
        if !self.status.contains(Status::RPC_CONNECTED | Status::HAS_BLOCK_HASH) || !self.config.do_tx {
            return;
        }

        let now = self.now();
        let due = self.scheduler.due(now);
        for address in due {
            if let Err(err) = self.fire_one_due_publish(address).await {
                log::warn!("publish attempt for {address} failed: {err}");
            }
        }
    }

    async fn fire_one_due_publish(&mut self, address: Pubkey) -> Result<(), CoreError> {
        let Some(mirror) = self.prices.get_mut(&address) else {
            return Ok(());
        };
        if mirror.pub_idx.is_none() {
            return Ok(());
        }
        let Some((price, conf, status, _pub_slot)) = mirror.aggregate() else {
            return Ok(());
        };

        let request = mirror.publish_request.get_or_insert_with(UpdatePriceRequest::new);
        let outcome = request.update(Quote { price, conf, status });
        let UpdateOutcome::Submit(quote) = outcome else {
            return Ok(());
        };

        self.submit_quote(address, quote).await
    }

    async fn handle_settlement(&mut self, address: Pubkey, result: Result<(), CoreError>) {
        let Some(mirror) = self.prices.get_mut(&address) else {
            return;
        };
        let Some(request) = &mut mirror.publish_request else {
            return;
        };
        let Some(UpdateOutcome::Submit(quote)) = request.on_settled(result) else {
            return;
        };

        if let Err(err) = self.submit_quote(address, quote).await {
            log::warn!("re-submitting coalesced quote for {address} failed: {err}");
        }
    }

    /// Builds, signs and sends one `update_price` transaction over the publish transport
    /// (`tx_host`, distinct from `rpc_host`'s read-path client), reports the outcome to the
    /// owning mirror's [`UpdatePriceRequest`], and, on success, spawns a watcher that feeds the
    /// eventual signature confirmation back through `self.settle_tx`.
    async fn submit_quote(&mut self, address: Pubkey, quote: Quote) -> Result<(), CoreError> {
        let instruction = crate::oracle::instructions::upd_price::instruction(
            self.config.program_key,
            self.publish_key.pubkey(),
            address,
            quote.price,
            quote.conf,
            quote.status,
            0,
        );

        let transaction = crate::wire::build_and_sign(
            &[instruction],
            &self.publish_key.pubkey(),
            &[&self.publish_key],
            self.blockhash_cache.get(),
        )?;

        let result = self.tx_http.send_transaction(&transaction).await;
        match &result {
            Ok(signature) => {
                if let Some(mirror) = self.prices.get_mut(&address) {
                    if let Some(request) = &mut mirror.publish_request {
                        request.on_submitted(*signature);
                    }
                }
                self.spawn_publish_settlement_watcher(address, *signature);
            }
            Err(err) => {
                if let Some(mirror) = self.prices.get_mut(&address) {
                    if let Some(request) = &mut mirror.publish_request {
                        request.on_settled(Err(err.clone()));
                    }
                }
            }
        }

        result.map(|_| ())
    }

    fn spawn_publish_settlement_watcher(&self, address: Pubkey, signature: Signature) {
        let Some(ws) = self.ws.clone() else {
            return;
        };
        let commitment = self.commitment();
        let exit = self.exit.child_token();
        let settle_tx = self.settle_tx.clone();

        tokio::spawn(async move {
            let result = match ws.signature_subscribe(signature, commitment, exit).await {
                Ok(mut rx) => match rx.recv().await {
                    Some(response) => match response.value {
                        RpcSignatureResult::ProcessedSignature(result) => match result.err {
                            None => Ok(()),
                            Some(err) => Err(CoreError::on_chain_reject(err.to_string())),
                        },
                        _ => Err(CoreError::protocol("unexpected signature_subscribe result shape")),
                    },
                    None => Err(CoreError::transport(
                        "signature subscription closed before confirmation",
                    )),
                },
                Err(err) => Err(err),
            };
            let _ = settle_tx.send((address, result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let mut backoff = ReconnectBackoff::default();
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
        assert_eq!(backoff.on_failure(), Duration::from_secs(2));
        assert_eq!(backoff.on_failure(), Duration::from_secs(4));

        for _ in 0..10 {
            backoff.on_failure();
        }
        assert_eq!(backoff.current(), Duration::from_secs(120));
    }

    #[test]
    fn backoff_resets_to_one_second_on_success() {
        let mut backoff = ReconnectBackoff::default();
        backoff.on_failure();
        backoff.on_failure();
        backoff.on_success();
        assert_eq!(backoff.current(), Duration::from_secs(1));
    }

    #[test]
    fn status_bits_are_independent() {
        let mut status = Status::empty();
        status.insert(Status::RPC_CONNECTED);
        status.insert(Status::HAS_BLOCK_HASH);
        assert!(status.contains(Status::RPC_CONNECTED));
        assert!(!status.contains(Status::HAS_MAPPING));
    }

    #[test]
    fn disconnect_clears_every_bit_together() {
        let mut status = Status::all();
        status = Status::empty();
        assert!(status.is_empty());
    }
}
