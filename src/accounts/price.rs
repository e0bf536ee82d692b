//! Price account mirror — the fan-out point for local subscribers and the home of the embedded
//! at-most-one-in-flight publish request.

use bytemuck::from_bytes;
use solana_program::pubkey::Pubkey;

use crate::{
    error::CoreError,
    oracle::accounts::{PC_ACCTYPE_PRICE, price::PriceAccount},
    publish::UpdatePriceRequest,
    stats::PublishStats,
};

use super::MirrorState;

/// Price mirror lifecycle: `{ subscribe, sent-subscribe, publish, error }`. `Publish` is
/// [`MirrorState::Ready`] under this mirror kind's own vocabulary; the underlying state
/// transitions are identical to the other two mirror kinds.
pub type PriceMirrorState = MirrorState;

pub struct PriceMirror {
    pub address: Pubkey,
    pub state: PriceMirrorState,
    account: Option<PriceAccount>,
    /// This publisher's position in the component array, or `None` if it isn't currently a
    /// publisher of this price.
    pub pub_idx: Option<usize>,
    pub stats: PublishStats,
    /// At most one outstanding publish request per mirror.
    pub publish_request: Option<UpdatePriceRequest>,
    /// Deterministic scheduling phase, `hash(address) mod FRACTION`.
    pub phase_hash: u64,
    subscribed_to_next: bool,
    seen_first_update: bool,
}

impl PriceMirror {
    pub fn new(address: Pubkey, phase_hash: u64) -> Self {
        Self {
            address,
            state: MirrorState::Subscribe,
            account: None,
            pub_idx: None,
            stats: PublishStats::default(),
            publish_request: None,
            phase_hash,
            subscribed_to_next: false,
            seen_first_update: false,
        }
    }

    pub fn on_data(
        &mut self,
        data: &[u8],
        local_publisher: &Pubkey,
    ) -> Result<Option<Pubkey>, CoreError> {
        let size = std::mem::size_of::<PriceAccount>();
        if data.len() < size {
            self.state = MirrorState::Error;
            return Err(CoreError::integrity("price account data too short"));
        }

        let account: &PriceAccount = from_bytes(&data[..size]);
        account.header.check(PC_ACCTYPE_PRICE)?;

        let valid_slot = self.account.map(|previous| previous.valid_slot);
        if let Some(valid_slot) = valid_slot {
            if self.seen_first_update && account.agg.pub_slot < valid_slot {
                self.stats.num_sub_drop += 1;
            }
        }

        self.pub_idx = account.find_publisher_index(local_publisher);
        self.account = Some(*account);
        self.state = MirrorState::Ready;
        self.seen_first_update = true;

        let next_price = if self.subscribed_to_next {
            None
        } else {
            self.subscribed_to_next = account.has_next();
            account.has_next().then_some(account.next_price_account)
        };

        Ok(next_price)
    }

    pub fn aggregate(&self) -> Option<(i64, u64, u32, u64)> {
        self.account
            .map(|account| {
                (
                    account.agg.price,
                    account.agg.conf,
                    account.agg.status,
                    account.agg.pub_slot,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Zeroable, bytes_of};
    use crate::oracle::accounts::{AccountHeader, PC_MAGIC, PC_VERSION};

    fn valid_account() -> PriceAccount {
        let mut account = PriceAccount::zeroed();
        account.header = AccountHeader {
            magic_number: PC_MAGIC,
            version: PC_VERSION,
            account_type: PC_ACCTYPE_PRICE,
            size: std::mem::size_of::<PriceAccount>() as u32,
        };
        account
    }

    #[test]
    fn finds_the_local_publisher_index() {
        let mut mirror = PriceMirror::new(Pubkey::new_unique(), 42);
        let publisher = Pubkey::new_unique();
        let mut account = valid_account();
        account.num = 1;
        account.comp[0].pub_ = publisher;

        mirror.on_data(bytes_of(&account), &publisher).unwrap();
        assert_eq!(mirror.pub_idx, Some(0));
    }

    #[test]
    fn counts_sub_drop_on_a_stale_out_of_order_update() {
        let mut mirror = PriceMirror::new(Pubkey::new_unique(), 42);
        let publisher = Pubkey::new_unique();

        let mut first = valid_account();
        first.valid_slot = 100;
        first.agg.pub_slot = 100;
        mirror.on_data(bytes_of(&first), &publisher).unwrap();

        let mut stale = valid_account();
        stale.valid_slot = 100;
        stale.agg.pub_slot = 50;
        mirror.on_data(bytes_of(&stale), &publisher).unwrap();

        assert_eq!(mirror.stats.num_sub_drop, 1);
    }

    #[test]
    fn subscribes_to_the_next_price_account_exactly_once() {
        let mut mirror = PriceMirror::new(Pubkey::new_unique(), 42);
        let publisher = Pubkey::new_unique();
        let mut account = valid_account();
        account.next_price_account = Pubkey::new_unique();

        let next = mirror.on_data(bytes_of(&account), &publisher).unwrap();
        assert_eq!(next, Some(account.next_price_account));

        let next = mirror.on_data(bytes_of(&account), &publisher).unwrap();
        assert_eq!(next, None);
    }
}
