//! Mapping account mirror.

use bytemuck::from_bytes;
use solana_program::pubkey::Pubkey;

use crate::{
    error::CoreError,
    oracle::accounts::{PC_ACCTYPE_MAPPING, mapping::MappingAccount},
};

use super::MirrorState;

pub struct MappingMirror {
    pub address: Pubkey,
    pub state: MirrorState,
    account: Option<MappingAccount>,
    /// Product addresses already mirrored, so a re-delivered mapping account (or a reconnect
    /// re-subscribe) doesn't spawn duplicate product mirrors.
    known_products: Vec<Pubkey>,
}

/// What the supervisor should do in response to a freshly accepted mapping payload.
pub struct MappingUpdate {
    /// Product addresses not previously known, in on-chain order; the supervisor constructs a
    /// `ProductMirror` and subscribes to each.
    pub new_products: Vec<Pubkey>,
    /// The next mapping account to subscribe to, if the chain continues and hasn't been followed
    /// yet.
    pub next_mapping: Option<Pubkey>,
}

impl MappingMirror {
    pub fn new(address: Pubkey) -> Self {
        Self {
            address,
            state: MirrorState::Subscribe,
            account: None,
            known_products: Vec::new(),
        }
    }

    pub fn on_data(&mut self, data: &[u8]) -> Result<MappingUpdate, CoreError> {
        if data.len() < std::mem::size_of::<MappingAccount>() {
            self.state = MirrorState::Error;
            return Err(CoreError::integrity("mapping account data too short"));
        }

        let account: &MappingAccount =
            from_bytes(&data[..std::mem::size_of::<MappingAccount>()]);
        if let Err(err) = account.header.check(PC_ACCTYPE_MAPPING) {
            self.state = MirrorState::Error;
            return Err(err);
        }

        let new_products: Vec<Pubkey> = account
            .product_accounts()
            .iter()
            .filter(|address| !self.known_products.contains(address))
            .copied()
            .collect();
        self.known_products.extend(&new_products);

        let next_mapping = account.has_next().then_some(account.next_mapping_account);

        self.account = Some(*account);
        self.state = MirrorState::Ready;

        Ok(MappingUpdate {
            new_products,
            next_mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Zeroable, bytes_of};
    use crate::oracle::accounts::{AccountHeader, PC_MAGIC, PC_VERSION};

    fn encode(account: &MappingAccount) -> Vec<u8> {
        bytes_of(account).to_vec()
    }

    fn valid_header() -> AccountHeader {
        AccountHeader {
            magic_number: PC_MAGIC,
            version: PC_VERSION,
            account_type: PC_ACCTYPE_MAPPING,
            size: std::mem::size_of::<MappingAccount>() as u32,
        }
    }

    #[test]
    fn reports_new_products_once() {
        let mut mirror = MappingMirror::new(Pubkey::new_unique());
        let mut account = MappingAccount::zeroed();
        account.header = valid_header();
        account.num_products = 2;
        account.products[0] = Pubkey::new_unique();
        account.products[1] = Pubkey::new_unique();

        let update = mirror.on_data(&encode(&account)).unwrap();
        assert_eq!(update.new_products.len(), 2);
        assert_eq!(mirror.state, MirrorState::Ready);

        // Re-delivering the same payload (e.g. after a reconnect resubscribe) reports no new
        // products the second time.
        let update = mirror.on_data(&encode(&account)).unwrap();
        assert!(update.new_products.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut mirror = MappingMirror::new(Pubkey::new_unique());
        let mut account = MappingAccount::zeroed();
        account.header = valid_header();
        account.header.magic_number = 0;

        assert!(mirror.on_data(&encode(&account)).is_err());
        assert_eq!(mirror.state, MirrorState::Error);
    }
}
