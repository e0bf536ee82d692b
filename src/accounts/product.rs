//! Product account mirror.

use bytemuck::from_bytes;
use solana_program::pubkey::Pubkey;

use crate::{
    error::CoreError,
    oracle::accounts::{
        PC_ACCTYPE_PRODUCT,
        product::{self, ProductAccountHeader},
    },
};

use super::MirrorState;

pub struct ProductMirror {
    pub address: Pubkey,
    pub state: MirrorState,
    pub attributes: Vec<(String, String)>,
    first_price_account: Option<Pubkey>,
    /// Set once the price chain has been subscribed to, so a re-delivered product account
    /// doesn't re-issue the subscription.
    subscribed_to_price: bool,
}

pub struct ProductUpdate {
    /// The product's first price account, if it hasn't been subscribed to yet.
    pub new_price_account: Option<Pubkey>,
    /// `true` when this call replaced a previously-accepted attribute set, i.e. subscribers
    /// should be notified of a product update rather than a first discovery.
    pub replaced_existing: bool,
}

impl ProductMirror {
    pub fn new(address: Pubkey) -> Self {
        Self {
            address,
            state: MirrorState::Subscribe,
            attributes: Vec::new(),
            first_price_account: None,
            subscribed_to_price: false,
        }
    }

    pub fn on_data(&mut self, data: &[u8]) -> Result<ProductUpdate, CoreError> {
        let header_size = std::mem::size_of::<ProductAccountHeader>();
        if data.len() < header_size {
            self.state = MirrorState::Error;
            return Err(CoreError::integrity("product account data too short"));
        }

        let header: &ProductAccountHeader = from_bytes(&data[..header_size]);
        header.header.check(PC_ACCTYPE_PRODUCT)?;

        let attrs_end = (header.header.size as usize).min(data.len());
        let attributes = product::parse_attributes(&data[header_size..attrs_end])
            .inspect_err(|_| self.state = MirrorState::Error)?;

        if product::find_symbol(&attributes).is_none() {
            self.state = MirrorState::Error;
            return Err(CoreError::integrity(
                "product account is missing the required `symbol` attribute",
            ));
        }

        let replaced_existing = !self.attributes.is_empty();
        self.attributes = attributes;
        self.first_price_account = (header.first_price_account != Pubkey::default())
            .then_some(header.first_price_account);
        self.state = MirrorState::Ready;

        let new_price_account = if self.subscribed_to_price {
            None
        } else {
            self.subscribed_to_price = self.first_price_account.is_some();
            self.first_price_account
        };

        Ok(ProductUpdate {
            new_price_account,
            replaced_existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Zeroable, bytes_of};
    use crate::oracle::accounts::{AccountHeader, PC_MAGIC, PC_VERSION};

    fn encode(header: ProductAccountHeader, attrs: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (key, value) in attrs {
            body.push(key.len() as u8);
            body.extend(key.as_bytes());
            body.push(value.len() as u8);
            body.extend(value.as_bytes());
        }

        let mut header = header;
        header.header.size = (std::mem::size_of::<ProductAccountHeader>() + body.len()) as u32;

        let mut out = bytes_of(&header).to_vec();
        out.extend(body);
        out
    }

    fn valid_header() -> ProductAccountHeader {
        let mut header = ProductAccountHeader::zeroed();
        header.header = AccountHeader {
            magic_number: PC_MAGIC,
            version: PC_VERSION,
            account_type: PC_ACCTYPE_PRODUCT,
            size: 0,
        };
        header
    }

    #[test]
    fn subscribes_to_first_price_exactly_once() {
        let mut mirror = ProductMirror::new(Pubkey::new_unique());
        let mut header = valid_header();
        header.first_price_account = Pubkey::new_unique();

        let data = encode(header, &[("symbol", "BTC/USD")]);
        let update = mirror.on_data(&data).unwrap();
        assert_eq!(update.new_price_account, Some(header.first_price_account));
        assert!(!update.replaced_existing);

        let update = mirror.on_data(&data).unwrap();
        assert_eq!(update.new_price_account, None);
        assert!(update.replaced_existing);
    }

    #[test]
    fn rejects_a_product_missing_the_symbol_attribute() {
        let mut mirror = ProductMirror::new(Pubkey::new_unique());
        let header = valid_header();
        let data = encode(header, &[("asset_type", "Crypto")]);

        assert!(mirror.on_data(&data).is_err());
        assert_eq!(mirror.state, MirrorState::Error);
    }
}
