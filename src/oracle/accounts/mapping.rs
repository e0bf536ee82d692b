//! Describes a `mapping` account of the Oracle program.
//!
//! Shape follows `pc::pc_map_table_t` in `examples/original_source/pc/misc.hpp`/`pc/manager.hpp`:
//! a fixed-size header, a count, a flat table of up to [`PC_MAP_TABLE_SIZE`] product addresses, and
//! a `next` pointer chaining to another mapping account once the table fills up.

use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;

use super::AccountHeader;

/// `PC_MAP_TABLE_SIZE` in the Oracle code.
pub const PC_MAP_TABLE_SIZE: usize = 640;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct MappingAccount {
    pub header: AccountHeader,
    /// Number of populated slots in `products`.
    pub num_products: u32,
    pub unused: u32,
    /// Next mapping account in the chain, or the zero pubkey if this is the last one.
    pub next_mapping_account: Pubkey,
    pub products: [Pubkey; PC_MAP_TABLE_SIZE],
}

impl MappingAccount {
    /// Product addresses actually populated, in on-chain order.
    pub fn product_accounts(&self) -> &[Pubkey] {
        let num = (self.num_products as usize).min(PC_MAP_TABLE_SIZE);
        &self.products[..num]
    }

    pub fn has_next(&self) -> bool {
        self.next_mapping_account != Pubkey::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_accounts_truncates_to_num_products() {
        let mut account = MappingAccount::zeroed();
        account.num_products = 2;
        account.products[0] = Pubkey::new_unique();
        account.products[1] = Pubkey::new_unique();
        account.products[2] = Pubkey::new_unique();

        assert_eq!(account.product_accounts().len(), 2);
        assert_eq!(account.product_accounts()[0], account.products[0]);
        assert_eq!(account.product_accounts()[1], account.products[1]);
    }

    #[test]
    fn num_products_is_clamped_to_table_size() {
        let mut account = MappingAccount::zeroed();
        account.num_products = u32::MAX;

        assert_eq!(account.product_accounts().len(), PC_MAP_TABLE_SIZE);
    }

    #[test]
    fn has_next_reflects_the_default_pubkey_sentinel() {
        let mut account = MappingAccount::zeroed();
        assert!(!account.has_next());

        account.next_mapping_account = Pubkey::new_unique();
        assert!(account.has_next());
    }
}
