//! Concrete [`CompositeOp`](super::composite::CompositeOp) instantiations, one per one-time
//! account-creation chain. These reuse the existing instruction builders
//! (`oracle::instructions::*`) as the "build a step" leaves of the state machine instead of
//! duplicating instruction-construction logic here.

use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::system_instruction;

use crate::oracle::instructions::{add_mapping, add_price, add_product, add_publisher};

use super::composite::CompositeOp;

/// Lamports and space needed for a freshly created account are supplied by the caller (computed
/// via `HttpTransport::get_minimum_balance_for_rent_exemption` against the relevant
/// `ACCOUNT_MIN_SIZE`), not hardcoded here.
pub struct NewAccount {
    pub funding_account: Pubkey,
    pub new_account: Pubkey,
    pub lamports: u64,
    pub space: u64,
    pub owner: Pubkey,
}

fn create_account_instruction(new_account: &NewAccount) -> Instruction {
    system_instruction::create_account(
        &new_account.funding_account,
        &new_account.new_account,
        new_account.lamports,
        new_account.space,
        &new_account.owner,
    )
}

pub struct InitMapping {
    pub program_id: Pubkey,
    pub account: NewAccount,
    pub permissions_account: Option<Pubkey>,
}

impl CompositeOp for InitMapping {
    fn build_create(&self) -> Instruction {
        create_account_instruction(&self.account)
    }

    fn build_followup(&self) -> Instruction {
        crate::oracle::instructions::init_mapping::instruction(
            self.program_id,
            self.account.funding_account,
            self.account.new_account,
            self.permissions_account,
        )
    }
}

pub struct AddMapping {
    pub program_id: Pubkey,
    pub account: NewAccount,
    pub cur_mapping_account: Pubkey,
    pub permissions_account: Option<Pubkey>,
}

impl CompositeOp for AddMapping {
    fn build_create(&self) -> Instruction {
        create_account_instruction(&self.account)
    }

    fn build_followup(&self) -> Instruction {
        add_mapping::instruction(
            self.program_id,
            self.account.funding_account,
            self.cur_mapping_account,
            self.account.new_account,
            self.permissions_account,
        )
    }
}

pub struct AddProduct {
    pub program_id: Pubkey,
    pub account: NewAccount,
    pub mapping_account: Pubkey,
    pub permissions_account: Option<Pubkey>,
    pub metadata: Vec<(String, String)>,
}

impl CompositeOp for AddProduct {
    fn build_create(&self) -> Instruction {
        create_account_instruction(&self.account)
    }

    fn build_followup(&self) -> Instruction {
        let metadata: Vec<(&str, &str)> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        add_product::instruction(
            self.program_id,
            self.account.funding_account,
            self.mapping_account,
            self.account.new_account,
            self.permissions_account,
            &metadata,
        )
    }
}

pub struct AddPrice {
    pub program_id: Pubkey,
    pub account: NewAccount,
    pub product_account: Pubkey,
    pub permissions_account: Option<Pubkey>,
    pub exponent: i32,
}

impl CompositeOp for AddPrice {
    fn build_create(&self) -> Instruction {
        create_account_instruction(&self.account)
    }

    fn build_followup(&self) -> Instruction {
        add_price::instruction(
            self.program_id,
            self.account.funding_account,
            self.product_account,
            self.account.new_account,
            self.permissions_account,
            self.exponent,
        )
    }
}

/// `add_publisher` has no account to create; it only needs the one instruction plus its
/// signature confirmation, so it opts out of the follow-up phase (`has_followup` below).
pub struct AddPublisher {
    pub program_id: Pubkey,
    pub funding_account: Pubkey,
    pub price_account: Pubkey,
    pub permissions_account: Option<Pubkey>,
    pub publisher: Pubkey,
}

impl CompositeOp for AddPublisher {
    fn build_create(&self) -> Instruction {
        add_publisher::instruction(
            self.program_id,
            self.funding_account,
            self.price_account,
            self.permissions_account,
            self.publisher,
        )
    }

    fn has_followup(&self) -> bool {
        false
    }
}
