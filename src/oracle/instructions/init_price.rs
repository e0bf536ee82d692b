use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

/// Re-initializes an existing price account's header (exponent, price type) without touching its
/// publisher component list. Used when a product's price type needs to be changed in place.
pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    price_account: Pubkey,
    permissions_account: Option<Pubkey>,
    exponent: i32,
    price_type: u32,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(price_account, false),
        AccountMeta::new_readonly(permissions_account, false),
    ];

    simple_instruction(
        program_id,
        accounts,
        &InitPriceArgs::new(exponent, price_type),
    )
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct InitPriceArgs {
    pub header: CommandHeader,
    pub exponent: i32,
    pub price_type: u32,
}

impl InitPriceArgs {
    pub fn new(exponent: i32, price_type: u32) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::InitPrice),
            exponent,
            price_type,
        }
    }
}
