use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

/// Seeds a price account with a deterministic test aggregate. Staging/devnet clusters only; the
/// deployed mainnet program rejects this command.
pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    price_account: Pubkey,
    permissions_account: Option<Pubkey>,
    price: i64,
    conf: u64,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(price_account, false),
        AccountMeta::new_readonly(permissions_account, false),
    ];

    simple_instruction(program_id, accounts, &InitTestArgs::new(price, conf))
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct InitTestArgs {
    pub header: CommandHeader,
    pub price: i64,
    pub conf: u64,
}

impl InitTestArgs {
    pub fn new(price: i64, conf: u64) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::InitTest),
            price,
            conf,
        }
    }
}
