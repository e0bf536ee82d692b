use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    price_account: Pubkey,
    permissions_account: Option<Pubkey>,
    min_pub: u8,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(price_account, false),
        AccountMeta::new_readonly(permissions_account, false),
    ];

    simple_instruction(program_id, accounts, &SetMinPubArgs::new(min_pub))
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct SetMinPubArgs {
    pub header: CommandHeader,
    pub min_pub: u8,
    pub unused: [u8; 3],
}

impl SetMinPubArgs {
    pub fn new(min_pub: u8) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::SetMinPub),
            min_pub,
            unused: [0; 3],
        }
    }
}
