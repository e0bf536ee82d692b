use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    price_account: Pubkey,
    permissions_account: Option<Pubkey>,
    publisher: Pubkey,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(price_account, true),
        AccountMeta::new(permissions_account, false),
    ];

    simple_instruction(program_id, accounts, &DelPublisherArgs::new(publisher))
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct DelPublisherArgs {
    pub header: CommandHeader,
    pub publisher: Pubkey,
}

impl DelPublisherArgs {
    pub fn new(publisher: Pubkey) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::DelPublisher),
            publisher,
        }
    }
}
