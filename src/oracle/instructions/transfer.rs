use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, simple_instruction};

/// Moves lamports out of an account owned by this program. Distinct from
/// `solana_sdk::system_instruction::transfer`, which only moves lamports between
/// system-program-owned accounts.
pub fn instruction(
    program_id: Pubkey,
    from_account: Pubkey,
    to_account: Pubkey,
    amount_lamports: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(from_account, true),
        AccountMeta::new(to_account, false),
    ];

    simple_instruction(program_id, accounts, &TransferArgs::new(amount_lamports))
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct TransferArgs {
    pub header: CommandHeader,
    pub amount_lamports: u64,
}

impl TransferArgs {
    pub fn new(amount_lamports: u64) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::Transfer),
            amount_lamports,
        }
    }
}
