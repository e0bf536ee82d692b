use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

pub use super::init_mapping::ACCOUNT_MIN_SIZE;

/// Chains a brand new mapping account onto the last mapping account of an existing chain.
///
/// `cur_mapping_account` must have `next_mapping_account == 0`; the program rewrites that field to
/// point at `new_mapping_account` once the instruction lands.
pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    cur_mapping_account: Pubkey,
    new_mapping_account: Pubkey,
    permissions_account: Option<Pubkey>,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(cur_mapping_account, true),
        AccountMeta::new(new_mapping_account, true),
        AccountMeta::new_readonly(permissions_account, false),
    ];

    simple_instruction(program_id, accounts, &AddMappingArgs::new())
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct AddMappingArgs {
    pub header: CommandHeader,
}

impl AddMappingArgs {
    pub fn new() -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::AddMapping),
        }
    }
}

impl Default for AddMappingArgs {
    fn default() -> Self {
        Self::new()
    }
}
