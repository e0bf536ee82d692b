use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

// `<MappingAccount as PythAccount>::MINIMUM_SIZE` is 20536, which is 56 + 640 * 32. 640 is
// `PC_MAP_TABLE_SIZE` in the Oracle code.
pub const ACCOUNT_MIN_SIZE: u64 = 20536;
pub const PC_MAP_TABLE_SIZE: usize = 640;

pub fn instruction(
    program_id: Pubkey,
    funding_account: Pubkey,
    new_mapping_account: Pubkey,
    permissions_account: Option<Pubkey>,
) -> Instruction {
    let permissions_account = compute_permissions_account(program_id, permissions_account);

    let accounts = vec![
        AccountMeta::new(funding_account, true),
        AccountMeta::new(new_mapping_account, true),
        AccountMeta::new_readonly(permissions_account, false),
    ];

    simple_instruction(program_id, accounts, &InitMappingArgs::new())
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct InitMappingArgs {
    pub header: CommandHeader,
}

impl InitMappingArgs {
    pub fn new() -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::InitMapping),
        }
    }
}

impl Default for InitMappingArgs {
    fn default() -> Self {
        Self::new()
    }
}
