pub use super::init_test::InitTestArgs as UpdTestArgs;

use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, compute_permissions_account, simple_instruction};

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

    let header = CommandHeader::new(OracleCommand::UpdTest);
    simple_instruction(program_id, accounts, &super::init_test::InitTestArgs { header, price, conf })
}
