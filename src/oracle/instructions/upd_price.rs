use bytemuck::{Pod, Zeroable};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

use super::{CommandHeader, OracleCommand, simple_instruction};

/// `PC_STATUS_UNKNOWN` in the Oracle code.
pub const PC_STATUS_UNKNOWN: u32 = 0;
/// `PC_STATUS_TRADING` in the Oracle code.
pub const PC_STATUS_TRADING: u32 = 1;
/// `PC_STATUS_HALTED` in the Oracle code.
pub const PC_STATUS_HALTED: u32 = 2;
/// `PC_STATUS_AUCTION` in the Oracle code.
pub const PC_STATUS_AUCTION: u32 = 3;
/// `PC_STATUS_IGNORED` in the Oracle code.
pub const PC_STATUS_IGNORED: u32 = 4;

/// Builds the single transaction every publish-path tick emits: a new
/// `(price, conf, status)` component quote, signed by the publisher whose component slot is being
/// overwritten.
///
/// `pub_slot` is the slot the publisher observed when it decided on this price; the program uses it
/// to detect stale or out-of-order updates.
pub fn instruction(
    program_id: Pubkey,
    publisher: Pubkey,
    price_account: Pubkey,
    price: i64,
    conf: u64,
    status: u32,
    pub_slot: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(publisher, true),
        AccountMeta::new(price_account, false),
    ];

    simple_instruction(
        program_id,
        accounts,
        &UpdPriceArgs::new(price, conf, status, pub_slot),
    )
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone, Debug, PartialEq, Eq)]
pub struct UpdPriceArgs {
    pub header: CommandHeader,
    pub status: u32,
    /// Padding to keep `price`/`conf` 8-byte aligned; unused by the program.
    pub unused: u32,
    pub price: i64,
    pub conf: u64,
    pub pub_slot: u64,
}

impl UpdPriceArgs {
    pub fn new(price: i64, conf: u64, status: u32, pub_slot: u64) -> Self {
        Self {
            header: CommandHeader::new(OracleCommand::UpdPrice),
            status,
            unused: 0,
            price,
            conf,
            pub_slot,
        }
    }
}
