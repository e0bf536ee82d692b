//! Instruction builders for the on-chain Oracle program.
//!
//! `pyth-oracle` does not export data structures that describe the instruction accounts or
//! arguments, so the command header and per-command argument layouts are hand copied from the
//! deployed program's account/instruction conventions (same approach the `add_price`/`add_product`/
//! `add_publisher`/`init_mapping` builders already took).

use bytemuck::{Pod, Zeroable, bytes_of};
use solana_program::{instruction::AccountMeta, instruction::Instruction, pubkey::Pubkey};

pub mod add_mapping;
pub mod add_price;
pub mod add_product;
pub mod add_publisher;
pub mod del_publisher;
pub mod init_mapping;
pub mod init_price;
pub mod init_test;
pub mod set_min_pub;
pub mod transfer;
pub mod upd_price;
pub mod upd_product;
pub mod upd_test;

pub const PC_VERSION: u32 = 2;

/// The full set of commands the core publisher daemon needs to be able to emit. Every instruction
/// the supervisor's composite requests (see `crate::request::ops`) or the publish path
/// (`crate::publish`) builds goes through one of these.
#[repr(i32)]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum OracleCommand {
    /// Initialize the first mapping list account.
    InitMapping = 0,
    /// Add a new mapping account to the end of the mapping chain.
    AddMapping = 1,
    /// Add a product account to a mapping account.
    AddProduct = 2,
    /// Update a product account's attribute dictionary.
    UpdProduct = 3,
    /// Add a new price account to a product account.
    AddPrice = 4,
    /// Initialize a price account's header (used when chaining multiple price types).
    InitPrice = 5,
    /// Add a publisher to a price account's component list.
    AddPublisher = 6,
    /// Remove a publisher from a price account's component list.
    DelPublisher = 7,
    /// Publish a new component quote. This is the only command the publish path emits on
    /// the steady-state hot path; every other command is part of the one-time composite
    /// create/init chains.
    UpdPrice = 8,
    /// Seed a price account with test data (staging clusters only).
    InitTest = 9,
    /// Overwrite a price account's test data (staging clusters only).
    UpdTest = 10,
    /// Update the minimum publisher quorum for aggregation.
    SetMinPub = 11,
    /// Transfer lamports out of a funding account owned by this program.
    Transfer = 12,
}

#[repr(C)]
#[derive(Zeroable, Pod, Copy, Clone)]
pub struct CommandHeader {
    pub version: u32,
    pub command: i32,
}

impl CommandHeader {
    pub fn new(command: OracleCommand) -> Self {
        Self {
            version: PC_VERSION,
            command: command as i32,
        }
    }
}

pub(crate) fn compute_permissions_account(
    program_id: Pubkey,
    permissions_account: Option<Pubkey>,
) -> Pubkey {
    permissions_account
        .unwrap_or_else(|| Pubkey::find_program_address(&[b"permissions"], &program_id).0)
}

pub(crate) fn simple_instruction<Args: Pod>(
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    args: &Args,
) -> Instruction {
    Instruction {
        program_id,
        accounts,
        data: bytes_of(args).to_owned(),
    }
}
