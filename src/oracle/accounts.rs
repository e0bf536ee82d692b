//! Describes accounts of the Oracle program.

use bytemuck::{Pod, Zeroable};

pub mod mapping;
pub mod price;
pub mod product;

/// `PC_MAGIC` in the Oracle code. Every account owned by this program starts with a header
/// carrying this value; anything else means the bytes are not ours to interpret.
pub const PC_MAGIC: u32 = 0xa1b2c3d4;
/// `PC_VERSION` in the Oracle code, matching `crate::oracle::instructions::PC_VERSION`.
pub const PC_VERSION: u32 = 2;

/// `account_type` discriminants, i.e. `PC_ACCTYPE_*` in the Oracle code.
pub const PC_ACCTYPE_MAPPING: u32 = 1;
pub const PC_ACCTYPE_PRODUCT: u32 = 2;
pub const PC_ACCTYPE_PRICE: u32 = 3;

#[repr(C)]
#[derive(Copy, Clone, Zeroable, Pod)]
pub struct AccountHeader {
    pub magic_number: u32,
    pub version: u32,
    pub account_type: u32,
    pub size: u32,
}

impl AccountHeader {
    /// Checks the header against the expected magic, version and account type, per the
    /// "Deserialization policy": reject on magic mismatch, version mismatch, or an unexpected
    /// account type.
    pub fn check(&self, expected_account_type: u32) -> Result<(), crate::error::CoreError> {
        if self.magic_number != PC_MAGIC {
            return Err(crate::error::CoreError::integrity(format!(
                "bad magic number: {:#x}",
                self.magic_number
            )));
        }
        if self.version != PC_VERSION {
            return Err(crate::error::CoreError::integrity(format!(
                "unsupported account version: {}",
                self.version
            )));
        }
        if self.account_type != expected_account_type {
            return Err(crate::error::CoreError::integrity(format!(
                "unexpected account type: {} (expected {expected_account_type})",
                self.account_type
            )));
        }
        Ok(())
    }
}
