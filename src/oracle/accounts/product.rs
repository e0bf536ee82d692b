//! Describes a `product` account of the Oracle program.
//!
//! The fixed-size part is a [`ProductAccountHeader`]; it is followed by a flat attribute
//! dictionary encoded as Pascal-style (single length-byte prefixed) key/value byte string pairs,
//! running up to `header.header.size` bytes into the account (`pc::pc_prod_t` in
//! `examples/original_source/pc/misc.hpp`'s sibling `manager.cpp`).

use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;

use crate::error::CoreError;

use super::AccountHeader;

/// `PC_PROD_ACC_SIZE` in the Oracle code: the minimum account size, header plus attribute area.
pub const ACCOUNT_MIN_SIZE: u64 = 512;

/// Required attribute key every product account must carry.
pub const SYMBOL_ATTR_KEY: &str = "symbol";

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ProductAccountHeader {
    pub header: AccountHeader,
    /// First price account for this product, or the zero pubkey if none have been added yet.
    pub first_price_account: Pubkey,
}

/// Parses the Pascal-string attribute dictionary that trails a product account's fixed header.
///
/// Rejects on a truncated string or a length field that would
/// read past `data`.
pub fn parse_attributes(data: &[u8]) -> Result<Vec<(String, String)>, CoreError> {
    let mut attrs = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let (key, next) = read_pascal_string(data, pos)?;
        if key.is_empty() && next == pos {
            break;
        }
        let (value, next) = read_pascal_string(data, next)?;
        attrs.push((key, value));
        pos = next;
    }

    Ok(attrs)
}

fn read_pascal_string(data: &[u8], pos: usize) -> Result<(String, usize), CoreError> {
    let Some(&len) = data.get(pos) else {
        return Ok((String::new(), pos));
    };
    let len = len as usize;
    let start = pos + 1;
    let end = start + len;
    let bytes = data
        .get(start..end)
        .ok_or_else(|| CoreError::integrity("attribute string length exceeds account bounds"))?;
    let s = std::str::from_utf8(bytes)
        .map_err(|_| CoreError::integrity("attribute string is not valid utf-8"))?
        .to_owned();
    Ok((s, end))
}

/// Finds the `symbol` attribute, which every product is required to carry.
pub fn find_symbol(attrs: &[(String, String)]) -> Option<&str> {
    attrs
        .iter()
        .find(|(key, _)| key == SYMBOL_ATTR_KEY)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        for (k, v) in pairs {
            out.push(k.len() as u8);
            out.extend(k.as_bytes());
            out.push(v.len() as u8);
            out.extend(v.as_bytes());
        }
        out
    }

    #[test]
    fn parses_well_formed_attributes() {
        let data = encode(&[("symbol", "BTC/USD"), ("asset_type", "Crypto")]);
        let attrs = parse_attributes(&data).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(find_symbol(&attrs), Some("BTC/USD"));
    }

    #[test]
    fn rejects_truncated_value() {
        let mut data = encode(&[("symbol", "BTC/USD")]);
        data.truncate(data.len() - 3);
        assert!(parse_attributes(&data).is_err());
    }

    #[test]
    fn missing_symbol_is_reported_absent_not_an_error() {
        let data = encode(&[("asset_type", "Crypto")]);
        let attrs = parse_attributes(&data).unwrap();
        assert_eq!(find_symbol(&attrs), None);
    }
}
