//! Account layouts and instruction builders for the Oracle program.

pub mod accounts;
pub mod instructions;
