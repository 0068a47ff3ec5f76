//! Transaction encoders for the two signing paths
//!
//! - [`cip64`]: fee-currency transactions, encoded and hashed locally
//! - [`standard`]: legacy / EIP-2930 / EIP-1559, built by the custody service

pub mod cip64;
pub mod standard;

pub use cip64::Cip64Transaction;
pub use standard::{resolve_standard_type, StandardTxFields};
