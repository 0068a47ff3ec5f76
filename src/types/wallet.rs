//! Custody wallet records

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Chain family of a custody wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainKind {
    Ethereum,
    Solana,
}

/// A custody wallet: the id used to address the signing API and its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub address: Address,
    #[serde(default = "default_chain")]
    pub chain_type: ChainKind,
}

fn default_chain() -> ChainKind {
    ChainKind::Ethereum
}
