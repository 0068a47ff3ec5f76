//! Adapter for the custody service's native transaction builder
//!
//! Legacy, EIP-2930 and EIP-1559 transactions are built and signed remotely.
//! This module only renames fields, hex-encodes quantities and drops absent
//! fields; the signed bytes come back from the signer untouched.

use crate::error::{SignerError, SignerResult};
use crate::types::{TxType, UnsignedTx};
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Address, Bytes, U128, U256, U64};
use serde::{Deserialize, Serialize};

/// Transaction fields in the shape `eth_signTransaction` expects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardTxFields {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
}

/// Work out which standard kind a request describes
///
/// An explicit type wins; otherwise `gasPrice` means legacy (or EIP-2930
/// with an access list) and the 1559 fee fields mean EIP-1559. With neither,
/// the signer's own default applies.
pub fn resolve_standard_type(tx: &UnsignedTx) -> SignerResult<Option<TxType>> {
    let has_1559_fees = tx.max_fee_per_gas.is_some() || tx.max_priority_fee_per_gas.is_some();

    let resolved = match tx.tx_type {
        Some(kind) if !kind.is_standard() => {
            return Err(SignerError::invalid(
                "type",
                "cip64 transactions require a non-zero feeCurrency",
            ))
        }
        Some(explicit) => Some(explicit),
        None if tx.gas_price.is_some() && tx.access_list.is_some() => Some(TxType::Eip2930),
        None if tx.gas_price.is_some() => Some(TxType::Legacy),
        None if has_1559_fees => Some(TxType::Eip1559),
        None => None,
    };

    match resolved {
        Some(TxType::Legacy | TxType::Eip2930) if has_1559_fees => Err(SignerError::invalid(
            "maxFeePerGas",
            "fee-market fields on a gasPrice transaction",
        )),
        Some(TxType::Eip1559) if tx.gas_price.is_some() => Err(SignerError::invalid(
            "gasPrice",
            "gasPrice on an eip1559 transaction",
        )),
        Some(TxType::Legacy) if tx.access_list.is_some() => Err(SignerError::invalid(
            "accessList",
            "legacy transactions cannot carry an access list",
        )),
        _ => Ok(resolved),
    }
}

impl TryFrom<&UnsignedTx> for StandardTxFields {
    type Error = SignerError;

    fn try_from(tx: &UnsignedTx) -> SignerResult<Self> {
        let tx_type = resolve_standard_type(tx)?;

        Ok(Self {
            tx_type: tx_type.map(TxType::type_byte),
            to: tx.to,
            nonce: tx.nonce.map(U64::from),
            chain_id: tx.chain_id.map(U64::from),
            data: tx.data.clone(),
            value: tx.value,
            gas_limit: tx.gas.map(U64::from),
            gas_price: tx.gas_price.map(U128::from),
            max_fee_per_gas: tx.max_fee_per_gas.map(U128::from),
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas.map(U128::from),
            access_list: tx.access_list.clone(),
        })
    }
}
