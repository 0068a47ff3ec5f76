//! Unsigned transaction request as handed over by a chain client

use crate::constants::CIP64_TX_TYPE;
use crate::error::SignerError;
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction kinds this crate knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Legacy,
    Eip2930,
    Eip1559,
    /// Celo fee-currency transaction, encoded locally
    Cip64,
}

impl TxType {
    /// EIP-2718 type byte
    pub fn type_byte(self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Eip2930 => 1,
            Self::Eip1559 => 2,
            Self::Cip64 => CIP64_TX_TYPE,
        }
    }

    /// True for the kinds the custody service builds natively
    pub fn is_standard(self) -> bool {
        !matches!(self, Self::Cip64)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Legacy => "legacy",
            Self::Eip2930 => "eip2930",
            Self::Eip1559 => "eip1559",
            Self::Cip64 => "cip64",
        };
        f.write_str(name)
    }
}

impl FromStr for TxType {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "eip2930" => Ok(Self::Eip2930),
            "eip1559" => Ok(Self::Eip1559),
            "cip64" => Ok(Self::Cip64),
            other => Err(SignerError::UnsupportedTxType(other.to_string())),
        }
    }
}

impl TryFrom<u8> for TxType {
    type Error = SignerError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::Legacy),
            1 => Ok(Self::Eip2930),
            2 => Ok(Self::Eip1559),
            CIP64_TX_TYPE => Ok(Self::Cip64),
            other => Err(SignerError::UnsupportedTxType(format!("0x{other:02x}"))),
        }
    }
}

/// Unsigned transaction fields
///
/// Field order in the source (struct literal or JSON) never influences the
/// encoding; each encoder fixes its own order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    /// Explicit transaction kind (inferred from the fee fields when absent)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TxType>,
    /// Destination (None for contract creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Value in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    /// ERC-20 used to pay for gas (CIP-64)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_currency: Option<Address>,
}

impl UnsignedTx {
    /// Create a transaction to `to` with no value and no calldata
    pub fn new(to: Address) -> Self {
        Self {
            to: Some(to),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_gas_limit(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set both EIP-1559 fee fields
    pub fn with_fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn with_access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = Some(access_list);
        self
    }

    pub fn with_fee_currency(mut self, fee_currency: Address) -> Self {
        self.fee_currency = Some(fee_currency);
        self
    }

    /// The fee currency, if present and non-zero
    ///
    /// This is the only input that selects the CIP-64 signing path.
    pub fn fee_currency(&self) -> Option<Address> {
        self.fee_currency.filter(|addr| !addr.is_zero())
    }

    pub fn uses_fee_currency(&self) -> bool {
        self.fee_currency().is_some()
    }
}
