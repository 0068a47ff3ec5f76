//! Celo CIP-64 fee-currency transaction (type `0x7b`)
//!
//! The custody service cannot build this transaction, so it is encoded here
//! and only its signing hash leaves the process:
//!
//! ```text
//! unsigned: 0x7b || rlp([chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit,
//!                        to, value, data, accessList, feeCurrency])
//! signed:   0x7b || rlp([...unsigned fields, yParity, r, s])
//! ```
//!
//! Both forms go through [`Cip64Transaction::encode_with`], so the field order
//! is written down exactly once.

use crate::constants::CIP64_TX_TYPE;
use crate::error::{SignerError, SignerResult};
use crate::signature::DecodedSignature;
use crate::types::{TxType, UnsignedTx};
use alloy::eips::eip2930::AccessList;
use alloy::primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy::rlp::{BufMut, Decodable, Encodable, Header};

/// A fully specified CIP-64 transaction, ready to hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cip64Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub access_list: AccessList,
    pub fee_currency: Address,
}

impl TryFrom<&UnsignedTx> for Cip64Transaction {
    type Error = SignerError;

    fn try_from(tx: &UnsignedTx) -> SignerResult<Self> {
        let fee_currency = tx
            .fee_currency()
            .ok_or(SignerError::MissingField("feeCurrency"))?;

        if let Some(tx_type @ (TxType::Legacy | TxType::Eip2930)) = tx.tx_type {
            return Err(SignerError::invalid(
                "type",
                format!("fee currency requires a fee-market transaction, got {tx_type}"),
            ));
        }
        if tx.gas_price.is_some() {
            return Err(SignerError::invalid(
                "gasPrice",
                "not supported by fee-currency transactions, use maxFeePerGas",
            ));
        }

        let max_fee_per_gas = tx
            .max_fee_per_gas
            .ok_or(SignerError::MissingField("maxFeePerGas"))?;
        let max_priority_fee_per_gas = tx
            .max_priority_fee_per_gas
            .ok_or(SignerError::MissingField("maxPriorityFeePerGas"))?;
        if max_priority_fee_per_gas > max_fee_per_gas {
            return Err(SignerError::invalid(
                "maxPriorityFeePerGas",
                format!(
                    "{} exceeds maxFeePerGas {}",
                    max_priority_fee_per_gas, max_fee_per_gas
                ),
            ));
        }

        Ok(Self {
            chain_id: tx.chain_id.ok_or(SignerError::MissingField("chainId"))?,
            nonce: tx.nonce.ok_or(SignerError::MissingField("nonce"))?,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit: tx.gas.ok_or(SignerError::MissingField("gas"))?,
            to: TxKind::from(tx.to),
            value: tx.value.unwrap_or_default(),
            input: tx.data.clone().unwrap_or_default(),
            access_list: tx.access_list.clone().unwrap_or_default(),
            fee_currency,
        })
    }
}

impl Cip64Transaction {
    fn fields_len(&self) -> usize {
        self.chain_id.length()
            + self.nonce.length()
            + self.max_priority_fee_per_gas.length()
            + self.max_fee_per_gas.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.input.length()
            + self.access_list.length()
            + self.fee_currency.length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.max_priority_fee_per_gas.encode(out);
        self.max_fee_per_gas.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.input.encode(out);
        self.access_list.encode(out);
        self.fee_currency.encode(out);
    }

    /// Typed envelope with or without the signature triple appended
    fn encode_with(&self, signature: Option<&DecodedSignature>) -> Bytes {
        let mut payload_length = self.fields_len();
        if let Some(sig) = signature {
            payload_length +=
                sig.y_parity.length() + sig.r_u256().length() + sig.s_u256().length();
        }
        let header = Header {
            list: true,
            payload_length,
        };

        let mut out = Vec::with_capacity(1 + header.length() + payload_length);
        out.put_u8(CIP64_TX_TYPE);
        header.encode(&mut out);
        self.encode_fields(&mut out);
        if let Some(sig) = signature {
            sig.y_parity.encode(&mut out);
            sig.r_u256().encode(&mut out);
            sig.s_u256().encode(&mut out);
        }
        out.into()
    }

    /// Canonical unsigned encoding (the signing preimage)
    pub fn encoded_for_signing(&self) -> Bytes {
        self.encode_with(None)
    }

    /// Keccak-256 of the unsigned encoding; the only thing sent to the signer
    pub fn signature_hash(&self) -> B256 {
        keccak256(self.encoded_for_signing())
    }

    /// Broadcastable encoding with `(yParity, r, s)` appended
    pub fn encode_signed(&self, signature: &DecodedSignature) -> Bytes {
        self.encode_with(Some(signature))
    }

    /// Hash of the signed encoding, as reported by block explorers
    pub fn tx_hash(&self, signature: &DecodedSignature) -> B256 {
        keccak256(self.encode_signed(signature))
    }

    /// Parse a signed CIP-64 envelope
    pub fn decode_signed(bytes: &[u8]) -> SignerResult<(Self, DecodedSignature)> {
        let (type_byte, mut buf) = bytes
            .split_first()
            .ok_or_else(|| SignerError::invalid("transaction", "empty input"))?;
        if *type_byte != CIP64_TX_TYPE {
            return Err(SignerError::UnsupportedTxType(format!("0x{type_byte:02x}")));
        }

        let header = Header::decode(&mut buf).map_err(rlp_error)?;
        if !header.list {
            return Err(SignerError::invalid("transaction", "expected an RLP list"));
        }
        let remaining = buf.len();
        if header.payload_length != remaining {
            return Err(SignerError::invalid(
                "transaction",
                format!(
                    "payload length {} does not match {} remaining bytes",
                    header.payload_length, remaining
                ),
            ));
        }

        let tx = Self {
            chain_id: Decodable::decode(&mut buf).map_err(rlp_error)?,
            nonce: Decodable::decode(&mut buf).map_err(rlp_error)?,
            max_priority_fee_per_gas: Decodable::decode(&mut buf).map_err(rlp_error)?,
            max_fee_per_gas: Decodable::decode(&mut buf).map_err(rlp_error)?,
            gas_limit: Decodable::decode(&mut buf).map_err(rlp_error)?,
            to: Decodable::decode(&mut buf).map_err(rlp_error)?,
            value: Decodable::decode(&mut buf).map_err(rlp_error)?,
            input: Decodable::decode(&mut buf).map_err(rlp_error)?,
            access_list: Decodable::decode(&mut buf).map_err(rlp_error)?,
            fee_currency: Decodable::decode(&mut buf).map_err(rlp_error)?,
        };
        let y_parity: bool = Decodable::decode(&mut buf).map_err(rlp_error)?;
        let r: U256 = Decodable::decode(&mut buf).map_err(rlp_error)?;
        let s: U256 = Decodable::decode(&mut buf).map_err(rlp_error)?;

        if !buf.is_empty() {
            return Err(SignerError::invalid(
                "transaction",
                format!("{} trailing bytes", buf.len()),
            ));
        }

        Ok((tx, DecodedSignature::from_parts(r, s, y_parity)))
    }

    /// Recover the sender of a signed CIP-64 envelope
    pub fn recover_signer(bytes: &[u8]) -> SignerResult<Address> {
        let (tx, signature) = Self::decode_signed(bytes)?;
        signature.recover_address(&tx.signature_hash())
    }
}

fn rlp_error(err: alloy::rlp::Error) -> SignerError {
    SignerError::invalid("transaction", format!("rlp: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::decode_signature;
    use alloy::hex;
    use alloy::primitives::address;

    const UNSIGNED: &str = "7bf84782a4ec80843b9aca008506fc23ac0082520894aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa880de0b6b3a764000080c094bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const SIGNED: &str = "7bf88a82a4ec80843b9aca008506fc23ac0082520894aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa880de0b6b3a764000080c094bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb80a01111111111111111111111111111111111111111111111111111111111111111a02222222222222222222222222222222222222222222222222222222222222222";

    fn sample() -> UnsignedTx {
        UnsignedTx::new(address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"))
            .with_chain_id(42220)
            .with_nonce(0)
            .with_fees(30_000_000_000, 1_000_000_000)
            .with_gas_limit(21_000)
            .with_value(U256::from(1_000_000_000_000_000_000u64))
            .with_fee_currency(address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"))
    }

    fn sig27() -> DecodedSignature {
        decode_signature(&format!("0x{}{}1b", "11".repeat(32), "22".repeat(32))).unwrap()
    }

    #[test]
    fn test_unsigned_encoding_vector() {
        let tx = Cip64Transaction::try_from(&sample()).unwrap();
        assert_eq!(hex::encode(tx.encoded_for_signing()), UNSIGNED);
        assert_eq!(
            tx.signature_hash(),
            keccak256(hex::decode(UNSIGNED).unwrap())
        );
    }

    #[test]
    fn test_signed_encoding_vector() {
        let tx = Cip64Transaction::try_from(&sample()).unwrap();
        assert_eq!(hex::encode(tx.encode_signed(&sig27())), SIGNED);
        assert_eq!(
            tx.tx_hash(&sig27()),
            keccak256(hex::decode(SIGNED).unwrap())
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let tx = Cip64Transaction::try_from(&sample()).unwrap();
        assert_eq!(tx.encoded_for_signing(), tx.encoded_for_signing());

        let a: UnsignedTx = serde_json::from_str(
            r#"{"to":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","chainId":42220,"nonce":0,
                "gas":21000,"maxFeePerGas":30000000000,"maxPriorityFeePerGas":1000000000,
                "value":"0xde0b6b3a7640000","feeCurrency":"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"}"#,
        )
        .unwrap();
        let b: UnsignedTx = serde_json::from_str(
            r#"{"feeCurrency":"0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb","value":"0xde0b6b3a7640000",
                "maxPriorityFeePerGas":1000000000,"maxFeePerGas":30000000000,"gas":21000,
                "nonce":0,"chainId":42220,"to":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"}"#,
        )
        .unwrap();
        let a = Cip64Transaction::try_from(&a).unwrap();
        let b = Cip64Transaction::try_from(&b).unwrap();
        assert_eq!(a.encoded_for_signing(), b.encoded_for_signing());
        assert_eq!(hex::encode(a.encoded_for_signing()), UNSIGNED);
    }

    #[test]
    fn test_signed_round_trip_reproduces_preimage() {
        let tx = Cip64Transaction::try_from(&sample()).unwrap();
        let signed = tx.encode_signed(&sig27());

        let (decoded, sig) = Cip64Transaction::decode_signed(&signed).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(sig.r, B256::repeat_byte(0x11));
        assert_eq!(sig.s, B256::repeat_byte(0x22));
        assert_eq!(sig.y_parity, 0);
        assert_eq!(decoded.encoded_for_signing(), tx.encoded_for_signing());
    }

    #[test]
    fn test_contract_creation_and_calldata() {
        let mut unsigned = sample().with_data(vec![0x60, 0x80, 0x60, 0x40]);
        unsigned.to = None;
        let tx = Cip64Transaction::try_from(&unsigned).unwrap();
        assert_eq!(tx.to, TxKind::Create);
        let (decoded, _) = Cip64Transaction::decode_signed(&tx.encode_signed(&sig27())).unwrap();
        assert_eq!(decoded.to, TxKind::Create);
        assert_eq!(decoded.input, Bytes::from(vec![0x60, 0x80, 0x60, 0x40]));
    }

    #[test]
    fn test_missing_fields_are_named() {
        let cases: [(fn(&mut UnsignedTx), &str); 5] = [
            (|tx| tx.chain_id = None, "chainId"),
            (|tx| tx.nonce = None, "nonce"),
            (|tx| tx.gas = None, "gas"),
            (|tx| tx.max_fee_per_gas = None, "maxFeePerGas"),
            (|tx| tx.max_priority_fee_per_gas = None, "maxPriorityFeePerGas"),
        ];
        for (strip, name) in cases {
            let mut tx = sample();
            strip(&mut tx);
            match Cip64Transaction::try_from(&tx) {
                Err(SignerError::MissingField(missing)) => assert_eq!(missing, name),
                other => panic!("{name}: expected MissingField, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_incompatible_fee_fields() {
        let tx = sample().with_gas_price(1);
        assert!(matches!(
            Cip64Transaction::try_from(&tx),
            Err(SignerError::InvalidField { field: "gasPrice", .. })
        ));

        let tx = sample().with_fees(1, 2);
        assert!(matches!(
            Cip64Transaction::try_from(&tx),
            Err(SignerError::InvalidField { field: "maxPriorityFeePerGas", .. })
        ));

        let tx = sample().with_type(TxType::Legacy);
        assert!(matches!(
            Cip64Transaction::try_from(&tx),
            Err(SignerError::InvalidField { field: "type", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_other_envelopes() {
        let mut bytes = hex::decode(SIGNED).unwrap();
        bytes[0] = 0x02;
        assert!(matches!(
            Cip64Transaction::decode_signed(&bytes),
            Err(SignerError::UnsupportedTxType(_))
        ));

        let bytes = hex::decode(UNSIGNED).unwrap();
        assert!(Cip64Transaction::decode_signed(&bytes).is_err());
        assert!(Cip64Transaction::decode_signed(&[]).is_err());
    }
}
