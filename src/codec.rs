//! Numeric boundary codec
//!
//! The custody API accepts JSON only. Integers wider than a JSON-safe number
//! (2^53 - 1) must cross the boundary as `0x`-prefixed lowercase hex strings,
//! wherever they sit inside a typed-data structure.

use crate::constants::MAX_SAFE_INTEGER;
use crate::error::{SignerError, SignerResult};
use alloy::primitives::{I256, U256};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A typed-data value: scalars, sequences and keyed maps
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    /// A JSON-safe number, passed through unchanged
    Number(Number),
    String(String),
    /// Unsigned integer of arbitrary width
    BigUint(U256),
    /// Signed integer of arbitrary width
    BigInt(I256),
    Array(Vec<TypedValue>),
    Object(BTreeMap<String, TypedValue>),
}

/// Convert a typed value into JSON that is safe to send to the custody API
pub fn to_boundary_json(value: &TypedValue) -> Value {
    match value {
        TypedValue::Null => Value::Null,
        TypedValue::Bool(b) => Value::Bool(*b),
        TypedValue::Number(n) => Value::Number(n.clone()),
        TypedValue::String(s) => Value::String(s.clone()),
        TypedValue::BigUint(n) => Value::String(format!("{n:#x}")),
        TypedValue::BigInt(n) => {
            let magnitude = n.unsigned_abs();
            if n.is_negative() {
                Value::String(format!("-{magnitude:#x}"))
            } else {
                Value::String(format!("{magnitude:#x}"))
            }
        }
        TypedValue::Array(items) => Value::Array(items.iter().map(to_boundary_json).collect()),
        TypedValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), to_boundary_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

impl TypedValue {
    /// Build an object from key/value pairs
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a key on an object value
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        match self {
            Self::Object(fields) => fields.get(key),
            _ => None,
        }
    }
}

impl TypedValue {
    /// Convert parsed JSON, promoting integers beyond the safe range
    ///
    /// serde_json parses integer literals wider than 64 bits as `f64`, so
    /// their exact value is already gone. Such numbers are rejected under
    /// `field` with the key path they sit at; wide values must arrive as
    /// decimal or hex strings instead.
    pub fn from_json(field: &'static str, value: Value) -> SignerResult<Self> {
        Self::convert(field, value, &mut String::new())
    }

    fn convert(field: &'static str, value: Value, path: &mut String) -> SignerResult<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    if u > MAX_SAFE_INTEGER {
                        return Ok(Self::BigUint(U256::from(u)));
                    }
                } else if let Some(i) = n.as_i64() {
                    if i.unsigned_abs() > MAX_SAFE_INTEGER {
                        return Ok(Self::BigInt(I256::try_from(i).unwrap_or(I256::MIN)));
                    }
                } else if n.as_f64().is_some_and(|f| f.abs() > MAX_SAFE_INTEGER as f64) {
                    let at = if path.is_empty() { "<root>" } else { path.as_str() };
                    return Err(SignerError::invalid(
                        field,
                        format!("number {n} at `{at}` is not exactly representable, pass it as a string"),
                    ));
                }
                Self::Number(n)
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let len = path.len();
                    path.push_str(&format!("[{i}]"));
                    out.push(Self::convert(field, item, path)?);
                    path.truncate(len);
                }
                Self::Array(out)
            }
            Value::Object(fields) => {
                let mut out = BTreeMap::new();
                for (key, item) in fields {
                    let len = path.len();
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(&key);
                    let converted = Self::convert(field, item, path)?;
                    path.truncate(len);
                    out.insert(key, converted);
                }
                Self::Object(out)
            }
        })
    }
}

impl TryFrom<Value> for TypedValue {
    type Error = SignerError;

    fn try_from(value: Value) -> SignerResult<Self> {
        Self::from_json("value", value)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u64> for TypedValue {
    fn from(n: u64) -> Self {
        if n > MAX_SAFE_INTEGER {
            Self::BigUint(U256::from(n))
        } else {
            Self::Number(n.into())
        }
    }
}

impl From<U256> for TypedValue {
    fn from(n: U256) -> Self {
        Self::BigUint(n)
    }
}

impl From<I256> for TypedValue {
    fn from(n: I256) -> Self {
        Self::BigInt(n)
    }
}

impl From<alloy::primitives::Address> for TypedValue {
    fn from(address: alloy::primitives::Address) -> Self {
        Self::String(address.to_checksum(None))
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(items: Vec<TypedValue>) -> Self {
        Self::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_wide_value_is_the_only_conversion() {
        let wide = U256::from(MAX_SAFE_INTEGER) + U256::from(1u64);
        let value = TypedValue::object([(
            "outer",
            TypedValue::Array(vec![TypedValue::object([
                (
                    "inner",
                    TypedValue::Array(vec![TypedValue::BigUint(wide), TypedValue::from("keep")]),
                ),
                ("flag", TypedValue::Bool(true)),
                ("label", TypedValue::from("0x1234")),
            ])]),
        )]);

        let out = to_boundary_json(&value);
        assert_eq!(
            out,
            json!({
                "outer": [{
                    "inner": ["0x20000000000000", "keep"],
                    "flag": true,
                    "label": "0x1234"
                }]
            })
        );
    }

    #[test]
    fn test_wide_integers_are_lowercase_hex() {
        let v = TypedValue::BigUint(U256::from(0xABCDEFu64));
        assert_eq!(to_boundary_json(&v), json!("0xabcdef"));
        assert_eq!(to_boundary_json(&TypedValue::BigUint(U256::ZERO)), json!("0x0"));

        let neg = TypedValue::BigInt(I256::try_from(-255i64).unwrap());
        assert_eq!(to_boundary_json(&neg), json!("-0xff"));
    }

    #[test]
    fn test_safe_numbers_pass_through() {
        let v = TypedValue::try_from(json!({"amount": 42, "ratio": 0.5, "none": null})).unwrap();
        assert_eq!(
            to_boundary_json(&v),
            json!({"amount": 42, "ratio": 0.5, "none": null})
        );
    }

    #[test]
    fn test_json_input_promotes_unsafe_integers() {
        let v = TypedValue::try_from(json!({"deadline": 9_007_199_254_740_993u64, "n": -9_007_199_254_740_993i64}))
            .unwrap();
        assert_eq!(
            v.get("deadline"),
            Some(&TypedValue::BigUint(U256::from(9_007_199_254_740_993u64)))
        );
        assert_eq!(
            to_boundary_json(&v),
            json!({"deadline": "0x20000000000001", "n": "-0x20000000000001"})
        );
    }

    #[test]
    fn test_max_safe_integer_stays_a_number() {
        let v = TypedValue::from(MAX_SAFE_INTEGER);
        assert_eq!(to_boundary_json(&v), json!(MAX_SAFE_INTEGER));
        let v = TypedValue::from(MAX_SAFE_INTEGER + 1);
        assert_eq!(to_boundary_json(&v), json!("0x20000000000000"));
    }

    #[test]
    fn test_integers_wider_than_u64_are_rejected() {
        let parsed: Value = serde_json::from_str(
            r#"{"order": {"amounts": [1, 1000000000000000000000000000000]}, "w": 1}"#,
        )
        .unwrap();
        let err = TypedValue::from_json("message", parsed).unwrap_err();
        match err {
            SignerError::InvalidField { field, reason } => {
                assert_eq!(field, "message");
                assert!(reason.contains("order.amounts[1]"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let parsed: Value = serde_json::from_str(r#"{"w": 18446744073709551616}"#).unwrap();
        assert!(TypedValue::try_from(parsed).is_err());
    }

    #[test]
    fn test_large_floats_are_rejected() {
        assert!(TypedValue::try_from(json!({"x": 9.1e15})).is_err());
        assert!(TypedValue::try_from(json!([-1.0e20])).is_err());
        assert!(TypedValue::try_from(json!({"x": 12.5})).is_ok());
    }

    #[test]
    fn test_u64_max_is_promoted() {
        let parsed: Value = serde_json::from_str(r#"{"v": 18446744073709551615}"#).unwrap();
        let v = TypedValue::try_from(parsed).unwrap();
        assert_eq!(to_boundary_json(&v), json!({"v": "0xffffffffffffffff"}));
    }
}
