//! EIP-712 typed-data signing request

use crate::codec::{to_boundary_json, TypedValue};
use crate::error::{SignerError, SignerResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One member of an EIP-712 struct type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct type definitions keyed by type name
pub type TypedDataTypes = BTreeMap<String, Vec<TypedDataField>>;

/// A typed-data signing request; all four parts are required
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDataRequest {
    pub domain: TypedValue,
    pub types: TypedDataTypes,
    pub primary_type: String,
    pub message: TypedValue,
}

impl TypedDataRequest {
    pub fn new(
        domain: TypedValue,
        types: TypedDataTypes,
        primary_type: impl Into<String>,
        message: TypedValue,
    ) -> Self {
        Self {
            domain,
            types,
            primary_type: primary_type.into(),
            message,
        }
    }

    /// Parse a chain-client style `{domain, types, primaryType, message}` object
    ///
    /// A missing (or null) part is reported by name.
    pub fn from_json(value: &Value) -> SignerResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SignerError::invalid("typedData", "expected a JSON object"))?;

        let field = |name: &'static str| -> SignerResult<&Value> {
            match object.get(name) {
                None | Some(Value::Null) => Err(SignerError::MissingField(name)),
                Some(v) => Ok(v),
            }
        };

        let domain = field("domain")?;
        let types = field("types")?;
        let primary_type = field("primaryType")?;
        let message = field("message")?;

        let types: TypedDataTypes = serde_json::from_value(types.clone())
            .map_err(|e| SignerError::invalid("types", e.to_string()))?;
        let primary_type = primary_type
            .as_str()
            .ok_or_else(|| SignerError::invalid("primaryType", "expected a string"))?;

        let request = Self::new(
            TypedValue::from_json("domain", domain.clone())?,
            types,
            primary_type,
            TypedValue::from_json("message", message.clone())?,
        );
        request.validate()?;
        Ok(request)
    }

    /// Structural checks that do not need the remote signer
    pub fn validate(&self) -> SignerResult<()> {
        if self.primary_type.is_empty() {
            return Err(SignerError::MissingField("primaryType"));
        }
        if !self.types.contains_key(&self.primary_type) {
            return Err(SignerError::invalid(
                "primaryType",
                format!("`{}` is not defined in types", self.primary_type),
            ));
        }
        if !matches!(self.domain, TypedValue::Object(_)) {
            return Err(SignerError::invalid("domain", "expected an object"));
        }
        if !matches!(self.message, TypedValue::Object(_)) {
            return Err(SignerError::invalid("message", "expected an object"));
        }
        Ok(())
    }

    /// Domain with wide integers hex-encoded
    pub fn boundary_domain(&self) -> Value {
        to_boundary_json(&self.domain)
    }

    /// Message with wide integers hex-encoded
    pub fn boundary_message(&self) -> Value {
        to_boundary_json(&self.message)
    }
}
