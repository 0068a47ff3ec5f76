//! Request and record types shared across the crate

pub mod message;
pub mod transaction;
pub mod typed_data;
pub mod wallet;

pub use message::{MessageBody, SignableMessage};
pub use transaction::{TxType, UnsignedTx};
pub use typed_data::{TypedDataField, TypedDataRequest, TypedDataTypes};
pub use wallet::{ChainKind, Wallet};
