//! Transaction decoding and validation.
//!
//! This module provides:
//! - The decoder boundary and the postcard decoder
//! - Capacity-checked field types
//! - The validated transaction model
//!
//! # Security
//!
//! All parsing happens on untrusted input. Parsers must:
//! - Check every length before storing a field
//! - Fail closed on any malformed data
//! - Never let an unvalidated value reach review

pub mod bounded;
pub mod decoder;
pub mod transaction;

pub use bounded::{BoundedBytes, BoundedString};
pub use decoder::{decode_combined, PostcardDecoder, RawPayload, RawTransaction, TransactionDecoder};
pub use transaction::{
    validate, CallPayload, CallRequest, DecodeType, ManageNeuron, NeuronCommand, NeuronOperation,
    ParsedTransaction, RequestType, SendRequest, StateReadRequest, Topic, Vote,
};
