//! Wire records a transaction is serialized into.
//!
//! The host serializes an [`Envelope`] with postcard and streams the bytes
//! to the device in fragments. For `call` requests the `arg` field holds a
//! second postcard record whose type depends on the method name.
//!
//! These records carry no invariants of their own. The device decodes them
//! into its transaction model and validates every field there.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

pub const REQUEST_TYPE_CALL: &str = "call";
pub const REQUEST_TYPE_READ_STATE: &str = "read_state";

pub const METHOD_SEND: &str = "send_pb";
pub const METHOD_MANAGE_NEURON: &str = "manage_neuron_pb";
pub const METHOD_LIST_NEURONS: &str = "list_neurons_pb";
pub const METHOD_CLAIM_NEURONS: &str = "claim_neurons";

/// First lookup path component of a request status query.
pub const PATH_REQUEST_STATUS: &[u8] = b"request_status";

/// Outer request record.
///
/// `call` requests fill `canister_id`, `method_name` and `arg`;
/// `read_state` requests fill `paths`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub request_type: String,
    pub sender: Vec<u8>,
    pub ingress_expiry: u64,
    pub nonce: Option<Vec<u8>>,
    pub canister_id: Option<Vec<u8>>,
    pub method_name: Option<String>,
    pub arg: Option<Vec<u8>>,
    pub neuron_creation_memo: Option<u64>,
    pub paths: Vec<Vec<u8>>,
}

/// Ledger transfer arguments (`send_pb`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendArgs {
    pub memo: u64,
    pub amount_e8s: Option<u64>,
    pub fee_e8s: Option<u64>,
    pub from_subaccount: Option<Vec<u8>>,
    pub to: Vec<u8>,
    pub created_at_time: Option<u64>,
}

/// Governance command codes carried in [`ManageNeuronArgs::command`].
pub mod command {
    pub const INCREASE_DISSOLVE_DELAY: u32 = 1;
    pub const START_DISSOLVING: u32 = 2;
    pub const STOP_DISSOLVING: u32 = 3;
    pub const ADD_HOT_KEY: u32 = 4;
    pub const REMOVE_HOT_KEY: u32 = 5;
    pub const SET_DISSOLVE_TIMESTAMP: u32 = 6;
    pub const DISBURSE: u32 = 7;
    pub const SPAWN: u32 = 8;
    pub const REGISTER_VOTE: u32 = 9;
    pub const MERGE_MATURITY: u32 = 10;
    pub const FOLLOW: u32 = 11;
    pub const JOIN_COMMUNITY_FUND: u32 = 12;
}

/// Governance arguments (`manage_neuron_pb`).
///
/// One flat record for every command; `command` selects which of the
/// optional fields are meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManageNeuronArgs {
    pub neuron_id: Option<u64>,
    pub command: u32,
    /// Additional dissolve delay, or the dissolve timestamp.
    pub seconds: Option<u64>,
    /// Hot key, or new controller for spawn.
    pub principal: Option<Vec<u8>>,
    /// Disburse destination account.
    pub account: Option<Vec<u8>>,
    pub amount_e8s: Option<u64>,
    pub percentage: Option<u32>,
    pub proposal_id: Option<u64>,
    pub vote: Option<i32>,
    pub topic: Option<i32>,
    pub followees: Vec<u64>,
}

/// Governance query arguments (`list_neurons_pb`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListNeuronsArgs {
    pub neuron_ids: Vec<u64>,
    pub include_neurons_readable_by_caller: bool,
}

/// Genesis neuron claim (`claim_neurons`), no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimNeuronsArgs;

/// Payload of a combined sign: a call and the status query for it.
///
/// Both members are encoded [`Envelope`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombinedRequest {
    pub call: Vec<u8>,
    pub read_state: Vec<u8>,
}

/// Serializes a wire record.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(value)
}

/// Deserializes a wire record, rejecting trailing bytes.
pub fn from_bytes<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, postcard::Error> {
    let (value, rest) = postcard::take_from_bytes(bytes)?;
    if !rest.is_empty() {
        return Err(postcard::Error::DeserializeBadEncoding);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_send_args_encoding_is_compact() {
        let args = SendArgs {
            memo: 0,
            amount_e8s: Some(100_000_000),
            fee_e8s: Some(10_000),
            from_subaccount: None,
            to: vec![0xAB; 32],
            created_at_time: None,
        };
        let bytes = to_bytes(&args).unwrap();
        // memo(1) + amount(1+4) + fee(1+2) + subaccount(1) + to(1+32) + time(1)
        assert_eq!(bytes.len(), 44);
        assert_eq!(from_bytes::<SendArgs>(&bytes).unwrap(), args);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = to_bytes(&ListNeuronsArgs::default()).unwrap();
        assert!(from_bytes::<ListNeuronsArgs>(&bytes).is_ok());
        bytes.push(0);
        assert!(from_bytes::<ListNeuronsArgs>(&bytes).is_err());
    }

    #[test]
    fn test_claim_neurons_is_empty() {
        assert!(to_bytes(&ClaimNeuronsArgs).unwrap().is_empty());
    }
}
