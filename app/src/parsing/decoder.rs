//! Transaction decoding.
//!
//! A [`TransactionDecoder`] turns the assembled bytes into a
//! [`RawTransaction`]: the fields as found on the wire, nothing checked
//! beyond what the encoding itself guarantees. [`super::validate`] turns
//! that into a [`super::ParsedTransaction`].

use icp_common::wire::{
    self, ClaimNeuronsArgs, CombinedRequest, Envelope, ListNeuronsArgs, ManageNeuronArgs, SendArgs,
    METHOD_CLAIM_NEURONS, METHOD_LIST_NEURONS, METHOD_MANAGE_NEURON, METHOD_SEND,
};
use icp_common::ParserError;

/// Decoded `arg` of a call, selected by method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    Send(SendArgs),
    ManageNeuron(ManageNeuronArgs),
    ListNeurons(ListNeuronsArgs),
    ClaimNeurons,
}

/// Call fields as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCall {
    pub nonce: Option<Vec<u8>>,
    pub canister_id: Option<Vec<u8>>,
    pub method_name: Option<String>,
    pub arg: Option<Vec<u8>>,
    pub neuron_creation_memo: Option<u64>,
    pub payload: Option<RawPayload>,
}

/// Read-state fields as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawStateRead {
    pub paths: Vec<Vec<u8>>,
}

/// An undecided request: either arm, both, or neither may be populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTransaction {
    pub request_type: String,
    pub sender: Vec<u8>,
    pub ingress_expiry: u64,
    pub call: Option<RawCall>,
    pub state_read: Option<RawStateRead>,
}

/// Decoder boundary between the assembled bytes and the transaction model.
pub trait TransactionDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawTransaction, ParserError>;
}

/// Decodes postcard-encoded [`Envelope`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardDecoder;

impl TransactionDecoder for PostcardDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawTransaction, ParserError> {
        if bytes.is_empty() {
            return Err(ParserError::ContextEmpty);
        }
        let envelope: Envelope = wire::from_bytes(bytes).map_err(map_postcard_error)?;
        split_envelope(envelope)
    }
}

fn split_envelope(envelope: Envelope) -> Result<RawTransaction, ParserError> {
    let Envelope {
        request_type,
        sender,
        ingress_expiry,
        nonce,
        canister_id,
        method_name,
        arg,
        neuron_creation_memo,
        paths,
    } = envelope;

    let has_call = nonce.is_some()
        || canister_id.is_some()
        || method_name.is_some()
        || arg.is_some()
        || neuron_creation_memo.is_some();

    let call = if has_call {
        let payload = match (method_name.as_deref(), arg.as_deref()) {
            (Some(method), Some(arg)) => Some(decode_payload(method, arg)?),
            _ => None,
        };
        Some(RawCall {
            nonce,
            canister_id,
            method_name,
            arg,
            neuron_creation_memo,
            payload,
        })
    } else {
        None
    };

    let state_read = if paths.is_empty() {
        None
    } else {
        Some(RawStateRead { paths })
    };

    Ok(RawTransaction {
        request_type,
        sender,
        ingress_expiry,
        call,
        state_read,
    })
}

/// Decodes a call argument according to the method it is sent to.
pub fn decode_payload(method: &str, arg: &[u8]) -> Result<RawPayload, ParserError> {
    let payload = match method {
        METHOD_SEND => RawPayload::Send(wire::from_bytes(arg).map_err(map_postcard_error)?),
        METHOD_MANAGE_NEURON => {
            RawPayload::ManageNeuron(wire::from_bytes(arg).map_err(map_postcard_error)?)
        }
        METHOD_LIST_NEURONS => {
            RawPayload::ListNeurons(wire::from_bytes(arg).map_err(map_postcard_error)?)
        }
        METHOD_CLAIM_NEURONS => {
            let _: ClaimNeuronsArgs = wire::from_bytes(arg).map_err(map_postcard_error)?;
            RawPayload::ClaimNeurons
        }
        _ => {
            log::debug!("decoder: unexpected method {:?}", method);
            return Err(ParserError::UnexpectedMethod);
        }
    };
    Ok(payload)
}

/// Splits a combined sign payload into its call and status query.
pub fn decode_combined(bytes: &[u8]) -> Result<CombinedRequest, ParserError> {
    if bytes.is_empty() {
        return Err(ParserError::ContextEmpty);
    }
    wire::from_bytes(bytes).map_err(map_postcard_error)
}

fn map_postcard_error(err: postcard::Error) -> ParserError {
    match err {
        postcard::Error::DeserializeUnexpectedEnd => ParserError::UnexpectedBufferEnd,
        _ => ParserError::UnexpectedValue,
    }
}
