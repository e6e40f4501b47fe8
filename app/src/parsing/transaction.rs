//! Validated transaction model.
//!
//! [`validate`] is the only way to obtain a [`ParsedTransaction`]. Once
//! built, the value is known to:
//! - carry the arm its request type names, and only that arm
//! - respect every length bound
//! - hold a known governance operation with in-range values
//! - agree with the declared stake flow
//!
//! # Security
//!
//! Review and signing only ever see this type, never raw bytes.

use chrono::{DateTime, Utc};
use icp_common::types::{
    ACCOUNT_ID_LEN, ARG_MAX_LEN, CANISTER_MAX_LEN, GOVERNANCE_CANISTER_ID, LEDGER_CANISTER_ID,
    METHOD_MAX_LEN, NONCE_MAX_LEN, PATH_MAX_ARRAY, PATH_MAX_LEN, PRINCIPAL_LEN, REQUEST_ID_LEN, REQUEST_MAX_LEN,
    SENDER_MAX_LEN, SUBACCOUNT_LEN,
};
use icp_common::wire::{
    ListNeuronsArgs, ManageNeuronArgs, SendArgs, METHOD_SEND, PATH_REQUEST_STATUS,
    REQUEST_TYPE_CALL, REQUEST_TYPE_READ_STATE,
};
use icp_common::{ParserError, SpecialTransfer};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use super::bounded::{BoundedBytes, BoundedString};
use super::decoder::{RawCall, RawPayload, RawStateRead, RawTransaction};
use crate::crypto;

/// Upper bound on followees of a single topic.
pub const MAX_FOLLOWEES: usize = 15;

/// Highest percentage accepted by spawn and merge maturity.
const MAX_PERCENTAGE: u32 = 100;

pub type Sender = BoundedBytes<SENDER_MAX_LEN>;
pub type AccountId = [u8; ACCOUNT_ID_LEN];

// =============================================================================
// Tags
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum RequestType {
    Call = 1,
    StateRead = 2,
}

impl RequestType {
    fn from_wire(s: &str) -> Result<Self, ParserError> {
        if s.len() > REQUEST_MAX_LEN {
            return Err(ParserError::ValueTooLong);
        }
        match s {
            REQUEST_TYPE_CALL => Ok(RequestType::Call),
            REQUEST_TYPE_READ_STATE => Ok(RequestType::StateRead),
            _ => Err(ParserError::InvalidRequestType),
        }
    }
}

/// How a call argument is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum DecodeType {
    SendRequest = 1,
    ManageNeuron = 2,
    ListNeurons = 3,
    ClaimNeurons = 4,
}

/// Governance operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum NeuronOperation {
    IncreaseDissolveDelay = 1,
    StartDissolving = 2,
    StopDissolving = 3,
    AddHotKey = 4,
    RemoveHotKey = 5,
    SetDissolveTimestamp = 6,
    Disburse = 7,
    Spawn = 8,
    RegisterVote = 9,
    MergeMaturity = 10,
    Follow = 11,
    JoinCommunityFund = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum Vote {
    Yes = 1,
    No = 2,
}

/// Proposal topics a neuron can follow on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(i32)]
pub enum Topic {
    Unspecified = 0,
    NeuronManagement = 1,
    ExchangeRate = 2,
    NetworkEconomics = 3,
    Governance = 4,
    NodeAdmin = 5,
    ParticipantManagement = 6,
    SubnetManagement = 7,
    NetworkCanisterManagement = 8,
    Kyc = 9,
    NodeProviderRewards = 10,
}

// =============================================================================
// Model
// =============================================================================

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTransaction {
    Call(CallRequest),
    StateRead(StateReadRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub nonce: Option<BoundedBytes<NONCE_MAX_LEN>>,
    pub ingress_expiry: u64,
    pub neuron_creation_memo: u64,
    pub canister_id: BoundedBytes<CANISTER_MAX_LEN>,
    pub sender: Sender,
    pub method_name: BoundedString<METHOD_MAX_LEN>,
    pub arg: BoundedBytes<ARG_MAX_LEN>,
    pub payload: CallPayload,
    pub special_transfer: SpecialTransfer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateReadRequest {
    pub ingress_expiry: u64,
    pub sender: Sender,
    pub paths: Vec<BoundedBytes<PATH_MAX_LEN>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallPayload {
    SendRequest(SendRequest),
    ManageNeuron(ManageNeuron),
    ListNeurons(ListNeurons),
    ClaimNeurons,
}

impl CallPayload {
    /// Calls served by the governance canister.
    pub fn is_governance(&self) -> bool {
        !matches!(self, CallPayload::SendRequest(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub memo: u64,
    pub amount_e8s: u64,
    pub fee_e8s: u64,
    pub from_subaccount: Option<[u8; SUBACCOUNT_LEN]>,
    pub to: AccountId,
    pub created_at_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManageNeuron {
    pub neuron_id: u64,
    pub command: NeuronCommand,
}

/// Operation-specific fields of a governance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeuronCommand {
    IncreaseDissolveDelay { additional_seconds: u64 },
    StartDissolving,
    StopDissolving,
    AddHotKey { hot_key: BoundedBytes<PRINCIPAL_LEN> },
    RemoveHotKey { hot_key: BoundedBytes<PRINCIPAL_LEN> },
    SetDissolveTimestamp { timestamp_seconds: u64 },
    Disburse { to_account: Option<AccountId>, amount_e8s: Option<u64> },
    Spawn { controller: Option<BoundedBytes<PRINCIPAL_LEN>>, percentage: Option<u32> },
    RegisterVote { proposal_id: u64, vote: Vote },
    MergeMaturity { percentage: u32 },
    Follow { topic: Topic, followees: Vec<u64> },
    JoinCommunityFund,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNeurons {
    pub neuron_ids: Vec<u64>,
    pub include_neurons_readable_by_caller: bool,
}

impl ParsedTransaction {
    pub fn request_type(&self) -> RequestType {
        match self {
            ParsedTransaction::Call(_) => RequestType::Call,
            ParsedTransaction::StateRead(_) => RequestType::StateRead,
        }
    }

    pub fn sender(&self) -> &[u8] {
        match self {
            ParsedTransaction::Call(call) => call.sender.as_slice(),
            ParsedTransaction::StateRead(read) => read.sender.as_slice(),
        }
    }

    pub fn ingress_expiry(&self) -> u64 {
        match self {
            ParsedTransaction::Call(call) => call.ingress_expiry,
            ParsedTransaction::StateRead(read) => read.ingress_expiry,
        }
    }
}

impl CallPayload {
    pub fn decode_type(&self) -> DecodeType {
        match self {
            CallPayload::SendRequest(_) => DecodeType::SendRequest,
            CallPayload::ManageNeuron(_) => DecodeType::ManageNeuron,
            CallPayload::ListNeurons(_) => DecodeType::ListNeurons,
            CallPayload::ClaimNeurons => DecodeType::ClaimNeurons,
        }
    }
}

impl NeuronCommand {
    pub fn operation(&self) -> NeuronOperation {
        match self {
            NeuronCommand::IncreaseDissolveDelay { .. } => NeuronOperation::IncreaseDissolveDelay,
            NeuronCommand::StartDissolving => NeuronOperation::StartDissolving,
            NeuronCommand::StopDissolving => NeuronOperation::StopDissolving,
            NeuronCommand::AddHotKey { .. } => NeuronOperation::AddHotKey,
            NeuronCommand::RemoveHotKey { .. } => NeuronOperation::RemoveHotKey,
            NeuronCommand::SetDissolveTimestamp { .. } => NeuronOperation::SetDissolveTimestamp,
            NeuronCommand::Disburse { .. } => NeuronOperation::Disburse,
            NeuronCommand::Spawn { .. } => NeuronOperation::Spawn,
            NeuronCommand::RegisterVote { .. } => NeuronOperation::RegisterVote,
            NeuronCommand::MergeMaturity { .. } => NeuronOperation::MergeMaturity,
            NeuronCommand::Follow { .. } => NeuronOperation::Follow,
            NeuronCommand::JoinCommunityFund => NeuronOperation::JoinCommunityFund,
        }
    }
}

impl StateReadRequest {
    /// Request id when this is a `request_status` lookup.
    pub fn request_id(&self) -> Option<&[u8]> {
        match self.paths.as_slice() {
            [first, id] if first.as_slice() == PATH_REQUEST_STATUS && id.len() == REQUEST_ID_LEN => {
                Some(id.as_slice())
            }
            _ => None,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a decoded request against the declared transfer flow.
///
/// Callers outside a stake flow pass [`SpecialTransfer::Normal`].
pub fn validate(
    raw: RawTransaction,
    special_transfer: SpecialTransfer,
) -> Result<ParsedTransaction, ParserError> {
    let request_type = RequestType::from_wire(&raw.request_type)?;

    let tx = match (request_type, raw.call, raw.state_read) {
        (RequestType::Call, Some(call), None) => ParsedTransaction::Call(validate_call(
            call,
            &raw.sender,
            raw.ingress_expiry,
            special_transfer,
        )?),
        (RequestType::StateRead, None, Some(read)) => {
            ParsedTransaction::StateRead(validate_state_read(read, &raw.sender, raw.ingress_expiry)?)
        }
        (RequestType::Call, None, None) | (RequestType::StateRead, None, None) => {
            return Err(ParserError::MissingField)
        }
        _ => return Err(ParserError::RequestTypeMismatch),
    };

    if special_transfer.is_stake() {
        check_neuron_stake(&tx)?;
    }

    Ok(tx)
}

fn validate_sender(sender: &[u8]) -> Result<Sender, ParserError> {
    if sender.is_empty() {
        return Err(ParserError::MissingField);
    }
    Sender::new(sender)
}

fn validate_call(
    call: RawCall,
    sender: &[u8],
    ingress_expiry: u64,
    special_transfer: SpecialTransfer,
) -> Result<CallRequest, ParserError> {
    let sender = validate_sender(sender)?;
    let nonce = call.nonce.map(BoundedBytes::from_vec).transpose()?;
    let canister_id = BoundedBytes::from_vec(call.canister_id.ok_or(ParserError::MissingField)?)?;
    let method_name = BoundedString::new(
        call.method_name
            .as_deref()
            .ok_or(ParserError::MissingField)?,
    )?;
    let arg = BoundedBytes::from_vec(call.arg.ok_or(ParserError::MissingField)?)?;

    let payload = match call.payload.ok_or(ParserError::MissingField)? {
        RawPayload::Send(args) => CallPayload::SendRequest(validate_send(args)?),
        RawPayload::ManageNeuron(args) => CallPayload::ManageNeuron(validate_manage_neuron(args)?),
        RawPayload::ListNeurons(args) => CallPayload::ListNeurons(validate_list_neurons(args)),
        RawPayload::ClaimNeurons => CallPayload::ClaimNeurons,
    };
    // governance reviews never show the canister
    if payload.is_governance() && canister_id.as_slice() != GOVERNANCE_CANISTER_ID {
        log::warn!("parser: governance method sent to another canister");
        return Err(ParserError::UnexpectedValue);
    }

    Ok(CallRequest {
        nonce,
        ingress_expiry,
        neuron_creation_memo: call.neuron_creation_memo.unwrap_or(0),
        canister_id,
        sender,
        method_name,
        arg,
        payload,
        special_transfer,
    })
}

fn validate_state_read(
    read: RawStateRead,
    sender: &[u8],
    ingress_expiry: u64,
) -> Result<StateReadRequest, ParserError> {
    let sender = validate_sender(sender)?;
    if read.paths.len() > PATH_MAX_ARRAY {
        return Err(ParserError::TooManyPaths);
    }
    // One extra slot for the request id the host may append later.
    let mut paths = Vec::with_capacity(PATH_MAX_ARRAY + 1);
    for path in read.paths {
        paths.push(BoundedBytes::from_vec(path)?);
    }
    Ok(StateReadRequest {
        ingress_expiry,
        sender,
        paths,
    })
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], ParserError> {
    bytes.try_into().map_err(|_| ParserError::UnexpectedValue)
}

fn validate_send(args: SendArgs) -> Result<SendRequest, ParserError> {
    Ok(SendRequest {
        memo: args.memo,
        amount_e8s: args.amount_e8s.ok_or(ParserError::MissingField)?,
        fee_e8s: args.fee_e8s.ok_or(ParserError::MissingField)?,
        from_subaccount: args.from_subaccount.as_deref().map(fixed).transpose()?,
        to: fixed(&args.to)?,
        created_at_time: args.created_at_time,
    })
}

fn validate_principal(principal: Option<Vec<u8>>) -> Result<BoundedBytes<PRINCIPAL_LEN>, ParserError> {
    let principal = principal.ok_or(ParserError::MissingField)?;
    if principal.is_empty() {
        return Err(ParserError::MissingField);
    }
    BoundedBytes::from_vec(principal)
}

fn validate_percentage(percentage: u32) -> Result<u32, ParserError> {
    if percentage == 0 || percentage > MAX_PERCENTAGE {
        return Err(ParserError::ValueOutOfRange);
    }
    Ok(percentage)
}

fn validate_manage_neuron(args: ManageNeuronArgs) -> Result<ManageNeuron, ParserError> {
    let operation = NeuronOperation::from_u32(args.command).ok_or_else(|| {
        log::debug!("parser: unknown neuron command {}", args.command);
        ParserError::UnknownOperation
    })?;
    let neuron_id = args.neuron_id.ok_or(ParserError::MissingField)?;

    let command = match operation {
        NeuronOperation::IncreaseDissolveDelay => NeuronCommand::IncreaseDissolveDelay {
            additional_seconds: args.seconds.ok_or(ParserError::MissingField)?,
        },
        NeuronOperation::StartDissolving => NeuronCommand::StartDissolving,
        NeuronOperation::StopDissolving => NeuronCommand::StopDissolving,
        NeuronOperation::AddHotKey => NeuronCommand::AddHotKey {
            hot_key: validate_principal(args.principal)?,
        },
        NeuronOperation::RemoveHotKey => NeuronCommand::RemoveHotKey {
            hot_key: validate_principal(args.principal)?,
        },
        NeuronOperation::SetDissolveTimestamp => {
            let timestamp_seconds = args.seconds.ok_or(ParserError::MissingField)?;
            let representable = i64::try_from(timestamp_seconds)
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .is_some();
            if !representable {
                return Err(ParserError::ValueOutOfRange);
            }
            NeuronCommand::SetDissolveTimestamp { timestamp_seconds }
        }
        NeuronOperation::Disburse => NeuronCommand::Disburse {
            to_account: args.account.as_deref().map(fixed).transpose()?,
            amount_e8s: args.amount_e8s,
        },
        NeuronOperation::Spawn => NeuronCommand::Spawn {
            controller: args.principal.map(|p| validate_principal(Some(p))).transpose()?,
            percentage: args.percentage.map(validate_percentage).transpose()?,
        },
        NeuronOperation::RegisterVote => NeuronCommand::RegisterVote {
            proposal_id: args.proposal_id.ok_or(ParserError::MissingField)?,
            vote: Vote::from_i32(args.vote.ok_or(ParserError::MissingField)?)
                .ok_or(ParserError::ValueOutOfRange)?,
        },
        NeuronOperation::MergeMaturity => NeuronCommand::MergeMaturity {
            percentage: validate_percentage(args.percentage.ok_or(ParserError::MissingField)?)?,
        },
        NeuronOperation::Follow => {
            if args.followees.len() > MAX_FOLLOWEES {
                return Err(ParserError::ValueTooLong);
            }
            NeuronCommand::Follow {
                topic: Topic::from_i32(args.topic.ok_or(ParserError::MissingField)?)
                    .ok_or(ParserError::ValueOutOfRange)?,
                followees: args.followees,
            }
        }
        NeuronOperation::JoinCommunityFund => NeuronCommand::JoinCommunityFund,
    };

    Ok(ManageNeuron { neuron_id, command })
}

fn validate_list_neurons(args: ListNeuronsArgs) -> ListNeurons {
    ListNeurons {
        neuron_ids: args.neuron_ids,
        include_neurons_readable_by_caller: args.include_neurons_readable_by_caller,
    }
}

/// A stake flow only signs a ledger transfer into the sender's neuron
/// staking account.
fn check_neuron_stake(tx: &ParsedTransaction) -> Result<(), ParserError> {
    let call = match tx {
        ParsedTransaction::Call(call) => call,
        ParsedTransaction::StateRead(_) => return Err(ParserError::InvalidStakeTransaction),
    };
    let send = match &call.payload {
        CallPayload::SendRequest(send) => send,
        _ => return Err(ParserError::InvalidStakeTransaction),
    };

    if call.canister_id.as_slice() != LEDGER_CANISTER_ID || call.method_name.as_str() != METHOD_SEND
    {
        return Err(ParserError::InvalidStakeTransaction);
    }

    let expected = crypto::neuron_stake_account(&call.sender, send.memo);
    if send.to != expected {
        log::warn!("parser: stake destination does not match the neuron account");
        return Err(ParserError::InvalidStakeTransaction);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{PostcardDecoder, TransactionDecoder};
    use icp_common::wire::{
        command, to_bytes, Envelope, METHOD_CLAIM_NEURONS, METHOD_LIST_NEURONS,
        METHOD_MANAGE_NEURON,
    };

    const SENDER: [u8; 29] = [0x5A; 29];
    const GOVERNANCE: [u8; 10] = [0, 0, 0, 0, 0, 0, 0, 1, 1, 1];

    fn call_envelope(canister: &[u8], method: &str, arg: Vec<u8>) -> Envelope {
        Envelope {
            request_type: REQUEST_TYPE_CALL.to_string(),
            sender: SENDER.to_vec(),
            ingress_expiry: 1_700_000_000_000_000_000,
            nonce: Some(vec![1, 2, 3, 4]),
            canister_id: Some(canister.to_vec()),
            method_name: Some(method.to_string()),
            arg: Some(arg),
            ..Default::default()
        }
    }

    fn send_args(to: [u8; 32], memo: u64) -> Vec<u8> {
        to_bytes(&SendArgs {
            memo,
            amount_e8s: Some(150_000_000),
            fee_e8s: Some(10_000),
            to: to.to_vec(),
            ..Default::default()
        })
        .unwrap()
    }

    fn neuron_args(args: ManageNeuronArgs) -> Envelope {
        call_envelope(&GOVERNANCE, METHOD_MANAGE_NEURON, to_bytes(&args).unwrap())
    }

    fn parse(envelope: &Envelope, flow: SpecialTransfer) -> Result<ParsedTransaction, ParserError> {
        let raw = PostcardDecoder.decode(&to_bytes(envelope).unwrap())?;
        validate(raw, flow)
    }

    #[test]
    fn test_send_request() {
        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        let tx = parse(&envelope, SpecialTransfer::Normal).unwrap();
        assert_eq!(tx.request_type(), RequestType::Call);
        match tx {
            ParsedTransaction::Call(call) => {
                assert_eq!(call.payload.decode_type(), DecodeType::SendRequest);
                assert_eq!(call.method_name.as_str(), "send_pb");
                assert_eq!(call.nonce.unwrap().as_slice(), &[1, 2, 3, 4]);
            }
            _ => panic!("expected a call"),
        }
    }

    #[test]
    fn test_request_type_checks() {
        let mut envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        envelope.request_type = "query".to_string();
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::InvalidRequestType));

        envelope.request_type = "read_state_x".to_string();
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));

        envelope.request_type = REQUEST_TYPE_READ_STATE.to_string();
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::RequestTypeMismatch));

        envelope.request_type = REQUEST_TYPE_CALL.to_string();
        envelope.paths = vec![PATH_REQUEST_STATUS.to_vec()];
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::RequestTypeMismatch));
    }

    #[test]
    fn test_bounds() {
        let mut envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        envelope.sender = vec![0; 30];
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));

        envelope.sender = Vec::new();
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::MissingField));

        let mut envelope = call_envelope(&[0; 11], METHOD_SEND, send_args([7; 32], 3));
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));

        envelope.canister_id = Some(LEDGER_CANISTER_ID.to_vec());
        envelope.nonce = Some(vec![0; 33]);
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));

        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        let mut raw = PostcardDecoder.decode(&to_bytes(&envelope).unwrap()).unwrap();
        if let Some(call) = raw.call.as_mut() {
            call.arg = Some(vec![0; ARG_MAX_LEN + 1]);
        }
        assert_eq!(validate(raw, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));
    }

    #[test]
    fn test_missing_call_fields() {
        let mut envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        envelope.canister_id = None;
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::MissingField));

        let mut envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args([7; 32], 3));
        envelope.arg = None;
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::MissingField));

        let args = to_bytes(&SendArgs {
            to: vec![7; 32],
            fee_e8s: Some(10_000),
            ..Default::default()
        })
        .unwrap();
        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, args);
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::MissingField));

        let envelope = Envelope {
            request_type: REQUEST_TYPE_CALL.to_string(),
            sender: SENDER.to_vec(),
            ..Default::default()
        };
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::MissingField));
    }

    #[test]
    fn test_destination_must_be_an_account_id() {
        let args = to_bytes(&SendArgs {
            amount_e8s: Some(1),
            fee_e8s: Some(10_000),
            to: vec![7; 31],
            ..Default::default()
        })
        .unwrap();
        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, args);
        assert_eq!(parse(&envelope, SpecialTransfer::Normal), Err(ParserError::UnexpectedValue));
    }

    #[test]
    fn test_state_read() {
        let envelope = Envelope {
            request_type: REQUEST_TYPE_READ_STATE.to_string(),
            sender: SENDER.to_vec(),
            ingress_expiry: 1,
            paths: vec![PATH_REQUEST_STATUS.to_vec(), vec![9; 32]],
            ..Default::default()
        };
        match parse(&envelope, SpecialTransfer::Normal).unwrap() {
            ParsedTransaction::StateRead(read) => {
                assert_eq!(read.request_id(), Some(&[9u8; 32][..]));
            }
            _ => panic!("expected a state read"),
        }

        let mut too_many = envelope.clone();
        too_many.paths.push(vec![1]);
        assert_eq!(parse(&too_many, SpecialTransfer::Normal), Err(ParserError::TooManyPaths));

        let mut too_long = envelope.clone();
        too_long.paths[1] = vec![0; PATH_MAX_LEN + 1];
        assert_eq!(parse(&too_long, SpecialTransfer::Normal), Err(ParserError::ValueTooLong));

        let mut not_status = envelope;
        not_status.paths = vec![b"time".to_vec()];
        match parse(&not_status, SpecialTransfer::Normal).unwrap() {
            ParsedTransaction::StateRead(read) => assert!(read.request_id().is_none()),
            _ => panic!("expected a state read"),
        }
    }

    #[test]
    fn test_neuron_operations() {
        let ok = [
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::INCREASE_DISSOLVE_DELAY,
                seconds: Some(86_400),
                ..Default::default()
            },
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::ADD_HOT_KEY,
                principal: Some(vec![0x04]),
                ..Default::default()
            },
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::DISBURSE,
                ..Default::default()
            },
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::SPAWN,
                percentage: Some(100),
                ..Default::default()
            },
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::FOLLOW,
                topic: Some(0),
                ..Default::default()
            },
            ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::JOIN_COMMUNITY_FUND,
                ..Default::default()
            },
        ];
        for args in ok {
            let expected = NeuronOperation::from_u32(args.command).unwrap();
            match parse(&neuron_args(args), SpecialTransfer::Normal).unwrap() {
                ParsedTransaction::Call(CallRequest {
                    payload: CallPayload::ManageNeuron(neuron),
                    ..
                }) => assert_eq!(neuron.command.operation(), expected),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_neuron_operation_errors() {
        let cases = [
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: 13,
                    ..Default::default()
                },
                ParserError::UnknownOperation,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: 0,
                    ..Default::default()
                },
                ParserError::UnknownOperation,
            ),
            (
                ManageNeuronArgs {
                    command: command::STOP_DISSOLVING,
                    ..Default::default()
                },
                ParserError::MissingField,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::REGISTER_VOTE,
                    proposal_id: Some(5),
                    vote: Some(3),
                    ..Default::default()
                },
                ParserError::ValueOutOfRange,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::FOLLOW,
                    topic: Some(11),
                    ..Default::default()
                },
                ParserError::ValueOutOfRange,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::MERGE_MATURITY,
                    percentage: Some(0),
                    ..Default::default()
                },
                ParserError::ValueOutOfRange,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::SPAWN,
                    percentage: Some(101),
                    ..Default::default()
                },
                ParserError::ValueOutOfRange,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::SET_DISSOLVE_TIMESTAMP,
                    seconds: Some(u64::MAX),
                    ..Default::default()
                },
                ParserError::ValueOutOfRange,
            ),
            (
                ManageNeuronArgs {
                    neuron_id: Some(1),
                    command: command::FOLLOW,
                    topic: Some(1),
                    followees: vec![1; MAX_FOLLOWEES + 1],
                    ..Default::default()
                },
                ParserError::ValueTooLong,
            ),
        ];
        for (args, err) in cases {
            assert_eq!(parse(&neuron_args(args), SpecialTransfer::Normal), Err(err));
        }
    }

    #[test]
    fn test_list_and_claim_neurons() {
        let list = to_bytes(&ListNeuronsArgs::default()).unwrap();
        let tx = parse(&call_envelope(&GOVERNANCE, METHOD_LIST_NEURONS, list), SpecialTransfer::Normal);
        assert!(matches!(
            tx,
            Ok(ParsedTransaction::Call(CallRequest { payload: CallPayload::ListNeurons(_), .. }))
        ));

        let tx = parse(
            &call_envelope(&GOVERNANCE, METHOD_CLAIM_NEURONS, Vec::new()),
            SpecialTransfer::Normal,
        );
        assert!(matches!(
            tx,
            Ok(ParsedTransaction::Call(CallRequest { payload: CallPayload::ClaimNeurons, .. }))
        ));
    }

    #[test]
    fn test_governance_calls_need_governance_canister() {
        let foreign = [9u8; 10];
        let list = to_bytes(&ListNeuronsArgs::default()).unwrap();
        let envelopes = [
            neuron_args(ManageNeuronArgs {
                neuron_id: Some(1),
                command: command::START_DISSOLVING,
                ..Default::default()
            }),
            call_envelope(&GOVERNANCE, METHOD_LIST_NEURONS, list),
            call_envelope(&GOVERNANCE, METHOD_CLAIM_NEURONS, Vec::new()),
        ];
        for mut envelope in envelopes {
            assert!(parse(&envelope, SpecialTransfer::Normal).is_ok());
            envelope.canister_id = Some(foreign.to_vec());
            assert_eq!(
                parse(&envelope, SpecialTransfer::Normal),
                Err(ParserError::UnexpectedValue)
            );
            envelope.canister_id = Some(LEDGER_CANISTER_ID.to_vec());
            assert_eq!(
                parse(&envelope, SpecialTransfer::Normal),
                Err(ParserError::UnexpectedValue)
            );
        }

        // transfers show their canister and may target any of them
        let envelope = call_envelope(&foreign, METHOD_SEND, send_args([7; 32], 3));
        assert!(parse(&envelope, SpecialTransfer::Normal).is_ok());
    }

    #[test]
    fn test_stake_flow() {
        let memo = 42;
        let stake_to = crypto::neuron_stake_account(&SENDER, memo);
        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args(stake_to, memo));
        assert!(parse(&envelope, SpecialTransfer::NeuronStake).is_ok());
        assert!(parse(&envelope, SpecialTransfer::Normal).is_ok());

        // Wrong memo
        let envelope = call_envelope(&LEDGER_CANISTER_ID, METHOD_SEND, send_args(stake_to, memo + 1));
        assert_eq!(
            parse(&envelope, SpecialTransfer::NeuronStake),
            Err(ParserError::InvalidStakeTransaction)
        );
        assert!(parse(&envelope, SpecialTransfer::Normal).is_ok());

        // Wrong canister
        let envelope = call_envelope(&GOVERNANCE, METHOD_SEND, send_args(stake_to, memo));
        assert_eq!(
            parse(&envelope, SpecialTransfer::NeuronStake),
            Err(ParserError::InvalidStakeTransaction)
        );

        // Not a transfer
        let list = to_bytes(&ListNeuronsArgs::default()).unwrap();
        assert_eq!(
            parse(&call_envelope(&GOVERNANCE, METHOD_LIST_NEURONS, list), SpecialTransfer::NeuronStake),
            Err(ParserError::InvalidStakeTransaction)
        );
    }
}
