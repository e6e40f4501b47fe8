//! Review of a validated transaction.
//!
//! The item list is a fixed template per transaction kind. Expert mode adds
//! "Sender" right after the transaction type, then the envelope details
//! (expiry, creation time, nonce) and "Path" at the end.

use icp_common::{DerivationPath, ParserError, TICKER};

use super::format::{format_duration, format_hex, format_icp, format_timestamp};
use super::{ReviewItem, ReviewSource};
use crate::config::Mode;
use crate::crypto;
use crate::parsing::transaction::AccountId;
use crate::parsing::{
    CallPayload, CallRequest, NeuronCommand, ParsedTransaction, SendRequest, StateReadRequest,
    Topic, Vote,
};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// One item of a review template, formatted only when requested.
#[derive(Debug, Clone, Copy)]
enum Field<'a> {
    TransactionType(&'static str),
    Sender,
    FromAccount(&'a SendRequest),
    ToAccount(&'a AccountId),
    Amount(u64),
    MaximumFee(u64),
    Memo(u64),
    CanisterId(&'a [u8]),
    Method(&'a str),
    NeuronId(u64),
    AdditionalDelay(u64),
    Principal(&'a [u8]),
    DissolveTime(u64),
    DisburseTo(Option<&'a AccountId>),
    DisburseAmount(Option<u64>),
    Controller(Option<&'a [u8]>),
    SpawnPercentage(Option<u32>),
    ProposalId(u64),
    Vote(Vote),
    Percentage(u32),
    Topic(Topic),
    NoFollowees,
    Followee { position: usize, total: usize, neuron_id: u64 },
    RequestId(&'a [u8]),
    IngressExpiry(u64),
    CreatedAt(u64),
    Nonce(&'a [u8]),
    Path,
}

pub struct TransactionReview<'a> {
    tx: &'a ParsedTransaction,
    path: DerivationPath,
    width: usize,
}

impl<'a> TransactionReview<'a> {
    pub fn new(tx: &'a ParsedTransaction, path: DerivationPath, width: usize) -> Self {
        Self { tx, path, width }
    }

    fn fields(&self, mode: Mode) -> Vec<Field<'a>> {
        let mut fields = match self.tx {
            ParsedTransaction::Call(call) => call_fields(call),
            ParsedTransaction::StateRead(read) => state_read_fields(read),
        };
        if mode.is_expert() {
            fields.insert(1, Field::Sender);
            fields.extend(envelope_fields(self.tx));
            fields.push(Field::Path);
        }
        fields
    }

    fn render(&self, field: Field<'a>) -> Result<(String, String), ParserError> {
        let sender = self.tx.sender();
        let (key, value) = match field {
            Field::TransactionType(kind) => ("Transaction type", kind.to_string()),
            Field::Sender => ("Sender", crypto::principal_to_text(sender)),
            Field::FromAccount(send) => (
                "From account",
                format_hex(&crypto::account_identifier(sender, send.from_subaccount.as_ref())),
            ),
            Field::ToAccount(to) => ("To account", format_hex(to)),
            Field::Amount(e8s) => return Ok((amount_key("Amount"), format_icp(e8s))),
            Field::MaximumFee(e8s) => return Ok((amount_key("Maximum fee"), format_icp(e8s))),
            Field::Memo(memo) => ("Memo", memo.to_string()),
            Field::CanisterId(id) => ("Canister Id", crypto::principal_to_text(id)),
            Field::Method(method) => ("Method", method.to_string()),
            Field::NeuronId(id) => ("Neuron ID", id.to_string()),
            Field::AdditionalDelay(seconds) => ("Additional Delay", format_duration(seconds)),
            Field::Principal(principal) => ("Principal", crypto::principal_to_text(principal)),
            Field::DissolveTime(seconds) => ("Dissolve Time", format_timestamp(seconds)?),
            Field::DisburseTo(account) => (
                "Disburse To",
                account.map_or_else(|| "Self".to_string(), |a| format_hex(a.as_slice())),
            ),
            Field::DisburseAmount(amount) => {
                let value = amount.map_or_else(|| "All".to_string(), format_icp);
                return Ok((amount_key("Amount"), value));
            }
            Field::Controller(controller) => (
                "Controller",
                controller.map_or_else(|| "Self".to_string(), crypto::principal_to_text),
            ),
            Field::SpawnPercentage(percentage) => (
                "Percentage to spawn",
                percentage.unwrap_or(100).to_string(),
            ),
            Field::ProposalId(id) => ("Proposal ID", id.to_string()),
            Field::Vote(vote) => ("Vote", vote_label(vote).to_string()),
            Field::Percentage(percentage) => ("Percentage", percentage.to_string()),
            Field::Topic(topic) => ("Topic", topic_label(topic).to_string()),
            Field::NoFollowees => ("Followees", "None".to_string()),
            Field::Followee {
                position,
                total,
                neuron_id,
            } => {
                return Ok((
                    format!("Followee ({}/{})", position, total),
                    neuron_id.to_string(),
                ))
            }
            Field::RequestId(id) => ("Request ID", format_hex(id)),
            Field::IngressExpiry(nanos) => {
                ("Ingress Expiry", format_timestamp(nanos / NANOS_PER_SECOND)?)
            }
            Field::CreatedAt(nanos) => ("Created At", format_timestamp(nanos / NANOS_PER_SECOND)?),
            Field::Nonce(nonce) => ("Nonce", format_hex(nonce)),
            Field::Path => ("Path", self.path.to_path_string()),
        };
        Ok((key.to_string(), value))
    }
}

impl ReviewSource for TransactionReview<'_> {
    fn num_items(&self, mode: Mode) -> Result<u8, ParserError> {
        u8::try_from(self.fields(mode).len()).map_err(|_| ParserError::DisplayIdxOutOfRange)
    }

    fn get_item(&self, mode: Mode, index: u8, page: u8) -> Result<ReviewItem, ParserError> {
        let field = self
            .fields(mode)
            .get(index as usize)
            .copied()
            .ok_or(ParserError::NoData)?;
        let (key, value) = self.render(field)?;
        ReviewItem::paged(&key, &value, self.width, page)
    }
}

fn call_fields(call: &CallRequest) -> Vec<Field<'_>> {
    match &call.payload {
        CallPayload::SendRequest(send) if call.special_transfer.is_stake() => vec![
            Field::TransactionType("Stake Neuron"),
            Field::FromAccount(send),
            Field::Amount(send.amount_e8s),
            Field::MaximumFee(send.fee_e8s),
            Field::Memo(send.memo),
        ],
        CallPayload::SendRequest(send) => vec![
            Field::TransactionType("Send ICP"),
            Field::FromAccount(send),
            Field::ToAccount(&send.to),
            Field::Amount(send.amount_e8s),
            Field::MaximumFee(send.fee_e8s),
            Field::Memo(send.memo),
            Field::CanisterId(call.canister_id.as_slice()),
            Field::Method(call.method_name.as_str()),
        ],
        CallPayload::ListNeurons(_) => vec![Field::TransactionType("List Own Stakes")],
        CallPayload::ClaimNeurons => vec![Field::TransactionType("Claim Neurons")],
        CallPayload::ManageNeuron(neuron) => {
            let id = Field::NeuronId(neuron.neuron_id);
            match &neuron.command {
                NeuronCommand::IncreaseDissolveDelay { additional_seconds } => vec![
                    Field::TransactionType("Increase Dissolve Delay"),
                    id,
                    Field::AdditionalDelay(*additional_seconds),
                ],
                NeuronCommand::StartDissolving => {
                    vec![Field::TransactionType("Start Dissolving"), id]
                }
                NeuronCommand::StopDissolving => {
                    vec![Field::TransactionType("Stop Dissolving"), id]
                }
                NeuronCommand::JoinCommunityFund => {
                    vec![Field::TransactionType("Join Community Fund"), id]
                }
                NeuronCommand::AddHotKey { hot_key } => vec![
                    Field::TransactionType("Add Hotkey"),
                    id,
                    Field::Principal(hot_key.as_slice()),
                ],
                NeuronCommand::RemoveHotKey { hot_key } => vec![
                    Field::TransactionType("Remove Hotkey"),
                    id,
                    Field::Principal(hot_key.as_slice()),
                ],
                NeuronCommand::SetDissolveTimestamp { timestamp_seconds } => vec![
                    Field::TransactionType("Set Dissolve Delay"),
                    id,
                    Field::DissolveTime(*timestamp_seconds),
                ],
                NeuronCommand::Disburse {
                    to_account,
                    amount_e8s,
                } => vec![
                    Field::TransactionType("Disburse Neuron"),
                    id,
                    Field::DisburseTo(to_account.as_ref()),
                    Field::DisburseAmount(*amount_e8s),
                ],
                NeuronCommand::Spawn {
                    controller,
                    percentage,
                } => vec![
                    Field::TransactionType("Spawn Neuron"),
                    id,
                    Field::Controller(controller.as_deref()),
                    Field::SpawnPercentage(*percentage),
                ],
                NeuronCommand::RegisterVote { proposal_id, vote } => vec![
                    Field::TransactionType("Register Vote"),
                    id,
                    Field::ProposalId(*proposal_id),
                    Field::Vote(*vote),
                ],
                NeuronCommand::MergeMaturity { percentage } => vec![
                    Field::TransactionType("Merge Maturity"),
                    id,
                    Field::Percentage(*percentage),
                ],
                NeuronCommand::Follow { topic, followees } => {
                    let mut fields = vec![Field::TransactionType("Follow"), id, Field::Topic(*topic)];
                    if followees.is_empty() {
                        fields.push(Field::NoFollowees);
                    }
                    let total = followees.len();
                    fields.extend(followees.iter().enumerate().map(|(i, &neuron_id)| {
                        Field::Followee {
                            position: i + 1,
                            total,
                            neuron_id,
                        }
                    }));
                    fields
                }
            }
        }
    }
}

/// Signed envelope details shown in expert mode.
fn envelope_fields(tx: &ParsedTransaction) -> Vec<Field<'_>> {
    match tx {
        ParsedTransaction::Call(call) => {
            let mut fields = vec![Field::IngressExpiry(call.ingress_expiry)];
            if let CallPayload::SendRequest(SendRequest {
                created_at_time: Some(nanos),
                ..
            }) = &call.payload
            {
                fields.push(Field::CreatedAt(*nanos));
            }
            if let Some(nonce) = call.nonce.as_ref().filter(|n| !n.as_slice().is_empty()) {
                fields.push(Field::Nonce(nonce.as_slice()));
            }
            fields
        }
        ParsedTransaction::StateRead(read) => vec![Field::IngressExpiry(read.ingress_expiry)],
    }
}

fn state_read_fields(read: &StateReadRequest) -> Vec<Field<'_>> {
    let mut fields = vec![Field::TransactionType("Check Status")];
    if let Some(id) = read.request_id() {
        fields.push(Field::RequestId(id));
    }
    fields
}

fn amount_key(label: &str) -> String {
    format!("{} ({})", label, TICKER)
}

fn vote_label(vote: Vote) -> &'static str {
    match vote {
        Vote::Yes => "Yes",
        Vote::No => "No",
    }
}

fn topic_label(topic: Topic) -> &'static str {
    match topic {
        Topic::Unspecified => "Default",
        Topic::NeuronManagement => "Neuron Management",
        Topic::ExchangeRate => "Exchange Rate",
        Topic::NetworkEconomics => "Network Economics",
        Topic::Governance => "Governance",
        Topic::NodeAdmin => "Node Admin",
        Topic::ParticipantManagement => "Participant Management",
        Topic::SubnetManagement => "Subnet Management",
        Topic::NetworkCanisterManagement => "Network Canister Management",
        Topic::Kyc => "KYC",
        Topic::NodeProviderRewards => "Node Provider Rewards",
    }
}
