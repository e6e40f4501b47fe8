//! Helpers shared by the integration tests.
#![allow(dead_code)]

use icp_app::{AppConfig, Dispatcher, MockPlatform, Response};
use icp_common::opcodes::{CHUNK_SIZE, CLA};
use icp_common::types::LEDGER_CANISTER_ID;
use icp_common::wire::{to_bytes, Envelope, SendArgs, METHOD_SEND, REQUEST_TYPE_CALL};
use icp_common::DerivationPath;

pub const INS_GET_ADDR: u8 = 0x01;
pub const INS_SIGN: u8 = 0x02;
pub const INS_SIGN_COMBINED: u8 = 0x03;

pub const MAINNET_PATH: &str = "m/44'/223'/0'/0/0";

pub fn path(s: &str) -> DerivationPath {
    DerivationPath::parse(s).unwrap()
}

pub fn dispatcher() -> Dispatcher<MockPlatform> {
    Dispatcher::new(AppConfig::default(), MockPlatform::new())
}

pub fn expert_dispatcher() -> Dispatcher<MockPlatform> {
    let config = AppConfig {
        expert_default: true,
        ..AppConfig::default()
    };
    Dispatcher::new(config, MockPlatform::new())
}

pub fn fragment(ins: u8, payload_type: u8, flag: u8, data: &[u8]) -> Vec<u8> {
    let mut command = vec![CLA, ins, payload_type, flag, data.len() as u8];
    command.extend_from_slice(data);
    command
}

pub fn init(ins: u8, flag: u8, path: &DerivationPath) -> Vec<u8> {
    fragment(ins, 0x00, flag, &path.to_le_bytes())
}

pub fn append(ins: u8, flag: u8, data: &[u8]) -> Vec<u8> {
    fragment(ins, 0x01, flag, data)
}

pub fn last(ins: u8, flag: u8, data: &[u8]) -> Vec<u8> {
    fragment(ins, 0x02, flag, data)
}

/// Init followed by `payload` cut at `split_points`, the final piece sent as Last.
pub fn sequence(
    ins: u8,
    flag: u8,
    path: &DerivationPath,
    payload: &[u8],
    split_points: &[usize],
) -> Vec<Vec<u8>> {
    let mut commands = vec![init(ins, flag, path)];
    let mut start = 0;
    for &end in split_points {
        commands.push(append(ins, flag, &payload[start..end]));
        start = end;
    }
    commands.push(last(ins, flag, &payload[start..]));
    commands
}

/// Init followed by `payload` in `CHUNK_SIZE` pieces.
pub fn chunked(ins: u8, flag: u8, path: &DerivationPath, payload: &[u8]) -> Vec<Vec<u8>> {
    let splits: Vec<usize> = (1..payload.len().div_ceil(CHUNK_SIZE))
        .map(|i| i * CHUNK_SIZE)
        .collect();
    sequence(ins, flag, path, payload, &splits)
}

/// Sends every command, requiring all but the last to succeed with no data.
pub fn run_sequence(d: &mut Dispatcher<MockPlatform>, commands: &[Vec<u8>]) -> Response {
    let (final_command, rest) = commands.split_last().unwrap();
    for command in rest {
        let response = d.handle(command);
        assert!(response.is_ok(), "fragment failed with {:04X}", response.status);
        assert!(response.data.is_empty());
    }
    d.handle(final_command)
}

pub fn transfer_args(to: [u8; 32], memo: u64) -> Vec<u8> {
    to_bytes(&SendArgs {
        memo,
        amount_e8s: Some(250_000_000),
        fee_e8s: Some(10_000),
        to: to.to_vec(),
        ..Default::default()
    })
    .unwrap()
}

pub fn transfer_envelope(sender: &[u8], to: [u8; 32], memo: u64) -> Envelope {
    Envelope {
        request_type: REQUEST_TYPE_CALL.to_string(),
        sender: sender.to_vec(),
        ingress_expiry: 1_700_000_000_000_000_000,
        canister_id: Some(LEDGER_CANISTER_ID.to_vec()),
        method_name: Some(METHOD_SEND.to_string()),
        arg: Some(transfer_args(to, memo)),
        ..Default::default()
    }
}

pub fn transfer(sender: &[u8], to: [u8; 32], memo: u64) -> Vec<u8> {
    to_bytes(&transfer_envelope(sender, to, memo)).unwrap()
}
