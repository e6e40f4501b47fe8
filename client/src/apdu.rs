use icp_common::opcodes::{
    AddressDisplay, SignFlag, CLA, DEVICE_INFO_COMMAND, OFFSET_CLA, OFFSET_INS, OFFSET_P1,
    OFFSET_P2,
};
use icp_common::{Instruction, PayloadType};

/// One command of the device channel (short form, at most 255 data bytes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct APDUCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl APDUCommand {
    pub fn encode(&self) -> Vec<u8> {
        let mut vec = vec![self.cla, self.ins, self.p1, self.p2, self.data.len() as u8];
        vec.extend(self.data.iter());
        vec
    }
}

/// Response data and status word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct APDUAnswer {
    pub data: Vec<u8>,
    pub retcode: u16,
}

impl APDUAnswer {
    /// Splits a raw answer into data and the trailing big-endian status word.
    pub fn from_answer(mut answer: Vec<u8>) -> Option<Self> {
        if answer.len() < 2 {
            return None;
        }
        let tail = answer.split_off(answer.len() - 2);
        Some(Self {
            data: answer,
            retcode: u16::from_be_bytes([tail[0], tail[1]]),
        })
    }
}

pub fn apdu_get_version() -> APDUCommand {
    APDUCommand {
        cla: CLA,
        ins: Instruction::GetVersion as u8,
        p1: 0,
        p2: 0,
        data: vec![],
    }
}

pub fn apdu_get_address(serialized_path: Vec<u8>, display: AddressDisplay) -> APDUCommand {
    APDUCommand {
        cla: CLA,
        ins: Instruction::GetAddrSecp256k1 as u8,
        p1: display as u8,
        p2: 0,
        data: serialized_path,
    }
}

/// One fragment of a signing sequence; `stake` marks a neuron stake flow.
pub fn apdu_sign_chunk(
    ins: Instruction,
    payload_type: PayloadType,
    stake: bool,
    data: Vec<u8>,
) -> APDUCommand {
    let flag = if stake {
        SignFlag::StakeTx
    } else {
        SignFlag::Default
    };
    APDUCommand {
        cla: CLA,
        ins: ins as u8,
        p1: payload_type as u8,
        p2: flag as u8,
        data,
    }
}

/// The device-info request. It is answered outside the app class, so the
/// first four bytes are the fixed command rather than CLA/INS/P1/P2.
pub fn apdu_device_info() -> APDUCommand {
    APDUCommand {
        cla: DEVICE_INFO_COMMAND[OFFSET_CLA],
        ins: DEVICE_INFO_COMMAND[OFFSET_INS],
        p1: DEVICE_INFO_COMMAND[OFFSET_P1],
        p2: DEVICE_INFO_COMMAND[OFFSET_P2],
        data: vec![],
    }
}
