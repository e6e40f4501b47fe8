//! Multi-fragment transaction assembly.
//!
//! A transaction arrives as one Init fragment carrying the derivation path,
//! followed by Append fragments and a final Last fragment. Any failure
//! discards the partial transaction; the host has to start again with Init.
//!
//! # Security
//!
//! - The stake flag declared at Init cannot be dropped mid-sequence
//! - Buffer contents are zeroized whenever the assembly is reset

use icp_common::opcodes::{SignFlag, OFFSET_DATA, OFFSET_P2, OFFSET_PAYLOAD_TYPE};
use icp_common::{DerivationPath, PayloadType, SpecialTransfer, StatusWord};
use num_traits::FromPrimitive;
use zeroize::Zeroize;

use crate::config::Mode;
use crate::path;

/// Result of a successfully processed fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Init accepted; the buffer is empty and the path is set.
    Initialized,
    /// Payload appended; more fragments expected.
    Appended,
    /// Last fragment appended; the buffer holds the whole transaction.
    Complete,
}

/// Assembly state of the current transaction.
pub struct ChunkAssembler {
    initialized: bool,
    special_transfer: SpecialTransfer,
    buffer: Vec<u8>,
    capacity: usize,
    path: Option<DerivationPath>,
}

impl ChunkAssembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            initialized: false,
            special_transfer: SpecialTransfer::Normal,
            buffer: Vec::with_capacity(capacity),
            capacity,
            path: None,
        }
    }

    /// Processes one fragment.
    ///
    /// On error the assembly is back to idle before this returns.
    pub fn process_chunk(&mut self, command: &[u8], mode: Mode) -> Result<ChunkOutcome, StatusWord> {
        let result = self.step(command, mode);
        if let Err(sw) = result {
            log::debug!("chunk: fragment refused with {}, resetting", sw);
            self.reset();
        }
        result
    }

    fn step(&mut self, command: &[u8], mode: Mode) -> Result<ChunkOutcome, StatusWord> {
        if command.len() < OFFSET_DATA {
            return Err(StatusWord::WrongLength);
        }

        let flag = SignFlag::from_u8(command[OFFSET_P2]).ok_or(StatusWord::DataInvalid)?;

        match PayloadType::from_u8(command[OFFSET_PAYLOAD_TYPE]) {
            Some(PayloadType::Init) => {
                self.reset();
                let path = path::validate(command, OFFSET_DATA, mode)?;
                self.path = Some(path);
                self.special_transfer = SpecialTransfer::from_flag(flag);
                self.initialized = true;
                log::debug!(
                    "chunk: init {} ({:?})",
                    path,
                    self.special_transfer
                );
                Ok(ChunkOutcome::Initialized)
            }
            Some(PayloadType::Append) => {
                self.append(command, flag)?;
                Ok(ChunkOutcome::Appended)
            }
            Some(PayloadType::Last) => {
                self.append(command, flag)?;
                log::debug!("chunk: transaction complete, {} bytes", self.buffer.len());
                Ok(ChunkOutcome::Complete)
            }
            None => Err(StatusWord::InvalidP1P2),
        }
    }

    fn append(&mut self, command: &[u8], flag: SignFlag) -> Result<(), StatusWord> {
        if !self.initialized {
            return Err(StatusWord::TxNotInitialized);
        }
        // A stake sequence must keep the flag; a normal one may set it.
        if self.special_transfer.is_stake() && flag != SignFlag::StakeTx {
            return Err(StatusWord::DataInvalid);
        }

        let payload = &command[OFFSET_DATA..];
        if self.buffer.len() + payload.len() > self.capacity {
            return Err(StatusWord::OutputBufferTooSmall);
        }
        self.buffer.extend_from_slice(payload);
        Ok(())
    }

    /// Returns to idle and wipes the buffer.
    pub fn reset(&mut self) {
        self.buffer.zeroize();
        self.initialized = false;
        self.special_transfer = SpecialTransfer::Normal;
        self.path = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn special_transfer(&self) -> SpecialTransfer {
        self.special_transfer
    }

    /// Assembled bytes so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Path set by the last accepted Init.
    pub fn path(&self) -> Option<&DerivationPath> {
        self.path.as_ref()
    }
}

impl Drop for ChunkAssembler {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use icp_common::opcodes::CLA;
    use icp_common::Instruction;

    const PATH: [u8; 20] = hex!("2c000080 df000080 00000080 00000000 00000000");

    fn fragment(payload_type: u8, flag: u8, data: &[u8]) -> Vec<u8> {
        let mut cmd = vec![
            CLA,
            Instruction::SignSecp256k1 as u8,
            payload_type,
            flag,
            data.len() as u8,
        ];
        cmd.extend_from_slice(data);
        cmd
    }

    fn init(flag: u8) -> Vec<u8> {
        fragment(0, flag, &PATH)
    }

    #[test]
    fn test_init_append_last() {
        let mut asm = ChunkAssembler::new(64);
        assert_eq!(asm.process_chunk(&init(0), Mode::Normal), Ok(ChunkOutcome::Initialized));
        assert!(asm.is_initialized());
        assert_eq!(asm.path().unwrap().to_path_string(), "m/44'/223'/0'/0/0");

        assert_eq!(
            asm.process_chunk(&fragment(1, 0, &[1, 2, 3]), Mode::Normal),
            Ok(ChunkOutcome::Appended)
        );
        assert_eq!(
            asm.process_chunk(&fragment(2, 0, &[4, 5]), Mode::Normal),
            Ok(ChunkOutcome::Complete)
        );
        assert_eq!(asm.buffer(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_short_command() {
        let mut asm = ChunkAssembler::new(64);
        assert_eq!(
            asm.process_chunk(&[CLA, 0x02, 0x00, 0x00], Mode::Normal),
            Err(StatusWord::WrongLength)
        );
    }

    #[test]
    fn test_append_before_init() {
        let mut asm = ChunkAssembler::new(64);
        assert_eq!(
            asm.process_chunk(&fragment(1, 0, &[1]), Mode::Normal),
            Err(StatusWord::TxNotInitialized)
        );
        assert_eq!(
            asm.process_chunk(&fragment(2, 0, &[1]), Mode::Normal),
            Err(StatusWord::TxNotInitialized)
        );
        // Uninitialized wins over the stake flag
        assert_eq!(
            asm.process_chunk(&fragment(1, 1, &[1]), Mode::Normal),
            Err(StatusWord::TxNotInitialized)
        );
    }

    #[test]
    fn test_invalid_flag_rejected_before_type() {
        let mut asm = ChunkAssembler::new(64);
        asm.process_chunk(&init(0), Mode::Normal).unwrap();
        assert_eq!(
            asm.process_chunk(&fragment(7, 2, &[]), Mode::Normal),
            Err(StatusWord::DataInvalid)
        );
        assert!(!asm.is_initialized());
    }

    #[test]
    fn test_unknown_payload_type_resets() {
        let mut asm = ChunkAssembler::new(64);
        asm.process_chunk(&init(0), Mode::Normal).unwrap();
        asm.process_chunk(&fragment(1, 0, &[9; 4]), Mode::Normal).unwrap();
        assert_eq!(
            asm.process_chunk(&fragment(3, 0, &[]), Mode::Normal),
            Err(StatusWord::InvalidP1P2)
        );
        assert!(!asm.is_initialized());
        assert!(asm.buffer().is_empty());
    }

    #[test]
    fn test_stake_flag_must_persist() {
        let mut asm = ChunkAssembler::new(64);
        asm.process_chunk(&init(1), Mode::Normal).unwrap();
        assert_eq!(asm.special_transfer(), SpecialTransfer::NeuronStake);
        assert_eq!(
            asm.process_chunk(&fragment(1, 0, &[1]), Mode::Normal),
            Err(StatusWord::DataInvalid)
        );
        assert!(!asm.is_initialized());
        assert_eq!(asm.special_transfer(), SpecialTransfer::Normal);
        assert_eq!(
            asm.process_chunk(&fragment(1, 1, &[1]), Mode::Normal),
            Err(StatusWord::TxNotInitialized)
        );
    }

    #[test]
    fn test_normal_sequence_accepts_stake_flag() {
        let mut asm = ChunkAssembler::new(64);
        asm.process_chunk(&init(0), Mode::Normal).unwrap();
        assert_eq!(
            asm.process_chunk(&fragment(1, 1, &[1]), Mode::Normal),
            Ok(ChunkOutcome::Appended)
        );
        assert_eq!(asm.special_transfer(), SpecialTransfer::Normal);
    }

    #[test]
    fn test_overflow() {
        let mut asm = ChunkAssembler::new(8);
        asm.process_chunk(&init(0), Mode::Normal).unwrap();
        asm.process_chunk(&fragment(1, 0, &[0; 8]), Mode::Normal).unwrap();
        assert_eq!(
            asm.process_chunk(&fragment(2, 0, &[0]), Mode::Normal),
            Err(StatusWord::OutputBufferTooSmall)
        );
        assert!(!asm.is_initialized());
        assert!(asm.buffer().is_empty());
    }

    #[test]
    fn test_init_restarts_and_bad_path_leaves_idle() {
        let mut asm = ChunkAssembler::new(64);
        asm.process_chunk(&init(1), Mode::Normal).unwrap();
        asm.process_chunk(&fragment(1, 1, &[1, 2]), Mode::Normal).unwrap();

        asm.process_chunk(&init(0), Mode::Normal).unwrap();
        assert!(asm.buffer().is_empty());
        assert_eq!(asm.special_transfer(), SpecialTransfer::Normal);

        let bad = hex!("2c000080 3c000080 00000080 00000000 00000000");
        assert_eq!(
            asm.process_chunk(&fragment(0, 0, &bad), Mode::Expert),
            Err(StatusWord::DataInvalid)
        );
        assert!(!asm.is_initialized());
        assert!(asm.path().is_none());

        assert_eq!(
            asm.process_chunk(&fragment(0, 0, &PATH[..16]), Mode::Normal),
            Err(StatusWord::WrongLength)
        );
    }
}
