//! Session state.
//!
//! One [`Session`] lives for as long as the device channel is open. It
//! holds:
//! - The application configuration
//! - The current display mode (normal or expert)
//! - The chunk assembler of the transaction in flight
//!
//! # Security
//!
//! - A transaction leaves the session exactly once, on its last chunk
//! - A reset discards any partial assembly

use icp_common::{DerivationPath, SpecialTransfer, StatusWord};

use crate::chunk::{ChunkAssembler, ChunkOutcome};
use crate::config::{AppConfig, Mode};

/// A fully assembled transaction, taken out of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledTransaction {
    pub bytes: Vec<u8>,
    pub path: DerivationPath,
    pub special_transfer: SpecialTransfer,
}

pub struct Session {
    config: AppConfig,
    mode: Mode,
    assembler: ChunkAssembler,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let mode = config.default_mode();
        let assembler = ChunkAssembler::new(config.tx_buffer_capacity);
        Self {
            config,
            mode,
            assembler,
        }
    }

    /// Feeds one fragment to the assembler in the current mode.
    pub fn process_chunk(&mut self, command: &[u8]) -> Result<ChunkOutcome, StatusWord> {
        self.assembler.process_chunk(command, self.mode)
    }

    /// Takes the assembled transaction and returns the assembler to idle.
    pub fn take_assembled(&mut self) -> Result<AssembledTransaction, StatusWord> {
        let path = match self.assembler.path() {
            Some(path) if self.assembler.is_initialized() => *path,
            _ => {
                self.assembler.reset();
                return Err(StatusWord::TxNotInitialized);
            }
        };
        let assembled = AssembledTransaction {
            bytes: self.assembler.buffer().to_vec(),
            path,
            special_transfer: self.assembler.special_transfer(),
        };
        self.assembler.reset();
        Ok(assembled)
    }

    /// Discards any partial assembly.
    pub fn reset(&mut self) {
        log::debug!("session: reset");
        self.assembler.reset();
    }

    /// Device settings toggle.
    pub fn set_expert_mode(&mut self, expert: bool) {
        self.mode = Mode::from_expert(expert);
        log::info!("session: mode {:?}", self.mode);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn assembler(&self) -> &ChunkAssembler {
        &self.assembler
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
