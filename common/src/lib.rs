//! Common types for the ICP transaction review app.
//!
//! This crate provides the types shared by the device-side engine
//! (`icp-app`) and the host-side client (`icp-client`):
//! - status words and internal parser error codes
//! - instruction, payload-type and offset constants of the command channel
//! - the derivation path type
//! - the wire records a transaction is serialized into
//!
//! # Security Note
//!
//! Everything here describes data that crosses the trust boundary.
//! The device re-validates every field after decoding.

#![no_std]

extern crate alloc;

pub mod error;
pub mod opcodes;
pub mod types;
pub mod wire;

pub use error::{ParserError, StatusWord};
pub use opcodes::{Instruction, PayloadType};
pub use types::{DerivationPath, SpecialTransfer};

/// Application name reported to the host.
pub const APP_NAME: &str = "Internet Computer";

/// Ticker used when rendering amounts.
pub const TICKER: &str = "ICP";
