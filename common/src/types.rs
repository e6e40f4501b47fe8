//! Core types shared by the app and the client.

use alloc::string::String;
use core::fmt::{self, Write};

use crate::opcodes::SignFlag;

/// Components in a derivation path.
pub const HDPATH_LEN_DEFAULT: usize = 5;
/// Serialized size of a derivation path.
pub const HDPATH_SERIALIZED_LEN: usize = HDPATH_LEN_DEFAULT * 4;

pub const HARDENED: u32 = 0x8000_0000;

/// Mainnet prefix: m/44'/223'
pub const HDPATH_0_DEFAULT: u32 = HARDENED | 44;
pub const HDPATH_1_DEFAULT: u32 = HARDENED | 223;

/// Testnet prefix: m/44'/1'
pub const HDPATH_0_TESTNET: u32 = HARDENED | 44;
pub const HDPATH_1_TESTNET: u32 = HARDENED | 1;

/// Keeps the hardened bit and the index bits above 255.
pub const HDPATH_RESTRICTED_MASK: u32 = 0xFFFF_FF00;

pub const SENDER_MAX_LEN: usize = 29;
pub const CANISTER_MAX_LEN: usize = 10;
pub const REQUEST_MAX_LEN: usize = 10;
pub const METHOD_MAX_LEN: usize = 20;
pub const NONCE_MAX_LEN: usize = 32;
pub const ARG_MAX_LEN: usize = 200;
pub const PATH_MAX_LEN: usize = 40;
pub const PATH_MAX_ARRAY: usize = 2;

/// Self-authenticating principal length.
pub const PRINCIPAL_LEN: usize = 29;
/// Account identifier length (checksum + hash).
pub const ACCOUNT_ID_LEN: usize = 32;
pub const SUBACCOUNT_LEN: usize = 32;
/// Uncompressed secp256k1 public key.
pub const PK_LEN_SECP256K1: usize = 65;
pub const SIG_RS_LEN: usize = 64;
/// Request id lookups are 32-byte hashes.
pub const REQUEST_ID_LEN: usize = 32;

/// Ledger canister (ryjl3-tyaaa-aaaaa-aaaba-cai).
pub const LEDGER_CANISTER_ID: [u8; 10] = [0, 0, 0, 0, 0, 0, 0, 2, 1, 1];
/// Governance canister (rrkah-fqaaa-aaaaa-aaaaq-cai).
pub const GOVERNANCE_CANISTER_ID: [u8; 10] = [0, 0, 0, 0, 0, 0, 0, 1, 1, 1];

/// Transaction flow declared by the fragment flag at Init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialTransfer {
    #[default]
    Normal,
    NeuronStake,
}

impl SpecialTransfer {
    /// Flow declared by the Init fragment's flag.
    pub fn from_flag(flag: SignFlag) -> Self {
        match flag {
            SignFlag::StakeTx => SpecialTransfer::NeuronStake,
            SignFlag::Default => SpecialTransfer::Normal,
        }
    }

    pub fn is_stake(self) -> bool {
        matches!(self, SpecialTransfer::NeuronStake)
    }
}

/// Errors from parsing a textual derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathParseError {
    /// Path does not start with `m`.
    MissingRoot,
    /// Wrong number of components.
    WrongLength,
    /// Component is not a number.
    NotANumber,
    /// Component index already has the hardened bit set.
    IndexTooLarge,
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathParseError::MissingRoot => write!(f, "Path should start with \"m\""),
            PathParseError::WrongLength => write!(f, "Invalid path length"),
            PathParseError::NotANumber => write!(f, "Path component is not a number"),
            PathParseError::IndexTooLarge => {
                write!(f, "Incorrect child value (bigger or equal to 0x80000000)")
            }
        }
    }
}

/// A BIP32 derivation path of exactly five components.
///
/// Hardened indices carry the `0x80000000` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivationPath(pub [u32; HDPATH_LEN_DEFAULT]);

impl DerivationPath {
    pub const fn new(components: [u32; HDPATH_LEN_DEFAULT]) -> Self {
        Self(components)
    }

    /// Decodes five little-endian u32 components.
    pub fn from_le_bytes(bytes: &[u8; HDPATH_SERIALIZED_LEN]) -> Self {
        let mut components = [0u32; HDPATH_LEN_DEFAULT];
        for (component, chunk) in components.iter_mut().zip(bytes.chunks_exact(4)) {
            *component = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(components)
    }

    pub fn to_le_bytes(&self) -> [u8; HDPATH_SERIALIZED_LEN] {
        let mut out = [0u8; HDPATH_SERIALIZED_LEN];
        for (chunk, component) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            chunk.copy_from_slice(&component.to_le_bytes());
        }
        out
    }

    pub fn components(&self) -> &[u32; HDPATH_LEN_DEFAULT] {
        &self.0
    }

    pub fn is_mainnet(&self) -> bool {
        self.0[0] == HDPATH_0_DEFAULT && self.0[1] == HDPATH_1_DEFAULT
    }

    pub fn is_testnet(&self) -> bool {
        self.0[0] == HDPATH_0_TESTNET && self.0[1] == HDPATH_1_TESTNET
    }

    /// Parses `m/44'/223'/0'/0/0`.
    pub fn parse(path: &str) -> Result<Self, PathParseError> {
        let mut parts = path.split('/');
        if parts.next() != Some("m") {
            return Err(PathParseError::MissingRoot);
        }

        let mut components = [0u32; HDPATH_LEN_DEFAULT];
        let mut count = 0;
        for part in parts {
            if count == HDPATH_LEN_DEFAULT {
                return Err(PathParseError::WrongLength);
            }
            let (digits, hardened) = match part.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits.parse().map_err(|_| PathParseError::NotANumber)?;
            if index >= HARDENED {
                return Err(PathParseError::IndexTooLarge);
            }
            components[count] = if hardened { index | HARDENED } else { index };
            count += 1;
        }
        if count != HDPATH_LEN_DEFAULT {
            return Err(PathParseError::WrongLength);
        }
        Ok(Self(components))
    }

    /// Renders the path as a string.
    pub fn to_path_string(&self) -> String {
        let mut out = String::with_capacity(32);
        let _ = write!(out, "{}", self);
        out
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for &component in &self.0 {
            if component & HARDENED != 0 {
                write!(f, "/{}'", component & !HARDENED)?;
            } else {
                write!(f, "/{}", component)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_path_parse_and_display() {
        let path = DerivationPath::parse("m/44'/223'/0'/0/3").unwrap();
        assert_eq!(
            path.components(),
            &[HDPATH_0_DEFAULT, HDPATH_1_DEFAULT, HARDENED, 0, 3]
        );
        assert!(path.is_mainnet());
        assert_eq!(path.to_path_string(), "m/44'/223'/0'/0/3");
    }

    #[test]
    fn test_path_parse_errors() {
        assert_eq!(
            DerivationPath::parse("44'/223'/0'/0/0"),
            Err(PathParseError::MissingRoot)
        );
        assert_eq!(
            DerivationPath::parse("m/44'/223'/0'/0"),
            Err(PathParseError::WrongLength)
        );
        assert_eq!(
            DerivationPath::parse("m/44'/223'/0'/0/0/0"),
            Err(PathParseError::WrongLength)
        );
        assert_eq!(
            DerivationPath::parse("m/44'/x'/0'/0/0"),
            Err(PathParseError::NotANumber)
        );
        assert_eq!(
            DerivationPath::parse("m/44'/223'/2147483648/0/0"),
            Err(PathParseError::IndexTooLarge)
        );
    }

    #[test]
    fn test_path_le_bytes() {
        let path = DerivationPath::parse("m/44'/223'/5'/0/3").unwrap();
        let bytes = path.to_le_bytes();
        assert_eq!(
            bytes,
            hex!("2c000080 df000080 05000080 00000000 03000000")
        );
        assert_eq!(DerivationPath::from_le_bytes(&bytes), path);
    }

    #[test]
    fn test_special_transfer_flag() {
        assert_eq!(SpecialTransfer::from_flag(SignFlag::Default), SpecialTransfer::Normal);
        assert!(SpecialTransfer::from_flag(SignFlag::StakeTx).is_stake());
    }
}
