//! Identity encodings and the software key store.
//!
//! This module provides:
//! - Self-authenticating principals and their textual form
//! - Ledger account identifiers
//! - Neuron staking subaccounts
//! - Request ids and signing digests
//! - A BIP32 software key store used by the host platform
//!
//! # Security
//!
//! - Seeds and derived private keys are zeroized on drop
//! - Only the host platform derives keys here; device builds provide their
//!   own [`crate::platform::Platform`]

use icp_common::types::{
    ACCOUNT_ID_LEN, GOVERNANCE_CANISTER_ID, HARDENED, PK_LEN_SECP256K1, PRINCIPAL_LEN,
    SIG_RS_LEN, SUBACCOUNT_LEN,
};
use icp_common::{DerivationPath, StatusWord};
use k256::{
    ecdsa::{RecoveryId, Signature as K256Signature, SigningKey},
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey,
};
use sha2::{Digest, Sha224, Sha256};
use zeroize::Zeroize;

pub type Hash256 = [u8; 32];
pub type AccountId = [u8; ACCOUNT_ID_LEN];
pub type Principal = [u8; PRINCIPAL_LEN];

/// DER header of an uncompressed secp256k1 SubjectPublicKeyInfo.
const SECP256K1_DER_PREFIX: [u8; 23] = [
    0x30, 0x56, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05,
    0x2b, 0x81, 0x04, 0x00, 0x0a, 0x03, 0x42, 0x00,
];

/// Trailing byte of a self-authenticating principal.
const SELF_AUTHENTICATING_TAG: u8 = 0x02;

const ACCOUNT_DOMAIN_SEPARATOR: &[u8] = b"\x0Aaccount-id";
const NEURON_STAKE_DOMAIN_SEPARATOR: &[u8] = b"\x0Cneuron-stake";
const REQUEST_DOMAIN_SEPARATOR: &[u8] = b"\x0Aic-request";

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

// =============================================================================
// Hashing
// =============================================================================

pub fn sha256(data: &[u8]) -> Hash256 {
    Sha256::digest(data).into()
}

// =============================================================================
// Principals
// =============================================================================

/// Self-authenticating principal of an uncompressed secp256k1 public key.
pub fn principal_from_public_key(public_key: &[u8; PK_LEN_SECP256K1]) -> Principal {
    let mut hasher = Sha224::new();
    hasher.update(SECP256K1_DER_PREFIX);
    hasher.update(public_key);
    let hash = hasher.finalize();

    let mut principal = [0u8; PRINCIPAL_LEN];
    principal[..PRINCIPAL_LEN - 1].copy_from_slice(&hash);
    principal[PRINCIPAL_LEN - 1] = SELF_AUTHENTICATING_TAG;
    principal
}

/// Textual form: base32 of `crc32 || principal`, dash-separated every five
/// characters.
pub fn principal_to_text(principal: &[u8]) -> String {
    let mut data = Vec::with_capacity(4 + principal.len());
    data.extend_from_slice(&crc32fast::hash(principal).to_be_bytes());
    data.extend_from_slice(principal);

    let encoded = base32_lower(&data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 5);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % 5 == 0 {
            out.push('-');
        }
        out.push(c);
    }
    out
}

/// RFC 4648 base32, lowercase, without padding.
fn base32_lower(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u16 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u16;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

// =============================================================================
// Accounts
// =============================================================================

/// Ledger account identifier: `crc32(h) || h`, with
/// `h = sha224("\x0Aaccount-id" || principal || subaccount)`.
///
/// A missing subaccount is the all-zero default subaccount.
pub fn account_identifier(principal: &[u8], subaccount: Option<&[u8; SUBACCOUNT_LEN]>) -> AccountId {
    let default_subaccount = [0u8; SUBACCOUNT_LEN];
    let mut hasher = Sha224::new();
    hasher.update(ACCOUNT_DOMAIN_SEPARATOR);
    hasher.update(principal);
    hasher.update(subaccount.unwrap_or(&default_subaccount));
    let hash = hasher.finalize();

    let mut account = [0u8; ACCOUNT_ID_LEN];
    account[..4].copy_from_slice(&crc32fast::hash(&hash).to_be_bytes());
    account[4..].copy_from_slice(&hash);
    account
}

/// Governance subaccount that funds a new neuron of `controller`.
pub fn neuron_stake_subaccount(controller: &[u8], memo: u64) -> [u8; SUBACCOUNT_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(NEURON_STAKE_DOMAIN_SEPARATOR);
    hasher.update(controller);
    hasher.update(memo.to_be_bytes());
    hasher.finalize().into()
}

/// Account a neuron stake transfer must be sent to.
pub fn neuron_stake_account(controller: &[u8], memo: u64) -> AccountId {
    let subaccount = neuron_stake_subaccount(controller, memo);
    account_identifier(&GOVERNANCE_CANISTER_ID, Some(&subaccount))
}

// =============================================================================
// Requests
// =============================================================================

/// Identifier of an encoded request.
pub fn request_id(encoded: &[u8]) -> Hash256 {
    sha256(encoded)
}

/// Digest handed to the signer: `sha256("\x0Aic-request" || request_id)`.
pub fn signing_digest(request_id: &Hash256) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(REQUEST_DOMAIN_SEPARATOR);
    hasher.update(request_id);
    hasher.finalize().into()
}

// =============================================================================
// Software key store
// =============================================================================

/// Seed for key derivation.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Seed of the standard test mnemonic ("abandon abandon ... about").
    ///
    /// WARNING: NEVER use this in production!
    pub fn test_seed() -> Self {
        Self([
            0x5e, 0xb0, 0x0b, 0xbd, 0xdc, 0xf0, 0x69, 0x08, 0x48, 0x89, 0xa8, 0xab, 0x91, 0x55,
            0x56, 0x81, 0x65, 0xf5, 0xc4, 0x53, 0xcc, 0xb8, 0x5e, 0x70, 0x81, 0x1a, 0xae, 0xd6,
            0xf6, 0xda, 0x5f, 0xc1, 0x9a, 0x5a, 0xc4, 0x0b, 0x38, 0x9c, 0xd3, 0x70, 0xd0, 0x86,
            0x20, 0x6d, 0xec, 0x8a, 0xa6, 0xc4, 0x3d, 0xae, 0xa6, 0x69, 0x0f, 0x20, 0xad, 0x3d,
            0x8d, 0x48, 0xb2, 0xd2, 0xce, 0x9e, 0x38, 0xe4,
        ])
    }
}

/// Recoverable secp256k1 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub rs: [u8; SIG_RS_LEN],
    pub recovery_id: u8,
}

impl Signature {
    /// `r || s || v`
    pub fn to_bytes(&self) -> [u8; SIG_RS_LEN + 1] {
        let mut out = [0u8; SIG_RS_LEN + 1];
        out[..SIG_RS_LEN].copy_from_slice(&self.rs);
        out[SIG_RS_LEN] = self.recovery_id;
        out
    }
}

/// Derives the signing key at `path`.
pub fn derive_signing_key(seed: &Seed, path: &DerivationPath) -> Result<SigningKey, StatusWord> {
    use bip32::{ChildNumber, XPrv};

    let mut xprv = XPrv::new(seed.as_bytes()).map_err(|_| StatusWord::ExecutionError)?;

    for &component in path.components() {
        let child = if component & HARDENED != 0 {
            ChildNumber::new(component & !HARDENED, true)
        } else {
            ChildNumber::new(component, false)
        }
        .map_err(|_| StatusWord::DataInvalid)?;
        xprv = xprv.derive_child(child).map_err(|_| StatusWord::ExecutionError)?;
    }

    Ok(xprv.private_key().clone())
}

/// Uncompressed public key (`0x04 || x || y`).
pub fn public_key_uncompressed(signing_key: &SigningKey) -> [u8; PK_LEN_SECP256K1] {
    let public_key: PublicKey = signing_key.verifying_key().into();
    let encoded = public_key.to_encoded_point(false);
    let mut out = [0u8; PK_LEN_SECP256K1];
    out.copy_from_slice(encoded.as_bytes());
    out
}

/// Signs a 32-byte digest; k256 produces low-S signatures.
pub fn sign_digest(signing_key: &SigningKey, digest: &Hash256) -> Result<Signature, StatusWord> {
    let (sig, recid): (K256Signature, RecoveryId) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|_| StatusWord::SignVerifyError)?;

    let mut rs = [0u8; SIG_RS_LEN];
    rs.copy_from_slice(&sig.to_bytes());
    Ok(Signature {
        rs,
        recovery_id: recid.to_byte(),
    })
}
