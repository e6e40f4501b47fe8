//! Derivation path acceptance policy.
//!
//! The network prefix is always checked. The hardening policy (hardened
//! account below 256, zero change, unhardened index below 256) only applies
//! outside expert mode.

use icp_common::types::{HDPATH_RESTRICTED_MASK, HDPATH_SERIALIZED_LEN, HARDENED};
use icp_common::{DerivationPath, StatusWord};

use crate::config::Mode;

/// Reads a path from `raw[offset..]` and checks it against the policy.
///
/// Never mutates anything; callers decide what to do with the path.
pub fn validate(raw: &[u8], offset: usize, mode: Mode) -> Result<DerivationPath, StatusWord> {
    let available = raw.len().checked_sub(offset).ok_or(StatusWord::WrongLength)?;
    if available < HDPATH_SERIALIZED_LEN {
        return Err(StatusWord::WrongLength);
    }

    let mut bytes = [0u8; HDPATH_SERIALIZED_LEN];
    bytes.copy_from_slice(&raw[offset..offset + HDPATH_SERIALIZED_LEN]);
    let path = DerivationPath::from_le_bytes(&bytes);

    check_policy(&path, mode)?;
    Ok(path)
}

/// Applies the network and hardening rules to an already decoded path.
pub fn check_policy(path: &DerivationPath, mode: Mode) -> Result<(), StatusWord> {
    if !path.is_mainnet() && !path.is_testnet() {
        log::warn!("path: unknown network prefix in {}", path);
        return Err(StatusWord::DataInvalid);
    }

    if !is_restricted(path) && !mode.is_expert() {
        log::warn!("path: {} violates the hardening policy", path);
        return Err(StatusWord::DataInvalid);
    }

    Ok(())
}

fn is_restricted(path: &DerivationPath) -> bool {
    let c = path.components();
    (c[2] & HDPATH_RESTRICTED_MASK) == HARDENED
        && c[3] == 0
        && (c[4] & HDPATH_RESTRICTED_MASK) == 0
}
