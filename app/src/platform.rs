//! Platform abstraction layer.
//!
//! The engine depends on the device for three things it cannot do itself:
//! - Key custody: public keys and signatures at a derivation path
//! - Display: walking the owner through a review and reading the verdict
//! - Notifications: brief success/failure messages
//!
//! # Design
//!
//! Device builds implement [`Platform`] over their own key store and
//! screen. [`MockPlatform`] backs the host binary and the tests with a
//! BIP32 software key store.

use std::sync::Mutex;

use icp_common::types::PK_LEN_SECP256K1;
use icp_common::{DerivationPath, StatusWord};

use crate::config::Mode;
use crate::crypto::{self, Hash256, Seed, Signature};
use crate::error::AppError;
use crate::review::{collect_items, ReviewSource};

/// Platform abstraction trait.
pub trait Platform {
    /// Uncompressed secp256k1 public key at `path`.
    fn public_key(&self, path: &DerivationPath) -> Result<[u8; PK_LEN_SECP256K1], AppError>;

    /// Signs a 32-byte digest with the key at `path`.
    fn sign(&self, path: &DerivationPath, digest: &Hash256) -> Result<Signature, AppError>;

    /// Shows a review to the owner; `Ok(true)` when approved.
    fn review(&self, source: &dyn ReviewSource, mode: Mode) -> Result<bool, AppError>;

    /// Show a brief info message (success/failure).
    fn show_info(&self, success: bool, message: &str);

    /// Whether the device is locked.
    fn device_locked(&self) -> bool {
        false
    }
}

// =============================================================================
// Mock Platform (for host testing)
// =============================================================================

/// Host platform over a software key store.
///
/// Every review is recorded with its pages joined, so tests can check
/// exactly what the owner would have seen.
pub struct MockPlatform {
    seed: Seed,
    auto_approve: bool,
    locked: bool,
    reviews: Mutex<Vec<Vec<(String, String)>>>,
    infos: Mutex<Vec<(bool, String)>>,
}

impl MockPlatform {
    /// Create a new mock platform over the test seed, approving everything.
    pub fn new() -> Self {
        Self::with_seed(Seed::test_seed())
    }

    pub fn with_seed(seed: Seed) -> Self {
        Self {
            seed,
            auto_approve: true,
            locked: false,
            reviews: Mutex::new(Vec::new()),
            infos: Mutex::new(Vec::new()),
        }
    }

    /// Set whether reviews are approved.
    pub fn set_auto_approve(&mut self, approve: bool) {
        self.auto_approve = approve;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Number of reviews shown so far.
    pub fn review_count(&self) -> usize {
        self.reviews.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Items of the most recent review.
    pub fn last_review(&self) -> Option<Vec<(String, String)>> {
        self.reviews.lock().ok().and_then(|r| r.last().cloned())
    }

    /// Info messages shown so far.
    pub fn infos(&self) -> Vec<(bool, String)> {
        self.infos.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

impl Platform for MockPlatform {
    fn public_key(&self, path: &DerivationPath) -> Result<[u8; PK_LEN_SECP256K1], AppError> {
        let key = crypto::derive_signing_key(&self.seed, path)?;
        Ok(crypto::public_key_uncompressed(&key))
    }

    fn sign(&self, path: &DerivationPath, digest: &Hash256) -> Result<Signature, AppError> {
        let key = crypto::derive_signing_key(&self.seed, path)?;
        Ok(crypto::sign_digest(&key, digest)?)
    }

    fn review(&self, source: &dyn ReviewSource, mode: Mode) -> Result<bool, AppError> {
        let items = collect_items(source, mode)?;
        log::info!("platform: review ({} items)", items.len());
        for (key, value) in &items {
            log::info!("  {}: {}", key, value);
        }
        self.reviews
            .lock()
            .map_err(|_| StatusWord::ExecutionError)?
            .push(items);

        #[cfg(feature = "autoapprove")]
        {
            if !self.auto_approve {
                log::warn!("platform: rejection ignored in an autoapprove build");
            }
            log::info!("platform: auto-approving review");
            Ok(true)
        }

        #[cfg(not(feature = "autoapprove"))]
        {
            if self.auto_approve {
                log::info!("platform: approved");
            } else {
                log::info!("platform: rejected");
            }
            Ok(self.auto_approve)
        }
    }

    fn show_info(&self, success: bool, message: &str) {
        if success {
            log::info!("platform: SUCCESS - {}", message);
        } else {
            log::info!("platform: FAILURE - {}", message);
        }
        if let Ok(mut infos) = self.infos.lock() {
            infos.push((success, message.to_string()));
        }
    }

    fn device_locked(&self) -> bool {
        self.locked
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}
