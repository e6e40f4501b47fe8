//! Application configuration.
//!
//! [`AppConfig::default`] is built from constants and Cargo features. The
//! host binary overrides individual fields from its command line.

/// Default capacity of the transaction buffer.
pub const DEFAULT_TX_BUFFER_CAPACITY: usize = 8192;

/// Characters per review page (a 37-byte display buffer minus terminator).
pub const DEFAULT_DISPLAY_WIDTH: usize = 36;

pub const DEFAULT_TARGET_ID: u32 = 0x3110_0004;
pub const DEFAULT_SE_VERSION: &str = "2.1.0";
pub const DEFAULT_MCU_VERSION: &str = "4.03";

/// Review mode.
///
/// Expert mode shows extra items and relaxes the path hardening policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Expert,
}

impl Mode {
    pub fn from_expert(expert: bool) -> Self {
        if expert {
            Mode::Expert
        } else {
            Mode::Normal
        }
    }

    #[inline]
    pub fn is_expert(self) -> bool {
        matches!(self, Mode::Expert)
    }
}

/// Application version reported by GET_VERSION.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl AppVersion {
    /// Version of this crate.
    pub fn current() -> Self {
        Self {
            major: parse_version_part(env!("CARGO_PKG_VERSION_MAJOR")),
            minor: parse_version_part(env!("CARGO_PKG_VERSION_MINOR")),
            patch: parse_version_part(env!("CARGO_PKG_VERSION_PATCH")),
        }
    }
}

fn parse_version_part(part: &str) -> u8 {
    part.parse().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Mode a fresh session starts in.
    pub expert_default: bool,
    /// Maximum assembled transaction size in bytes.
    pub tx_buffer_capacity: usize,
    /// Characters per review page.
    pub display_width: usize,
    pub version: AppVersion,
    /// Reported in GET_VERSION; set for test builds.
    pub test_mode: bool,
    /// Reported by the device-info command.
    pub target_id: u32,
    pub se_version: String,
    pub mcu_version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            expert_default: cfg!(feature = "expert-default"),
            tx_buffer_capacity: DEFAULT_TX_BUFFER_CAPACITY,
            display_width: DEFAULT_DISPLAY_WIDTH,
            version: AppVersion::current(),
            test_mode: cfg!(feature = "autoapprove"),
            target_id: DEFAULT_TARGET_ID,
            se_version: DEFAULT_SE_VERSION.to_string(),
            mcu_version: DEFAULT_MCU_VERSION.to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_mode(&self) -> Mode {
        Mode::from_expert(self.expert_default)
    }
}
