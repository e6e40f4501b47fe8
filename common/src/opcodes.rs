//! Command channel layout and instruction codes.
//!
//! A command is `CLA INS P1 P2 LC DATA...`. For the signing instructions P1
//! carries the fragment type and P2 the stake flag.

use num_derive::{FromPrimitive, ToPrimitive};

/// Class byte of every app command.
pub const CLA: u8 = 0x11;

pub const OFFSET_CLA: usize = 0;
pub const OFFSET_INS: usize = 1;
pub const OFFSET_P1: usize = 2;
pub const OFFSET_P2: usize = 3;
/// First payload byte; also the minimum length of a fragment.
pub const OFFSET_DATA: usize = 5;

/// Fragment type is carried in P1.
pub const OFFSET_PAYLOAD_TYPE: usize = OFFSET_P1;

/// Device-info request, answered before any app logic runs.
pub const DEVICE_INFO_COMMAND: [u8; 4] = [0xE0, 0x01, 0x00, 0x00];

/// Maximum payload bytes the client puts in one fragment.
pub const CHUNK_SIZE: usize = 250;

/// Instructions understood by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Returns version and lock state.
    GetVersion = 0x00,
    /// Returns (and optionally shows) the public key, principal and address.
    GetAddrSecp256k1 = 0x01,
    /// Signs a transaction delivered in fragments.
    SignSecp256k1 = 0x02,
    /// Signs a transaction together with its status request.
    SignCombined = 0x03,
}

/// Fragment type in P1 of the signing instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum PayloadType {
    /// Starts a new transaction; carries the derivation path.
    Init = 0x00,
    /// Adds bytes to the transaction.
    Append = 0x01,
    /// Adds the final bytes and completes the transaction.
    Last = 0x02,
}

/// P1 values of GET_ADDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum AddressDisplay {
    OnlyRetrieve = 0x00,
    ShowAddressInDevice = 0x01,
}

/// P2 values of the signing instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum SignFlag {
    Default = 0x00,
    StakeTx = 0x01,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};

    #[test]
    fn test_instruction_lookup() {
        assert_eq!(Instruction::from_u8(0x02), Some(Instruction::SignSecp256k1));
        assert_eq!(Instruction::from_u8(0x04), None);
        assert_eq!(PayloadType::Last.to_u8(), Some(2));
        assert_eq!(PayloadType::from_u8(3), None);
    }

    #[test]
    fn test_layout() {
        assert_eq!(OFFSET_PAYLOAD_TYPE, 2);
        assert_eq!(SignFlag::from_u8(1), Some(SignFlag::StakeTx));
        assert_eq!(SignFlag::from_u8(2), None);
    }
}
