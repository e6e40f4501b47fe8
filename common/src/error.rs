//! Error types for the ICP app.
//!
//! Two vocabularies live here:
//! - [`StatusWord`]: the fixed set of status words the host sees.
//! - [`ParserError`]: internal decode/validate/review codes. Their numeric
//!   values sit outside the status word ranges, so the dispatcher folds them
//!   into a generic processing error that keeps the low bits.

use core::fmt;
use num_derive::{FromPrimitive, ToPrimitive};

/// Status words returned at the end of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum StatusWord {
    /// Command processed.
    Ok = 0x9000,
    /// Device is busy.
    Busy = 0x9001,
    /// Execution error.
    ExecutionError = 0x6400,
    /// Command shorter than its declared layout.
    WrongLength = 0x6700,
    /// Empty command.
    EmptyBuffer = 0x6982,
    /// Assembled transaction exceeds the buffer capacity.
    OutputBufferTooSmall = 0x6983,
    /// Data failed validation.
    DataInvalid = 0x6984,
    /// Conditions not satisfied.
    ConditionsNotSatisfied = 0x6985,
    /// User rejected the operation.
    TransactionRejected = 0x6986,
    /// Append/Last received before Init.
    TxNotInitialized = 0x6987,
    /// Bad key handle.
    BadKeyHandle = 0x6A80,
    /// Unknown P1/P2 value.
    InvalidP1P2 = 0x6B00,
    /// Instruction not supported.
    InsNotSupported = 0x6D00,
    /// Class not supported.
    ClaNotSupported = 0x6E00,
    /// Unknown error.
    Unknown = 0x6F00,
    /// Signing or verification failed.
    SignVerifyError = 0x6F01,
}

impl StatusWord {
    /// Returns the status word as a u16.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Returns true if this is the success status.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, StatusWord::Ok)
    }

    /// Big-endian bytes appended to a response.
    #[inline]
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.code().to_be_bytes()
    }

    /// Host-facing description.
    pub fn description(self) -> &'static str {
        match self {
            StatusWord::Ok => "No errors",
            StatusWord::Busy => "Device is busy",
            StatusWord::ExecutionError => "Execution Error",
            StatusWord::WrongLength => "Wrong Length",
            StatusWord::EmptyBuffer => "Empty Buffer",
            StatusWord::OutputBufferTooSmall => "Output buffer too small",
            StatusWord::DataInvalid => "Data is invalid",
            StatusWord::ConditionsNotSatisfied => "Conditions not satisfied",
            StatusWord::TransactionRejected => "Transaction rejected",
            StatusWord::TxNotInitialized => "Transaction not initialized",
            StatusWord::BadKeyHandle => "Bad key handle",
            StatusWord::InvalidP1P2 => "Invalid P1/P2",
            StatusWord::InsNotSupported => "Instruction not supported",
            StatusWord::ClaNotSupported => "App does not seem to be open",
            StatusWord::Unknown => "Unknown error",
            StatusWord::SignVerifyError => "Sign/verify error",
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.description(), self.code())
    }
}

/// Internal errors raised while decoding, validating or rendering a
/// transaction.
///
/// Messages are terse on purpose; they are returned to the host verbatim
/// when a transaction is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum ParserError {
    /// Requested review item does not exist.
    NoData = 0x01,
    /// Display index out of range.
    DisplayIdxOutOfRange = 0x02,
    /// Display page out of range.
    DisplayPageOutOfRange = 0x03,
    /// Unexpected internal error.
    UnexpectedError = 0x04,
    /// Buffer is empty.
    ContextEmpty = 0x05,
    /// Buffer ended early or carried trailing bytes.
    UnexpectedBufferEnd = 0x06,
    /// Field carries a value outside its domain.
    UnexpectedValue = 0x07,
    /// Request type is neither call nor read_state.
    InvalidRequestType = 0x08,
    /// Populated union arm disagrees with the request type.
    RequestTypeMismatch = 0x09,
    /// Mandatory field missing.
    MissingField = 0x0A,
    /// Field exceeds its maximum length.
    ValueTooLong = 0x0B,
    /// Method name not recognized.
    UnexpectedMethod = 0x0C,
    /// Governance operation not recognized.
    UnknownOperation = 0x0D,
    /// Stake flow received a transaction that is not a neuron stake.
    InvalidStakeTransaction = 0x0E,
    /// Value out of range.
    ValueOutOfRange = 0x0F,
    /// Too many lookup paths.
    TooManyPaths = 0x10,
    /// Text field is not printable ASCII.
    InvalidCharacters = 0x11,
}

impl ParserError {
    /// Returns the error code as a u16.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::NoData => write!(f, "No data"),
            ParserError::DisplayIdxOutOfRange => write!(f, "display_idx_out_of_range"),
            ParserError::DisplayPageOutOfRange => write!(f, "display_page_out_of_range"),
            ParserError::UnexpectedError => write!(f, "Unexpected internal error"),
            ParserError::ContextEmpty => write!(f, "Initialized empty context"),
            ParserError::UnexpectedBufferEnd => write!(f, "Unexpected buffer end"),
            ParserError::UnexpectedValue => write!(f, "Unexpected value"),
            ParserError::InvalidRequestType => write!(f, "Invalid request type"),
            ParserError::RequestTypeMismatch => write!(f, "Request type mismatch"),
            ParserError::MissingField => write!(f, "Missing field"),
            ParserError::ValueTooLong => write!(f, "Value too long"),
            ParserError::UnexpectedMethod => write!(f, "Unexpected method"),
            ParserError::UnknownOperation => write!(f, "Unknown governance operation"),
            ParserError::InvalidStakeTransaction => write!(f, "Invalid stake transaction"),
            ParserError::ValueOutOfRange => write!(f, "Value out of range"),
            ParserError::TooManyPaths => write!(f, "Too many paths"),
            ParserError::InvalidCharacters => write!(f, "Invalid characters"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusWord::Ok.code(), 0x9000);
        assert_eq!(StatusWord::TxNotInitialized.code(), 0x6987);
        assert_eq!(StatusWord::InvalidP1P2.to_be_bytes(), [0x6B, 0x00]);
        assert_eq!(StatusWord::from_u16(0x6984), Some(StatusWord::DataInvalid));
        assert_eq!(StatusWord::from_u16(0x1234), None);
    }

    #[test]
    fn test_parser_codes_stay_outside_status_ranges() {
        for code in 0..=0x20u16 {
            if let Some(err) = ParserError::from_u16(code) {
                assert_eq!(err.code() & 0xF000, 0);
            }
        }
    }
}
