//! Error type of the command pipeline.
//!
//! Every stage returns [`AppError`]; the dispatcher turns it into exactly one
//! status word with [`AppError::status_code`].

use core::fmt;

use icp_common::{ParserError, StatusWord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    /// A status word, returned unchanged.
    Status(StatusWord),
    /// A parser or review failure, folded into a processing error.
    Parser(ParserError),
    /// An assembled transaction that failed decoding or validation.
    ///
    /// Answered with `DataInvalid`; the parser error text is the payload.
    InvalidTransaction(ParserError),
}

impl AppError {
    /// Raw code before folding.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Status(sw) => sw.code(),
            AppError::Parser(err) => err.code(),
            AppError::InvalidTransaction(_) => StatusWord::DataInvalid.code(),
        }
    }

    /// Response data sent along with the status word.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            AppError::InvalidTransaction(err) => err.to_string().into_bytes(),
            _ => Vec::new(),
        }
    }

    /// Status word sent to the host.
    pub fn status_code(&self) -> u16 {
        fold_status_code(self.code())
    }
}

/// Maps any error code to a status word.
///
/// Codes in the `0x6xxx` and `0x9xxx` ranges pass through; anything else
/// becomes `0x6800 | (code & 0x7FF)`.
pub fn fold_status_code(code: u16) -> u16 {
    match code & 0xF000 {
        0x6000 | 0x9000 => code,
        _ => 0x6800 | (code & 0x07FF),
    }
}

impl From<StatusWord> for AppError {
    fn from(sw: StatusWord) -> Self {
        AppError::Status(sw)
    }
}

impl From<ParserError> for AppError {
    fn from(err: ParserError) -> Self {
        AppError::Parser(err)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Status(sw) => write!(f, "{}", sw),
            AppError::Parser(err) => write!(f, "{} (0x{:04X})", err, self.status_code()),
            AppError::InvalidTransaction(err) => {
                write!(f, "{}: {}", StatusWord::DataInvalid, err)
            }
        }
    }
}

impl std::error::Error for AppError {}
