//! Instruction handlers.
//!
//! Each handler processes one instruction and returns the response data.
//! Handlers are responsible for:
//! - Validating parameters
//! - Driving chunk assembly, decoding and validation
//! - Asking the platform for review and signatures
//!
//! Errors are returned as [`AppError`]; the dispatcher turns them into a
//! status word.

use icp_common::opcodes::{AddressDisplay, OFFSET_DATA, OFFSET_P1};
use icp_common::types::REQUEST_ID_LEN;
use icp_common::{DerivationPath, ParserError, SpecialTransfer, StatusWord};
use num_traits::FromPrimitive;

use crate::chunk::ChunkOutcome;
use crate::crypto::{self, Hash256, Signature};
use crate::error::AppError;
use crate::parsing::{decode_combined, validate, ParsedTransaction, TransactionDecoder};
use crate::path;
use crate::platform::Platform;
use crate::review::{AddressReview, TransactionReview};
use crate::state::Session;

// =============================================================================
// Version
// =============================================================================

/// `[test_mode, major, minor, patch, device_locked, target_id (BE)]`
pub fn handle_get_version<P: Platform>(session: &Session, platform: &P) -> Vec<u8> {
    let config = session.config();
    let mut out = Vec::with_capacity(9);
    out.push(u8::from(config.test_mode));
    out.push(config.version.major);
    out.push(config.version.minor);
    out.push(config.version.patch);
    out.push(u8::from(platform.device_locked()));
    out.extend_from_slice(&config.target_id.to_be_bytes());
    out
}

// =============================================================================
// Address
// =============================================================================

/// Returns `pubkey || account id || principal || textual principal`.
///
/// With P1 = 1 the identity is shown on the device and must be approved.
pub fn handle_get_address<P: Platform>(
    session: &Session,
    platform: &P,
    command: &[u8],
) -> Result<Vec<u8>, AppError> {
    if command.len() < OFFSET_DATA {
        return Err(StatusWord::WrongLength.into());
    }
    let display = AddressDisplay::from_u8(command[OFFSET_P1]).ok_or(StatusWord::InvalidP1P2)?;
    let path = path::validate(command, OFFSET_DATA, session.mode())?;

    let public_key = platform.public_key(&path)?;
    let principal = crypto::principal_from_public_key(&public_key);
    let account_id = crypto::account_identifier(&principal, None);
    let text = crypto::principal_to_text(&principal);

    if display == AddressDisplay::ShowAddressInDevice {
        let width = session.config().display_width;
        let review = AddressReview::new(principal, account_id, path, width);
        if !platform.review(&review, session.mode())? {
            platform.show_info(false, "Address rejected");
            return Err(StatusWord::TransactionRejected.into());
        }
        platform.show_info(true, "Address verified");
    }

    let mut out =
        Vec::with_capacity(public_key.len() + account_id.len() + principal.len() + text.len());
    out.extend_from_slice(&public_key);
    out.extend_from_slice(&account_id);
    out.extend_from_slice(&principal);
    out.extend_from_slice(text.as_bytes());
    Ok(out)
}

// =============================================================================
// Signing
// =============================================================================

/// Assembles, reviews and signs one request.
///
/// Intermediate fragments answer with no data. The last one answers
/// `request_id || r || s || v`.
pub fn handle_sign<P: Platform, D: TransactionDecoder>(
    session: &mut Session,
    platform: &P,
    decoder: &D,
    command: &[u8],
) -> Result<Vec<u8>, AppError> {
    if session.process_chunk(command)? != ChunkOutcome::Complete {
        return Ok(Vec::new());
    }
    let assembled = session.take_assembled()?;

    let tx = decode_and_validate(decoder, &assembled.bytes, assembled.special_transfer)?;
    confirm(session, platform, &tx, assembled.path)?;

    let (request_id, signature) = sign_request(platform, &assembled.path, &assembled.bytes)?;
    platform.show_info(true, "Transaction signed");

    let mut out = Vec::with_capacity(REQUEST_ID_LEN + 65);
    out.extend_from_slice(&request_id);
    out.extend_from_slice(&signature.to_bytes());
    Ok(out)
}

/// Signs a call together with the status query that polls for it.
///
/// Only the call is reviewed. The query must ask for the status of that
/// exact call. The last fragment answers
/// `call request_id || call sig || status request_id || status sig`.
pub fn handle_sign_combined<P: Platform, D: TransactionDecoder>(
    session: &mut Session,
    platform: &P,
    decoder: &D,
    command: &[u8],
) -> Result<Vec<u8>, AppError> {
    if session.process_chunk(command)? != ChunkOutcome::Complete {
        return Ok(Vec::new());
    }
    let assembled = session.take_assembled()?;

    let combined = decode_combined(&assembled.bytes).map_err(AppError::InvalidTransaction)?;
    let call = decode_and_validate(decoder, &combined.call, assembled.special_transfer)?;
    if !matches!(call, ParsedTransaction::Call(_)) {
        return Err(AppError::InvalidTransaction(ParserError::RequestTypeMismatch));
    }
    let status = decode_and_validate(decoder, &combined.read_state, SpecialTransfer::Normal)?;
    let call_request_id = crypto::request_id(&combined.call);
    match &status {
        ParsedTransaction::StateRead(read) if read.request_id() == Some(&call_request_id[..]) => {}
        ParsedTransaction::StateRead(_) => {
            log::warn!("handlers: status query is for another request");
            return Err(AppError::InvalidTransaction(ParserError::UnexpectedValue));
        }
        ParsedTransaction::Call(_) => {
            return Err(AppError::InvalidTransaction(ParserError::RequestTypeMismatch))
        }
    }

    confirm(session, platform, &call, assembled.path)?;

    let (call_id, call_sig) = sign_request(platform, &assembled.path, &combined.call)?;
    let (status_id, status_sig) = sign_request(platform, &assembled.path, &combined.read_state)?;
    platform.show_info(true, "Transaction signed");

    let mut out = Vec::with_capacity(2 * (REQUEST_ID_LEN + 65));
    out.extend_from_slice(&call_id);
    out.extend_from_slice(&call_sig.to_bytes());
    out.extend_from_slice(&status_id);
    out.extend_from_slice(&status_sig.to_bytes());
    Ok(out)
}

fn decode_and_validate<D: TransactionDecoder>(
    decoder: &D,
    bytes: &[u8],
    special_transfer: SpecialTransfer,
) -> Result<ParsedTransaction, AppError> {
    decoder
        .decode(bytes)
        .and_then(|raw| validate(raw, special_transfer))
        .map_err(|err| {
            log::warn!("handlers: transaction refused: {}", err);
            AppError::InvalidTransaction(err)
        })
}

fn confirm<P: Platform>(
    session: &Session,
    platform: &P,
    tx: &ParsedTransaction,
    path: DerivationPath,
) -> Result<(), AppError> {
    let review = TransactionReview::new(tx, path, session.config().display_width);
    if !platform.review(&review, session.mode())? {
        platform.show_info(false, "Transaction rejected");
        return Err(StatusWord::TransactionRejected.into());
    }
    Ok(())
}

fn sign_request<P: Platform>(
    platform: &P,
    path: &DerivationPath,
    encoded: &[u8],
) -> Result<(Hash256, Signature), AppError> {
    let request_id = crypto::request_id(encoded);
    let signature = platform.sign(path, &crypto::signing_digest(&request_id))?;
    Ok((request_id, signature))
}
