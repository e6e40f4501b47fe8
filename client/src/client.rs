//! ICP app client implementation.
//!
//! Provides async methods for all app instructions.

use icp_common::opcodes::{AddressDisplay, CHUNK_SIZE};
use icp_common::types::{ACCOUNT_ID_LEN, PK_LEN_SECP256K1, PRINCIPAL_LEN, REQUEST_ID_LEN};
use icp_common::wire::{self, CombinedRequest};
use icp_common::{DerivationPath, Instruction, PayloadType, StatusWord};
use num_traits::FromPrimitive;

use crate::apdu::{
    apdu_device_info, apdu_get_address, apdu_get_version, apdu_sign_chunk, APDUAnswer,
    APDUCommand,
};
use crate::transport::Transport;

/// Length of a recoverable signature, `r || s || v`.
const SIGNATURE_LEN: usize = 65;

/// Errors that can occur when using the ICP client.
#[derive(Debug)]
pub enum IcpClientError {
    /// The transport failed.
    Transport(String),
    /// The device answered with an error status.
    Status {
        status: u16,
        /// Description sent along with the status, if any.
        message: String,
    },
    /// The answer did not have the expected layout.
    InvalidResponse(String),
    /// Generic error.
    GenericError(String),
}

impl IcpClientError {
    /// Status word of a device-side failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            IcpClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<&'static str> for IcpClientError {
    fn from(e: &'static str) -> Self {
        Self::GenericError(e.to_string())
    }
}

impl std::fmt::Display for IcpClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IcpClientError::Transport(e) => write!(f, "Transport: {}", e),
            IcpClientError::Status { status, message } => {
                let known = StatusWord::from_u16(*status)
                    .map(|sw| sw.description())
                    .unwrap_or("Processing error");
                if message.is_empty() {
                    write!(f, "Status 0x{:04X}: {}", status, known)
                } else {
                    write!(f, "Status 0x{:04X}: {} ({})", status, known, message)
                }
            }
            IcpClientError::InvalidResponse(e) => write!(f, "InvalidResponse: {}", e),
            IcpClientError::GenericError(e) => write!(f, "GenericError: {}", e),
        }
    }
}

impl std::error::Error for IcpClientError {}

/// Answer to GET_VERSION.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub test_mode: bool,
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub device_locked: bool,
    pub target_id: u32,
}

/// Answer to the device-info request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub target_id: u32,
    pub se_version: String,
    pub flags: Vec<u8>,
    pub mcu_version: String,
}

/// Answer to GET_ADDR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    pub public_key: [u8; PK_LEN_SECP256K1],
    pub account_id: [u8; ACCOUNT_ID_LEN],
    pub principal: [u8; PRINCIPAL_LEN],
    pub principal_text: String,
}

/// A signed request: its id and the signature over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub request_id: [u8; REQUEST_ID_LEN],
    pub signature: [u8; SIGNATURE_LEN],
}

impl SignedRequest {
    fn parse(data: &[u8]) -> Result<Self, IcpClientError> {
        if data.len() != REQUEST_ID_LEN + SIGNATURE_LEN {
            return Err(IcpClientError::InvalidResponse(format!(
                "signed request of {} bytes",
                data.len()
            )));
        }
        let (id, sig) = data.split_at(REQUEST_ID_LEN);
        Ok(Self {
            request_id: fixed(id)?,
            signature: fixed(sig)?,
        })
    }
}

/// Init payload of a derivation path: five little-endian u32 components.
pub fn serialize_path(path: &DerivationPath) -> Vec<u8> {
    path.to_le_bytes().to_vec()
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], IcpClientError> {
    bytes
        .try_into()
        .map_err(|_| IcpClientError::InvalidResponse(format!("expected {} bytes", N)))
}

/// Reads a `[len][bytes]` field, advancing `data`.
fn take_prefixed<'a>(data: &mut &'a [u8]) -> Result<&'a [u8], IcpClientError> {
    let (&len, rest) = data
        .split_first()
        .ok_or(IcpClientError::InvalidResponse("missing length".to_string()))?;
    if rest.len() < len as usize {
        return Err(IcpClientError::InvalidResponse("truncated field".to_string()));
    }
    let (field, rest) = rest.split_at(len as usize);
    *data = rest;
    Ok(field)
}

/// ICP app client.
pub struct IcpClient<T: Transport> {
    transport: T,
}

impl<T: Transport> IcpClient<T> {
    /// Creates a new client with the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a command and returns the data of a successful answer.
    async fn exchange(&self, command: &APDUCommand) -> Result<Vec<u8>, IcpClientError> {
        log::debug!("client: => {}", hex::encode(command.encode()));
        let APDUAnswer { data, retcode } = self
            .transport
            .exchange(command)
            .await
            .map_err(|e| IcpClientError::Transport(format!("{:?}", e)))?;

        if retcode != StatusWord::Ok.code() {
            return Err(IcpClientError::Status {
                status: retcode,
                message: String::from_utf8_lossy(&data).into_owned(),
            });
        }
        Ok(data)
    }

    /// Gets the app version and device flags.
    pub async fn get_version(&self) -> Result<VersionInfo, IcpClientError> {
        let data = self.exchange(&apdu_get_version()).await?;
        if data.len() != 9 {
            return Err(IcpClientError::InvalidResponse(format!(
                "version of {} bytes",
                data.len()
            )));
        }
        Ok(VersionInfo {
            test_mode: data[0] != 0,
            major: data[1],
            minor: data[2],
            patch: data[3],
            device_locked: data[4] != 0,
            target_id: u32::from_be_bytes(fixed(&data[5..9])?),
        })
    }

    /// Gets the target id and firmware versions.
    pub async fn get_device_info(&self) -> Result<DeviceInfo, IcpClientError> {
        let data = self.exchange(&apdu_device_info()).await?;
        if data.len() < 4 {
            return Err("device info too short".into());
        }
        let (target_id, mut rest) = data.split_at(4);
        let se_version = take_prefixed(&mut rest)?;
        let flags = take_prefixed(&mut rest)?;
        let mcu_version = take_prefixed(&mut rest)?;
        Ok(DeviceInfo {
            target_id: u32::from_be_bytes(fixed(target_id)?),
            se_version: String::from_utf8_lossy(se_version).into_owned(),
            flags: flags.to_vec(),
            mcu_version: String::from_utf8_lossy(mcu_version).into_owned(),
        })
    }

    /// Gets the identity at `path`; with `show` the device asks for approval.
    pub async fn get_address(
        &self,
        path: &DerivationPath,
        show: bool,
    ) -> Result<AddressInfo, IcpClientError> {
        let display = if show {
            AddressDisplay::ShowAddressInDevice
        } else {
            AddressDisplay::OnlyRetrieve
        };
        let data = self
            .exchange(&apdu_get_address(serialize_path(path), display))
            .await?;

        let fixed_len = PK_LEN_SECP256K1 + ACCOUNT_ID_LEN + PRINCIPAL_LEN;
        if data.len() <= fixed_len {
            return Err(IcpClientError::InvalidResponse(format!(
                "address of {} bytes",
                data.len()
            )));
        }
        let (public_key, rest) = data.split_at(PK_LEN_SECP256K1);
        let (account_id, rest) = rest.split_at(ACCOUNT_ID_LEN);
        let (principal, text) = rest.split_at(PRINCIPAL_LEN);
        Ok(AddressInfo {
            public_key: fixed(public_key)?,
            account_id: fixed(account_id)?,
            principal: fixed(principal)?,
            principal_text: String::from_utf8(text.to_vec())
                .map_err(|_| IcpClientError::InvalidResponse("principal text".to_string()))?,
        })
    }

    /// Sends `payload` as Init followed by `CHUNK_SIZE` fragments, the final
    /// one marked Last, and returns the last answer.
    async fn send_chunks(
        &self,
        ins: Instruction,
        path: &DerivationPath,
        payload: &[u8],
        stake: bool,
    ) -> Result<Vec<u8>, IcpClientError> {
        let init = apdu_sign_chunk(ins, PayloadType::Init, stake, serialize_path(path));
        self.exchange(&init).await?;

        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![&[]]
        } else {
            payload.chunks(CHUNK_SIZE).collect()
        };
        let count = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let payload_type = if i + 1 == count {
                PayloadType::Last
            } else {
                PayloadType::Append
            };
            let data = self
                .exchange(&apdu_sign_chunk(ins, payload_type, stake, chunk.to_vec()))
                .await?;
            if payload_type == PayloadType::Last {
                return Ok(data);
            }
        }
        Err("no fragment sent".into())
    }

    /// Signs an encoded request; `stake` marks a neuron stake transfer.
    pub async fn sign(
        &self,
        path: &DerivationPath,
        request: &[u8],
        stake: bool,
    ) -> Result<SignedRequest, IcpClientError> {
        let data = self
            .send_chunks(Instruction::SignSecp256k1, path, request, stake)
            .await?;
        SignedRequest::parse(&data)
    }

    /// Signs a call together with the status query for it.
    pub async fn sign_combined(
        &self,
        path: &DerivationPath,
        call: &[u8],
        read_state: &[u8],
        stake: bool,
    ) -> Result<(SignedRequest, SignedRequest), IcpClientError> {
        let payload = wire::to_bytes(&CombinedRequest {
            call: call.to_vec(),
            read_state: read_state.to_vec(),
        })
        .map_err(|_| IcpClientError::GenericError("Failed to serialize request".to_string()))?;

        let data = self
            .send_chunks(Instruction::SignCombined, path, &payload, stake)
            .await?;
        let half = REQUEST_ID_LEN + SIGNATURE_LEN;
        if data.len() != 2 * half {
            return Err(IcpClientError::InvalidResponse(format!(
                "combined signature of {} bytes",
                data.len()
            )));
        }
        let (call_part, status_part) = data.split_at(half);
        Ok((SignedRequest::parse(call_part)?, SignedRequest::parse(status_part)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_path() {
        let path = DerivationPath::parse("m/44'/223'/0'/0/1").unwrap();
        let bytes = serialize_path(&path);
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..4], &0x8000_002Cu32.to_le_bytes());
        assert_eq!(&bytes[16..], &1u32.to_le_bytes());
    }

    #[test]
    fn test_take_prefixed() {
        let data = [3u8, b'a', b'b', b'c', 0, 9];
        let mut rest = &data[..];
        assert_eq!(take_prefixed(&mut rest).unwrap(), b"abc");
        assert_eq!(take_prefixed(&mut rest).unwrap(), b"");
        assert!(take_prefixed(&mut rest).is_err());
    }

    #[test]
    fn test_status_error_display() {
        let err = IcpClientError::Status {
            status: 0x6984,
            message: "Missing field".to_string(),
        };
        assert_eq!(err.to_string(), "Status 0x6984: Data is invalid (Missing field)");
        assert_eq!(err.status(), Some(0x6984));
    }
}
