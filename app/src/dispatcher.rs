//! Command dispatch.
//!
//! The [`Dispatcher`] owns the session and answers every command with
//! exactly one [`Response`]. Errors from any stage are folded into a
//! status word here and nowhere else.

use icp_common::opcodes::{CLA, DEVICE_INFO_COMMAND, OFFSET_CLA, OFFSET_INS};
use icp_common::{Instruction, StatusWord};
use num_traits::FromPrimitive;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers;
use crate::parsing::{PostcardDecoder, TransactionDecoder};
use crate::platform::Platform;
use crate::state::Session;

/// Response data followed by a status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub data: Vec<u8>,
    pub status: u16,
}

impl Response {
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            data,
            status: StatusWord::Ok.code(),
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            data: err.payload(),
            status: err.status_code(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusWord::Ok.code()
    }

    /// `data || status (BE)`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 2);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.status.to_be_bytes());
        out
    }
}

/// What the channel delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Vec<u8>),
    /// The channel was re-initialized; partial state must go.
    Reset,
    Closed,
}

/// Transport between host and engine.
pub trait CommandChannel {
    type Error;

    fn receive(&mut self) -> Result<Event, Self::Error>;

    fn send(&mut self, response: &Response) -> Result<(), Self::Error>;
}

/// Device-info answer: target id, SE version, flags, MCU version.
///
/// Version strings longer than a length byte can describe are cut to 255
/// bytes so the answer stays parseable.
pub fn device_info(config: &AppConfig) -> Vec<u8> {
    let se = length_prefixed(config.se_version.as_bytes());
    let mcu = length_prefixed(config.mcu_version.as_bytes());
    let mut out = Vec::with_capacity(4 + se.len() + 1 + mcu.len());
    out.extend_from_slice(&config.target_id.to_be_bytes());
    out.extend_from_slice(&se);
    // flags
    out.push(0);
    out.extend_from_slice(&mcu);
    out
}

fn length_prefixed(field: &[u8]) -> Vec<u8> {
    let len = u8::try_from(field.len()).unwrap_or(u8::MAX);
    if field.len() > usize::from(len) {
        log::warn!("dispatcher: device info field of {} bytes cut", field.len());
    }
    let mut out = Vec::with_capacity(1 + usize::from(len));
    out.push(len);
    out.extend_from_slice(&field[..usize::from(len)]);
    out
}

fn is_device_info(command: &[u8]) -> bool {
    command.len() > DEVICE_INFO_COMMAND.len() && command.starts_with(&DEVICE_INFO_COMMAND)
}

pub struct Dispatcher<P: Platform, D: TransactionDecoder = PostcardDecoder> {
    session: Session,
    platform: P,
    decoder: D,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(config: AppConfig, platform: P) -> Self {
        Self::with_decoder(config, platform, PostcardDecoder)
    }
}

impl<P: Platform, D: TransactionDecoder> Dispatcher<P, D> {
    pub fn with_decoder(config: AppConfig, platform: P, decoder: D) -> Self {
        Self {
            session: Session::new(config),
            platform,
            decoder,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Answers one command.
    pub fn handle(&mut self, command: &[u8]) -> Response {
        if command.is_empty() {
            return Response::error(&StatusWord::EmptyBuffer.into());
        }
        if is_device_info(command) {
            return Response::ok(device_info(self.session.config()));
        }

        match self.dispatch(command) {
            Ok(data) => Response::ok(data),
            Err(err) => {
                log::warn!("dispatcher: command failed: {}", err);
                Response::error(&err)
            }
        }
    }

    fn dispatch(&mut self, command: &[u8]) -> Result<Vec<u8>, AppError> {
        if command[OFFSET_CLA] != CLA {
            return Err(StatusWord::ClaNotSupported.into());
        }
        let ins = *command.get(OFFSET_INS).ok_or(StatusWord::WrongLength)?;
        let ins = Instruction::from_u8(ins).ok_or(StatusWord::InsNotSupported)?;
        log::debug!("dispatcher: {:?}, {} bytes", ins, command.len());

        match ins {
            Instruction::GetVersion => {
                Ok(handlers::handle_get_version(&self.session, &self.platform))
            }
            Instruction::GetAddrSecp256k1 => {
                handlers::handle_get_address(&self.session, &self.platform, command)
            }
            Instruction::SignSecp256k1 => {
                handlers::handle_sign(&mut self.session, &self.platform, &self.decoder, command)
            }
            Instruction::SignCombined => handlers::handle_sign_combined(
                &mut self.session,
                &self.platform,
                &self.decoder,
                command,
            ),
        }
    }

    /// Serves commands until the channel closes.
    pub fn run<C: CommandChannel>(&mut self, channel: &mut C) -> Result<(), C::Error> {
        log::info!("dispatcher: entering command loop");
        loop {
            match channel.receive()? {
                Event::Command(command) => {
                    let response = self.handle(&command);
                    channel.send(&response)?;
                }
                Event::Reset => {
                    log::info!("dispatcher: channel reset");
                    self.session.reset();
                }
                Event::Closed => {
                    log::info!("dispatcher: channel closed");
                    return Ok(());
                }
            }
        }
    }
}
