//! Internet Computer transaction intake and review engine.
//!
//! The engine turns a stream of fragments from an untrusted host into one
//! validated transaction, walks the owner through a review of it, and only
//! then asks the platform for a signature.
//!
//! # Architecture
//!
//! 1. [`dispatcher`] receives one command at a time and answers it
//! 2. [`chunk`] reassembles a transaction, checking the signing path first
//! 3. [`parsing`] decodes and validates the assembled bytes
//! 4. [`review`] renders the validated model as paged key/value items
//! 5. [`platform`] shows the review and signs on approval
//!
//! # Security Model
//!
//! - Fail closed: any violation aborts the assembly and discards it
//! - Only a validated [`parsing::ParsedTransaction`] reaches review
//! - Private keys never leave the platform

pub mod chunk;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod parsing;
pub mod path;
pub mod platform;
pub mod review;
pub mod state;

pub use config::{AppConfig, Mode};
pub use dispatcher::{CommandChannel, Dispatcher, Event, Response};
pub use error::AppError;
pub use platform::{MockPlatform, Platform};
pub use state::Session;
