//! ICP app client library.
//!
//! This library drives the device command channel from the host: it
//! splits transactions into fragments, sends them in order, and decodes
//! the answers.
//!
//! # Example
//!
//! ```no_run
//! use icp_client::{IcpClient, TransportTcp};
//! use icp_common::DerivationPath;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = TransportTcp::new_default().await.unwrap();
//!     let client = IcpClient::new(transport);
//!
//!     let path = DerivationPath::parse("m/44'/223'/0'/0/0").unwrap();
//!     let address = client.get_address(&path, false).await.unwrap();
//!     println!("{}", address.principal_text);
//! }
//! ```

mod apdu;
mod client;
mod transport;

pub use apdu::{APDUCommand, APDUAnswer};
pub use client::{
    serialize_path, AddressInfo, DeviceInfo, IcpClient, IcpClientError, SignedRequest,
    VersionInfo,
};
pub use transport::{Transport, TransportTcp};

/// Initializes `env_logger` for debugging sessions.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .try_init();
}
