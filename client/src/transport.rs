use std::error::Error;
use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};

use crate::apdu::{APDUAnswer, APDUCommand};

/// Generic trait to abstract the communication layer between the host and the device.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: Debug + Send + Sync;

    /// Sends one command and returns the answer.
    async fn exchange(&self, command: &APDUCommand) -> Result<APDUAnswer, Self::Error>;
}

/// Transport to a simulator speaking length-prefixed frames over TCP.
pub struct TransportTcp {
    connection: Mutex<TcpStream>,
    total_exchanges: AtomicU64,
}

impl TransportTcp {
    /// Create a new TCP transport connecting to the provided socket address.
    pub async fn new(addr: SocketAddr) -> Result<Self, Box<dyn Error>> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            connection: Mutex::new(stream),
            total_exchanges: AtomicU64::new(0),
        })
    }

    /// Create a new TCP transport using the default simulator address 127.0.0.1:9999.
    pub async fn new_default() -> Result<Self, Box<dyn Error>> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9999);
        Self::new(addr).await
    }

    // Number of exchanges made with this instance.
    pub fn total_exchanges(&self) -> u64 {
        self.total_exchanges.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for TransportTcp {
    type Error = Box<dyn Error + Send + Sync>;

    async fn exchange(&self, command: &APDUCommand) -> Result<APDUAnswer, Self::Error> {
        self.total_exchanges.fetch_add(1, Ordering::Relaxed);

        let mut stream = self.connection.lock().await;
        let command_bytes = command.encode();

        let mut req = vec![0u8; command_bytes.len() + 4];
        req[..4].copy_from_slice(&(command_bytes.len() as u32).to_be_bytes());
        req[4..].copy_from_slice(&command_bytes);
        stream.write_all(&req).await?;

        let mut buff = [0u8; 4];
        stream.read_exact(&mut buff).await?;
        let len = u32::from_be_bytes(buff);

        // data followed by the status word
        let mut resp = vec![0u8; len as usize + 2];
        stream.read_exact(&mut resp).await?;
        log::debug!("transport: <= {}", hex::encode(&resp));

        APDUAnswer::from_answer(resp).ok_or_else(|| "Invalid Answer".into())
    }
}
