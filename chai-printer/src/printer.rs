//! Printer adapters for sending receipt data
//!
//! Supports network printers listening on a raw TCP port (9100 by convention).
//! The printer never answers; a job counts as delivered once the payload is
//! written, the write side is shut down and the peer closes cleanly.

use crate::error::{PrintError, PrintResult};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

/// Industry-standard raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Connect and idle timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw bytes to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;
}

/// Network printer (raw TCP)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer from an IP address and port
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let ip: IpAddr = host
            .trim()
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid printer IP: {}", host)))?;

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set connect / idle timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn timeout_error(&self, phase: &str) -> PrintError {
        PrintError::Timeout(format!(
            "Printer connection timeout ({}) after {}ms: {}",
            phase,
            self.timeout.as_millis(),
            self.addr
        ))
    }

    fn socket_error(&self, e: std::io::Error) -> PrintError {
        PrintError::Connection(format!("{}: {}", self.addr, e))
    }

    /// Wait for the printer to close its side of the connection.
    ///
    /// Anything the printer sends back is discarded; each read restarts the
    /// idle timer.
    async fn await_close(&self, stream: &mut TcpStream) -> PrintResult<()> {
        let mut buf = [0u8; 256];
        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Err(_) => return Err(self.timeout_error("idle")),
                Ok(Err(e)) => return Err(self.socket_error(e)),
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(n)) => debug!(bytes = n, "Discarding printer output"),
            }
        }
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let mut stream = timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| self.timeout_error("connect"))?
            .map_err(|e| self.socket_error(e))?;

        info!("Connected, sending {} bytes", data.len());

        timeout(self.timeout, stream.write_all(data))
            .await
            .map_err(|_| self.timeout_error("write"))?
            .map_err(|e| self.socket_error(e))?;

        // Close the write side; the printer sees EOF and finishes the job
        timeout(self.timeout, stream.shutdown())
            .await
            .map_err(|_| self.timeout_error("shutdown"))?
            .map_err(|e| self.socket_error(e))?;

        self.await_close(&mut stream).await?;

        info!("Print job sent successfully");
        Ok(())
    }
}
