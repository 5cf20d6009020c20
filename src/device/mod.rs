pub mod client;
pub mod rpc;
pub mod transport;

use std::time::Duration;

// Re-export main types
pub use client::{NxapiClient, ShowOutcome};
pub use transport::{HttpTransport, Transport, TransportError};

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection parameters for a single switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Certificate verification; turning it off is an explicit opt-in
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl DeviceSettings {
    /// NX-API endpoint
    pub fn url(&self) -> String {
        format!("https://{}:{}/ins", self.host, self.port)
    }
}
