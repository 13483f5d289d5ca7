//! Primary store endpoint addressing

use serde::{Deserialize, Serialize};

/// Host/port/TLS triple of a primary store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Use `https` instead of `http`
    pub use_tls: bool,
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint {
            host: "localhost".to_string(),
            port: 8000,
            use_tls: false,
        }
    }
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(host: impl Into<String>, port: u16, use_tls: bool) -> Self {
        Endpoint {
            host: host.into(),
            port,
            use_tls,
        }
    }

    /// URL scheme
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL, omitting the port when it is the scheme default
    pub fn base_url(&self) -> String {
        let default_port = if self.use_tls { 443 } else { 80 };
        if self.port == default_port {
            format!("{}://{}", self.scheme(), self.host)
        } else {
            format!("{}://{}:{}", self.scheme(), self.host, self.port)
        }
    }
}
