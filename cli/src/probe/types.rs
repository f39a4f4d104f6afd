use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

/// Outcome of one probe. Discovery never reports `Error` nor
/// `NonVVXDevice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    Unknown,
    Online,
    NoResponse,
    NoDataReceived,
    UnableToConnect,
    SocketFailure,
    Error,
    NonVVXDevice,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Unknown => "Unknown",
            ProbeStatus::Online => "Online",
            ProbeStatus::NoResponse => "NoResponse",
            ProbeStatus::NoDataReceived => "NoDataReceived",
            ProbeStatus::UnableToConnect => "UnableToConnect",
            ProbeStatus::SocketFailure => "SocketFailure",
            ProbeStatus::Error => "Error",
            ProbeStatus::NonVVXDevice => "NonVVXDevice",
        }
    }
}

impl Default for ProbeStatus {
    fn default() -> Self {
        ProbeStatus::Unknown
    }
}

impl Display for ProbeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A phone to probe: host name or IP, used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub address: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        ProbeTarget {
            address: address.into(),
            port,
        }
    }
}

/// Local side of a probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    /// Read timeout, zero is raised to one millisecond.
    pub wait_time: Duration,
    pub local_ip: String,
    /// 0 lets the system pick.
    pub local_port: u16,
}

impl ProbeSettings {
    pub const MIN_WAIT_TIME: Duration = Duration::from_millis(1);

    pub fn new(local_ip: impl Into<String>, local_port: u16, wait_time: Duration) -> Self {
        ProbeSettings {
            wait_time,
            local_ip: local_ip.into(),
            local_port,
        }
    }

    pub fn effective_wait_time(&self) -> Duration {
        self.wait_time.max(Self::MIN_WAIT_TIME)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub device: String,
    pub device_type: Option<String>,
    pub port: u16,
    pub local_ip: String,
    pub response: Option<String>,
    pub status: ProbeStatus,
    pub lync_server: Option<String>,
    pub sip_user: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResult {
    pub device: String,
    pub device_type: Option<String>,
    pub port: u16,
    pub local_ip: String,
    pub response: Option<String>,
    pub status: ProbeStatus,
    pub lync_server: Option<String>,
    pub sip_user: Option<String>,
    pub user_agent: Option<String>,
    pub client_app: Option<String>,
    /// `false` for a VVX answering without anybody logged in.
    pub registered: bool,
}
