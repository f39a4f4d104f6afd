use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// HTTP methods accepted by the phone API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Head,
    Get,
    Put,
    Patch,
    Post,
    Delete,
}

impl HttpMethod {
    pub const ALL: &'static [HttpMethod] = &[
        HttpMethod::Head,
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unsupported HTTP method \"{}\". Supported values: {:?}",
                    s,
                    HttpMethod::ALL
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolError(pub String);

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Unsupported protocol \"{}\". Supported values: HTTP, HTTPS", self.0)
    }
}

impl std::error::Error for ProtocolError {}

/// URI scheme of the management API.
///
/// Only `http` and `https` are accepted, but the spelling the caller used
/// is kept and ends up in the request URI as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol(String);

impl Protocol {
    pub const HTTP: &'static str = "HTTP";
    pub const HTTPS: &'static str = "HTTPS";

    pub fn http() -> Self {
        Protocol(Self::HTTP.to_string())
    }

    pub fn https() -> Self {
        Protocol(Self::HTTPS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_https(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::HTTPS)
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::http()
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(Self::HTTP) || s.eq_ignore_ascii_case(Self::HTTPS) {
            Ok(Protocol(s.to_string()))
        } else {
            Err(ProtocolError(s.to_string()))
        }
    }
}
