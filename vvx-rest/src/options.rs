use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use vvx_proto::{HttpMethod, Protocol};

/// User and password for the phone web server.
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"******")
            .finish()
    }
}

/// Per call settings of a REST dispatch.
///
/// Defaults differ per kind of call and are kept that way: generic commands
/// wait 300 ms, plain GET fetches 800 ms and call placement 5 s.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub protocol: Protocol,
    pub port: u16,
    pub base: String,
    pub method: HttpMethod,
    /// `None` sends no entity at all, which differs from an empty mapping.
    pub body: Option<Value>,
    pub retry_count: u32,
    pub timeout: Duration,
    pub credential: Option<Credential>,
}

impl DispatchOptions {
    pub const DEFAULT_PORT: u16 = 80;
    pub const DEFAULT_BASE: &'static str = "api/v1";
    pub const PUSH_BASE: &'static str = "push";
    pub const DEFAULT_RETRY_COUNT: u32 = 3;
    pub const DEFAULT_TIMEOUT_MS: u64 = 300;
    pub const FETCH_TIMEOUT_MS: u64 = 800;
    pub const CALL_TIMEOUT_MS: u64 = 5000;

    /// Options of a plain GET on a full URI.
    pub fn fetch() -> Self {
        DispatchOptions {
            timeout: Duration::from_millis(Self::FETCH_TIMEOUT_MS),
            ..Default::default()
        }
    }

    /// Options of a push notification, POSTed to `/push`.
    pub fn push() -> Self {
        DispatchOptions {
            base: Self::PUSH_BASE.to_string(),
            method: HttpMethod::Post,
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        DispatchOptions {
            protocol: Protocol::http(),
            port: Self::DEFAULT_PORT,
            base: Self::DEFAULT_BASE.to_string(),
            method: HttpMethod::Get,
            body: None,
            retry_count: Self::DEFAULT_RETRY_COUNT,
            timeout: Duration::from_millis(Self::DEFAULT_TIMEOUT_MS),
            credential: None,
        }
    }
}
