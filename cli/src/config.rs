use std::{
    fs::read_to_string,
    io::Error as IoError,
    net::IpAddr,
    path::Path,
    time::Duration,
};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use toml::{de::Error as TomlError, from_str};
use vvx_proto::Protocol;
use vvx_rest::Credential;

type OptPort = Option<u16>;
type OptU32 = Option<u32>;
type OptString = Option<String>;
type OptMillis = Option<u64>;
type OptBool = Option<bool>;

/// Content of a `vvx.toml` file. Every field may be omitted.
#[derive(Deserialize, Default)]
pub struct VvxConfigSrc {
    /// HTTP or HTTPS, spelling kept
    pub protocol: OptString,
    pub rest_port: OptPort,
    pub push_port: OptPort,
    pub retry_count: OptU32,
    /// overrides the per command default timeout
    pub request_timeout_ms: OptMillis,
    pub ignore_tls_errors: OptBool,
    pub username: OptString,
    pub password: OptString,
    pub sip_port: OptPort,
    pub wait_time_ms: OptMillis,
    pub local_ip: OptString,
    pub local_port: OptPort,
    pub event: OptString,
    /// stdout, stderr, file:vvx.log
    pub log_dest: OptString,
    pub log_level: OptString,
}

impl VvxConfigSrc {
    pub const LOG_DEST_STDOUT: &'static str = "stdout";
    pub const LOG_DEST_STDERR: &'static str = "stderr";
    pub const LOG_DEST_FILE_REGEX: &'static str = "^file:.+";
    pub const LOG_LEVEL: &'static [&'static str; 4] = &["error", "warn", "info", "debug"];

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let config_file_content = read_to_string(path)?;
        Self::from_toml(&config_file_content)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config_src: VvxConfigSrc = from_str(content)?;
        Self::validate(&config_src)?;
        Ok(config_src)
    }

    fn validate(config_src: &VvxConfigSrc) -> ConfigResult<()> {
        Self::validate_log_dest(&config_src.log_dest)
            .and_then(|_| Self::validate_log_level(&config_src.log_level))
            .and_then(|_| Self::validate_protocol(&config_src.protocol))
            .and_then(|_| Self::validate_local_ip(&config_src.local_ip))
            .and_then(|_| Self::validate_event(&config_src.event))
            .and_then(|_| Self::validate_credential(&config_src.username, &config_src.password))
    }

    pub fn validate_log_dest(maybe_log_dest: &OptString) -> ConfigResult<()> {
        match maybe_log_dest {
            Some(log_dest) => {
                if log_dest == Self::LOG_DEST_STDOUT
                    || log_dest == Self::LOG_DEST_STDERR
                    || Regex::new(Self::LOG_DEST_FILE_REGEX)
                        .map(|re| re.is_match(log_dest))
                        .unwrap_or(false)
                {
                    return Ok(());
                }

                Err(VvxConfigError::WrongValue(format!(
                    "Unsupported log destination \"{}\".\nSupported values: \"{}\", \"{}\", \"file:<path>\"",
                    log_dest,
                    Self::LOG_DEST_STDOUT,
                    Self::LOG_DEST_STDERR
                )))
            }
            None => Ok(()),
        }
    }

    pub fn validate_log_level(maybe_log_level: &OptString) -> ConfigResult<()> {
        match maybe_log_level {
            Some(log_level) => {
                if Self::LOG_LEVEL
                    .iter()
                    .any(|supported| supported == log_level)
                {
                    return Ok(());
                }
                Err(VvxConfigError::WrongValue(format!(
                    "Unsupported log level {}.\nSupported values: {:?}",
                    log_level,
                    Self::LOG_LEVEL
                )))
            }
            None => Ok(()),
        }
    }

    fn validate_protocol(maybe_protocol: &OptString) -> ConfigResult<()> {
        match maybe_protocol {
            Some(protocol) => protocol
                .parse::<Protocol>()
                .map(|_| ())
                .map_err(|err| VvxConfigError::WrongValue(err.to_string())),
            None => Ok(()),
        }
    }

    fn validate_local_ip(maybe_local_ip: &OptString) -> ConfigResult<()> {
        match maybe_local_ip {
            Some(local_ip) if local_ip.parse::<IpAddr>().is_err() => Err(
                VvxConfigError::WrongValue(format!("local_ip \"{}\" is not an IP address", local_ip)),
            ),
            _ => Ok(()),
        }
    }

    fn validate_event(maybe_event: &OptString) -> ConfigResult<()> {
        match maybe_event {
            Some(event) if event.trim().is_empty() => Err(VvxConfigError::WrongValue(
                "event cannot be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_credential(username: &OptString, password: &OptString) -> ConfigResult<()> {
        if username.is_none() && password.is_some() {
            return Err(VvxConfigError::WrongValue(
                "password is set but username is missing".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct VvxConfig {
    pub protocol: Protocol,
    pub rest_port: u16,
    pub push_port: u16,
    pub retry_count: u32,
    /// `None` keeps the default timeout of each command
    pub request_timeout: Option<Duration>,
    pub ignore_tls_errors: bool,
    pub credential: Option<Credential>,
    // SIP probe
    pub sip_port: u16,
    pub wait_time: Duration,
    /// `None` => first usable interface address
    pub local_ip: OptString,
    /// `None` => random free high port
    pub local_port: OptPort,
    pub event: String,
    /// stdout, stderr, file:vvx.log
    pub log_dest: String,
    pub log_level: String,
}

impl From<VvxConfigSrc> for VvxConfig {
    fn from(src: VvxConfigSrc) -> Self {
        VvxConfig {
            // validated value, falls back only if the source was not validated
            protocol: src
                .protocol
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            rest_port: src.rest_port.unwrap_or(Self::DEFAULT_REST_PORT),
            push_port: src.push_port.unwrap_or(Self::DEFAULT_PUSH_PORT),
            retry_count: src.retry_count.unwrap_or(Self::DEFAULT_RETRY_COUNT),
            request_timeout: src.request_timeout_ms.map(Duration::from_millis),
            ignore_tls_errors: src
                .ignore_tls_errors
                .unwrap_or(Self::DEFAULT_IGNORE_TLS_ERRORS),
            credential: src
                .username
                .map(|username| Credential::new(username, src.password.unwrap_or_default())),
            sip_port: src.sip_port.unwrap_or(Self::DEFAULT_SIP_PORT),
            wait_time: Duration::from_millis(
                src.wait_time_ms.unwrap_or(Self::DEFAULT_WAIT_TIME_MS),
            ),
            local_ip: src.local_ip,
            local_port: src.local_port,
            event: src
                .event
                .unwrap_or_else(|| Self::DEFAULT_EVENT.to_string()),
            log_dest: src
                .log_dest
                .unwrap_or_else(|| Self::DEFAULT_LOG.to_string()),
            log_level: src
                .log_level
                .unwrap_or_else(|| Self::DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl Default for VvxConfig {
    fn default() -> Self {
        VvxConfig::from(VvxConfigSrc::default())
    }
}

impl VvxConfig {
    pub const DEFAULT_REST_PORT: u16 = 80;
    pub const DEFAULT_PUSH_PORT: u16 = 80;
    pub const DEFAULT_RETRY_COUNT: u32 = 3;
    pub const DEFAULT_IGNORE_TLS_ERRORS: bool = false;
    pub const DEFAULT_SIP_PORT: u16 = 5060;
    pub const DEFAULT_WAIT_TIME_MS: u64 = 350;
    pub const DEFAULT_EVENT: &'static str = sip_packets::NotifyRequest::DEFAULT_EVENT;
    // results go to stdout, keep logs apart
    pub const DEFAULT_LOG: &'static str = "stderr";
    pub const DEFAULT_LOG_LEVEL: &'static str = "warn";

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        VvxConfigSrc::from_file(path).map(From::from)
    }
}

#[derive(Error, Debug)]
pub enum VvxConfigError {
    #[error("cannot read config file: {0}")]
    ConfigFile(String),
    #[error("{0}")]
    WrongValue(String),
}

impl From<IoError> for VvxConfigError {
    fn from(err: IoError) -> Self {
        VvxConfigError::ConfigFile(format!("{}", err))
    }
}

impl From<TomlError> for VvxConfigError {
    fn from(err: TomlError) -> Self {
        VvxConfigError::ConfigFile(format!("{}", err))
    }
}

pub type ConfigResult<T> = Result<T, VvxConfigError>;
