use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::io::{Error as IoError, ErrorKind};

use crate::{CRLF, SIP_VERSION};

/// Out-of-dialog SIP NOTIFY request used both as a reachability probe and
/// as an event trigger (`check-sync` and friends).
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyRequest {
    pub target_host: String,
    pub target_port: u16,
    pub local_ip: String,
    pub local_port: u16,
    pub call_id: String,
    pub cseq: u32,
    /// `Some` in notify mode, adds `Event` and `Max-Forwards` headers.
    pub event: Option<String>,
}

impl NotifyRequest {
    pub const METHOD: &'static str = "NOTIFY";
    pub const DISCOVER_USER: &'static str = "discover";
    pub const DEFAULT_EVENT: &'static str = "check-sync";
    pub const MAX_FORWARDS: u8 = 10;
    pub const BRANCH_MAGIC: &'static str = "z9hG4bK";
    pub const CALL_ID_SUFFIX: &'static str = "-vvxdiscover";

    /// A discovery probe: no `Event` header.
    pub fn discover(
        target_host: impl Into<String>,
        target_port: u16,
        local_ip: impl Into<String>,
        local_port: u16,
    ) -> Self {
        NotifyRequest {
            target_host: target_host.into(),
            target_port,
            local_ip: local_ip.into(),
            local_port,
            call_id: generate_call_id(),
            cseq: 1,
            event: None,
        }
    }

    /// A notify request carrying `event`.
    pub fn notify(
        target_host: impl Into<String>,
        target_port: u16,
        local_ip: impl Into<String>,
        local_port: u16,
        event: impl Into<String>,
    ) -> Self {
        NotifyRequest {
            event: Some(event.into()),
            ..Self::discover(target_host, target_port, local_ip, local_port)
        }
    }

    pub fn request_uri(&self) -> String {
        format!("sip:{}:{}", self.target_host, self.target_port)
    }

    /// The synthetic identity used as From and Contact.
    pub fn identity(&self) -> String {
        format!(
            "sip:{}@{}:{}",
            Self::DISCOVER_USER,
            self.local_ip,
            self.local_port
        )
    }
}

/// Call-ID derived from the current local time.
pub fn generate_call_id() -> String {
    call_id_at(&Local::now())
}

/// Call-ID for a given instant: the timestamp with every separator stripped
/// followed by a fixed suffix.
pub fn call_id_at<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}{}",
        time.format("%Y%m%d%H%M%S%6f"),
        NotifyRequest::CALL_ID_SUFFIX
    )
}

/// `NotifyRequest` Tokio codec. Encode only, requests are never received.
#[derive(Default)]
pub struct NotifyRequestCodec;

impl NotifyRequestCodec {
    pub fn new() -> Self {
        NotifyRequestCodec {}
    }

    fn put_line(dst: &mut BytesMut, line: &str) {
        dst.put_slice(line.as_bytes());
        dst.put_slice(CRLF.as_bytes());
    }

    pub fn inner_encode(
        &mut self,
        item: &NotifyRequest,
        dst: &mut BytesMut,
    ) -> Result<(), IoError> {
        let identity = item.identity();
        let mut lines = vec![
            format!(
                "{} {} {}",
                NotifyRequest::METHOD,
                item.request_uri(),
                SIP_VERSION
            ),
            format!(
                "Via: {}/UDP {}:{};branch={}{}",
                SIP_VERSION,
                item.local_ip,
                item.local_port,
                NotifyRequest::BRANCH_MAGIC,
                item.call_id
            ),
            format!("From: <{}>;tag={}", identity, item.cseq),
            format!("To: <{}>", item.request_uri()),
            format!("Call-ID: {}", item.call_id),
            format!("CSeq: {} {}", item.cseq, NotifyRequest::METHOD),
            format!("Contact: <{}>", identity),
        ];
        if let Some(ref event) = item.event {
            lines.push(format!("Event: {}", event));
            lines.push(format!("Max-Forwards: {}", NotifyRequest::MAX_FORWARDS));
        }
        lines.push("Content-Length: 0".to_string());

        if let Some(line) = lines.iter().find(|line| !line.is_ascii()) {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!("SIP request line is not ASCII: {}", line),
            ));
        }

        for line in lines.iter() {
            Self::put_line(dst, line);
        }
        // blank line closes the header block, no body
        dst.put_slice(CRLF.as_bytes());
        Ok(())
    }
}

impl tokio_util::codec::Encoder<&NotifyRequest> for NotifyRequestCodec {
    type Error = IoError;

    fn encode(&mut self, item: &NotifyRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner_encode(item, dst)
    }
}
