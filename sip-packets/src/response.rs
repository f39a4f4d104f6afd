use bytes::BytesMut;
use log::debug;
use std::io::Error as IoError;

use crate::contact::Contact;
use crate::SIP_VERSION;

/// First line of a SIP response, e.g. `SIP/2.0 200 OK`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    pub const OK_CODE: u16 = 200;
    pub const OK_REASON: &'static str = "OK";
    /// Text whose presence marks a successful answer.
    pub const OK_MARKER: &'static str = "SIP/2.0 200 OK";

    /// Parses `<version> <code> <reason>`; anything else is `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(3, ' ');
        let version = parts.next()?;
        if !version.to_ascii_uppercase().starts_with("SIP/") {
            return None;
        }
        let code = parts.next()?.parse::<u16>().ok()?;
        let reason = parts.next().unwrap_or("").trim();
        Some(StatusLine {
            version: version.to_string(),
            code,
            reason: reason.to_string(),
        })
    }

    /// `SIP/2.0 200 OK`, compared case-insensitively. Text after the
    /// reason phrase is ignored.
    pub fn is_ok(&self) -> bool {
        self.version.eq_ignore_ascii_case(SIP_VERSION)
            && self.code == Self::OK_CODE
            && self
                .reason
                .get(..Self::OK_REASON.len())
                .map_or(false, |reason| reason.eq_ignore_ascii_case(Self::OK_REASON))
    }
}

/// Whatever a phone answered to a probe.
///
/// Decoding never fails: the raw text is always kept, the status line is
/// `None` when the first line is not a SIP status line and headers are
/// collected as long as they look like `Name: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct SipResponse {
    pub raw: String,
    pub status_line: Option<StatusLine>,
    /// Headers in wire order, folded continuation lines joined.
    pub headers: Vec<(String, String)>,
}

/// RFC 3261 compact header forms and their full names.
const COMPACT_FORMS: &[(&str, &str)] = &[
    ("m", "Contact"),
    ("f", "From"),
    ("t", "To"),
    ("i", "Call-ID"),
    ("v", "Via"),
    ("l", "Content-Length"),
    ("c", "Content-Type"),
    ("o", "Event"),
];

fn full_header_name(name: &str) -> &str {
    COMPACT_FORMS
        .iter()
        .find(|(compact, _)| compact.eq_ignore_ascii_case(name))
        .map(|(_, full)| *full)
        .unwrap_or(name)
}

impl SipResponse {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        // keep-alive CRLFs may precede the status line
        let mut lines = raw
            .split("\r\n")
            .flat_map(|l| l.split('\n'))
            .skip_while(|l| l.trim().is_empty());
        let status_line = lines.next().and_then(StatusLine::parse);

        let mut headers: Vec<(String, String)> = vec![];
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = full_header_name(name.trim());
                headers.push((name.to_string(), value.trim().to_string()));
            } else {
                debug!("[SIP] skipping malformed header line {:?}", line);
            }
        }

        SipResponse {
            raw,
            status_line,
            headers,
        }
    }

    /// `SIP/2.0 200 OK` appears anywhere in the answer, in any case.
    pub fn is_ok(&self) -> bool {
        self.raw
            .to_ascii_uppercase()
            .contains(StatusLine::OK_MARKER)
    }

    /// First value of `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = full_header_name(name);
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contact(&self) -> Option<Contact> {
        self.header("Contact").map(Contact::parse)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }
}

/// Bytes past 0x7F become `?`, like a strict ASCII decoder would do.
fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| if b.is_ascii() { *b as char } else { '?' })
        .collect()
}

/// `SipResponse` Tokio codec. A UDP datagram holds exactly one message, so
/// the whole buffer is consumed on every call.
#[derive(Default)]
pub struct SipResponseCodec;

impl SipResponseCodec {
    pub fn new() -> Self {
        SipResponseCodec {}
    }

    pub fn inner_decode(&mut self, src: &mut BytesMut) -> Result<Option<SipResponse>, IoError> {
        if src.is_empty() {
            return Ok(None);
        }
        let datagram = src.split();
        Ok(Some(SipResponse::parse(decode_ascii(&datagram))))
    }
}

impl tokio_util::codec::Decoder for SipResponseCodec {
    type Item = SipResponse;
    type Error = IoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SipResponse>, IoError> {
        self.inner_decode(src)
    }
}
