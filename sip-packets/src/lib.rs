//! SIP packets used to probe Polycom VVX phones.
//!
//! Only the small subset of SIP needed for discovery is covered: an
//! out-of-dialog `NOTIFY` request and a tolerant decoder for whatever the
//! phone sends back.

pub mod contact;
pub mod device_type;
pub mod notify;
pub mod response;

pub use self::contact::Contact;
pub use self::notify::{NotifyRequest, NotifyRequestCodec};
pub use self::response::{SipResponse, SipResponseCodec, StatusLine};

/// Line terminator used by SIP textual framing.
pub const CRLF: &str = "\r\n";

/// Protocol version string used in request and status lines.
pub const SIP_VERSION: &str = "SIP/2.0";
