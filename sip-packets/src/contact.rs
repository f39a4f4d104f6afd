use lazy_static::lazy_static;
use regex::Regex;

use crate::device_type;

lazy_static! {
    static ref TARGET_NAME: Regex = Regex::new(r#"targetname="([^"]*)""#).unwrap();
}

/// Contact header value of a probe response.
///
/// A phone with nobody logged in answers with its bare model code as user
/// (`<sip:VVX500@10.0.0.5:5060>`). A phone registered against a Skype for
/// Business / Lync pool answers with the signed-in user, an `opaque` GRUU
/// parameter and, usually, the pool FQDN as `targetname`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub value: String,
}

impl Contact {
    pub const SIP_SCHEME: &'static str = "sip:";
    pub const OPAQUE_PARAM: &'static str = ";opaque";

    pub fn parse(value: &str) -> Self {
        Contact {
            value: value.trim().to_string(),
        }
    }

    /// Everything after the `sip:` scheme, or the whole value when the
    /// scheme is missing.
    pub fn payload(&self) -> &str {
        match self.value.find(Self::SIP_SCHEME) {
            Some(idx) => &self.value[idx + Self::SIP_SCHEME.len()..],
            None => self.value.trim_start_matches('<'),
        }
    }

    /// Payload up to the first URI parameter or the closing bracket.
    pub fn user_part(&self) -> &str {
        let payload = self.payload();
        let end = payload.find(|c: char| c == ';' || c == '>').unwrap_or(payload.len());
        &payload[..end]
    }

    /// The phone is signed in and registered.
    pub fn is_registered(&self) -> bool {
        self.payload().contains(Self::OPAQUE_PARAM)
    }

    /// Registrar / pool name from the `targetname="..."` attribute.
    pub fn target_name(&self) -> Option<&str> {
        TARGET_NAME
            .captures(&self.value)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }

    /// The bare model code the user part starts with, if any.
    pub fn bare_model_code(&self) -> Option<&'static str> {
        let user = self.user_part();
        device_type::bare_model_codes().find(|code| user.starts_with(code))
    }
}
