/// Label used when a phone answered but none of the known patterns matched.
pub const GENERIC_SIP_DEVICE: &str = "SIP Device";

/// Ordered list of `(pattern, model)` pairs matched against a SIP response.
///
/// Two pattern families are present: the bare model code a phone with no
/// user logged in puts in its Contact user part (`VVX500@`), and the model
/// token of the User-Agent (`PolycomVVX-VVX_500`). Lookup is first match
/// wins, so a code which contains a shorter one (`VVX_1500` contains
/// `VVX_150`) must come first.
pub const DEVICE_TYPES: &[(&str, &str)] = &[
    ("VVX1500@", "VVX 1500"),
    ("PolycomVVX-VVX_1500", "VVX 1500"),
    ("VVX101@", "VVX 101"),
    ("PolycomVVX-VVX_101", "VVX 101"),
    ("VVX150@", "VVX 150"),
    ("PolycomVVX-VVX_150", "VVX 150"),
    ("VVX201@", "VVX 201"),
    ("PolycomVVX-VVX_201", "VVX 201"),
    ("VVX250@", "VVX 250"),
    ("PolycomVVX-VVX_250", "VVX 250"),
    ("VVX300@", "VVX 300"),
    ("PolycomVVX-VVX_300", "VVX 300"),
    ("VVX301@", "VVX 301"),
    ("PolycomVVX-VVX_301", "VVX 301"),
    ("VVX310@", "VVX 310"),
    ("PolycomVVX-VVX_310", "VVX 310"),
    ("VVX311@", "VVX 311"),
    ("PolycomVVX-VVX_311", "VVX 311"),
    ("VVX350@", "VVX 350"),
    ("PolycomVVX-VVX_350", "VVX 350"),
    ("VVX400@", "VVX 400"),
    ("PolycomVVX-VVX_400", "VVX 400"),
    ("VVX401@", "VVX 401"),
    ("PolycomVVX-VVX_401", "VVX 401"),
    ("VVX410@", "VVX 410"),
    ("PolycomVVX-VVX_410", "VVX 410"),
    ("VVX411@", "VVX 411"),
    ("PolycomVVX-VVX_411", "VVX 411"),
    ("VVX450@", "VVX 450"),
    ("PolycomVVX-VVX_450", "VVX 450"),
    ("VVX500@", "VVX 500"),
    ("PolycomVVX-VVX_500", "VVX 500"),
    ("VVX501@", "VVX 501"),
    ("PolycomVVX-VVX_501", "VVX 501"),
    ("VVX600@", "VVX 600"),
    ("PolycomVVX-VVX_600", "VVX 600"),
    ("VVX601@", "VVX 601"),
    ("PolycomVVX-VVX_601", "VVX 601"),
];

/// Returns the model of the first pattern contained in `text`.
pub fn lookup(text: &str) -> Option<&'static str> {
    DEVICE_TYPES
        .iter()
        .find(|(pattern, _)| text.contains(pattern))
        .map(|(_, model)| *model)
}

/// Like [`lookup`] but falls back to [`GENERIC_SIP_DEVICE`].
pub fn classify(text: &str) -> &'static str {
    lookup(text).unwrap_or(GENERIC_SIP_DEVICE)
}

/// Bare model codes (`VVX500@` ...) a phone advertises in its Contact when
/// nobody is logged in.
pub fn bare_model_codes() -> impl Iterator<Item = &'static str> {
    DEVICE_TYPES
        .iter()
        .map(|(pattern, _)| *pattern)
        .filter(|pattern| pattern.ends_with('@'))
}
