//! SIP NOTIFY probes: one UDP request, one answer, one result per device.

mod engine;
mod socket;
mod types;

pub use engine::{discover, discover_batch, notify, notify_batch, VVX_MARKER};
pub use types::{DiscoveryResult, NotifyResult, ProbeSettings, ProbeStatus, ProbeTarget};
