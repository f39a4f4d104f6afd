pub mod envelope;
pub mod request;
pub mod status;

pub use envelope::{wrap_body, ResponseEnvelope};
pub use request::{HttpMethod, Protocol, ProtocolError};
pub use status::ApiStatus;
