//! Blocking client for the Polycom VVX management API.
//!
//! Every call goes through [`Dispatcher`]: the URI is resolved once, the body
//! is put in the `{"data": ...}` envelope, transport failures are retried a
//! bounded number of times and the application `Status` of the answer decides
//! between a payload and an error. Each attempt leaves a [`RestCall`] in the
//! dispatcher's [`CallJournal`].

#[cfg(test)]
extern crate axum;
extern crate log;
extern crate quick_xml;
extern crate reqwest;
extern crate serde_json;
extern crate thiserror;
#[cfg(test)]
extern crate tokio;
extern crate vvx_proto;

mod dispatcher;
mod error;
mod journal;
mod options;
mod push;
mod transport;

#[cfg(test)]
mod test_server;

pub use dispatcher::{build_uri, classify_response, Dispatcher};
pub use error::{RestError, RestResult, TransportError};
pub use journal::{CallJournal, RestCall};
pub use options::{Credential, DispatchOptions};
pub use push::{PushMessage, PushPriority};
pub use transport::{HttpTransport, PreparedRequest, Transport};

pub use vvx_proto::{HttpMethod, Protocol};
