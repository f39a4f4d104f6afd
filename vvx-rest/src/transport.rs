use log::debug;
use reqwest::{
    blocking::Client,
    header::{CONTENT_TYPE, USER_AGENT},
    redirect::Policy,
    Method,
};
use std::time::Duration;
use vvx_proto::HttpMethod;

use crate::error::{RestError, RestResult, TransportError};
use crate::options::Credential;

/// A fully resolved request. Built once and reused untouched by every
/// attempt of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub uri: String,
    pub method: HttpMethod,
    pub content_type: &'static str,
    /// Serialized entity, `None` when nothing is sent.
    pub body: Option<String>,
    pub timeout: Duration,
    pub credential: Option<Credential>,
}

impl PreparedRequest {
    pub const JSON: &'static str = "application/json";
    pub const XML: &'static str = "text/xml";
}

/// Seam between the dispatcher and the network.
pub trait Transport {
    /// Sends the request once and returns the response body of a 2xx answer.
    fn send(&self, request: &PreparedRequest) -> Result<String, TransportError>;
}

/// `reqwest` backed transport.
///
/// Trust policy is a property of the client, so a dispatcher that accepts
/// any certificate never affects another one.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    const USER_AGENT: &'static str = concat!("vvx/", env!("CARGO_PKG_VERSION"));

    pub fn new(ignore_tls_errors: bool) -> RestResult<Self> {
        let client = Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(ignore_tls_errors)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|err| RestError::Client(err.to_string()))?;
        Ok(HttpTransport { client })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Get => Method::GET,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &PreparedRequest) -> Result<String, TransportError> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.uri)
            .timeout(request.timeout)
            .header(CONTENT_TYPE, request.content_type)
            .header(USER_AGENT, Self::USER_AGENT);
        if let Some(ref credential) = request.credential {
            builder = builder.basic_auth(&credential.username, Some(credential.password()));
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status();
        debug!("[REST] {} {} -> {}", request.method, request.uri, status);
        // redirects are not followed, a 3xx is as much a failure as a 5xx
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}
