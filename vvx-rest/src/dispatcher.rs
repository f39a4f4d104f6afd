use log::{debug, info, warn};
use serde_json::Value;
use vvx_proto::{wrap_body, ApiStatus, HttpMethod, Protocol, ResponseEnvelope};

use crate::error::{RestError, RestResult};
use crate::journal::{CallJournal, RestCall};
use crate::options::DispatchOptions;
use crate::push::PushMessage;
use crate::transport::{HttpTransport, PreparedRequest, Transport};

/// `<protocol>://<device>:<port>/<base>/<command>`, empty segments skipped.
pub fn build_uri(protocol: &Protocol, device: &str, port: u16, base: &str, command: &str) -> String {
    let path = [base, command]
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}://{}:{}/{}", protocol, device, port, path)
}

/// Turns a 2xx body into the payload of the call, according to its
/// application `Status`.
pub fn classify_response(uri: &str, body: &str) -> RestResult<Value> {
    let envelope: ResponseEnvelope =
        serde_json::from_str(body).map_err(|err| RestError::Decode {
            uri: uri.to_string(),
            reason: err.to_string(),
        })?;
    match ApiStatus::from_code(envelope.status) {
        Some(ApiStatus::Success) => Ok(envelope.data),
        Some(status) => Err(RestError::Api {
            code: status.code(),
            message: status.message(),
        }),
        None => Err(RestError::UnknownStatus(envelope.status)),
    }
}

pub struct Dispatcher<T: Transport = HttpTransport> {
    transport: T,
    journal: CallJournal,
}

impl Dispatcher<HttpTransport> {
    /// Dispatcher validating server certificates.
    pub fn new() -> RestResult<Self> {
        Self::with_tls_policy(false)
    }

    /// With `ignore_tls_errors` every certificate is accepted, for calls made
    /// through this dispatcher only.
    pub fn with_tls_policy(ignore_tls_errors: bool) -> RestResult<Self> {
        Ok(Self::with_transport(HttpTransport::new(ignore_tls_errors)?))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Dispatcher {
            transport,
            journal: CallJournal::default(),
        }
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    pub fn last_call(&self) -> Option<RestCall> {
        self.journal.last()
    }

    /// Runs `command` against `device`, building the URI from `options`.
    pub fn dispatch(
        &self,
        device: &str,
        command: &str,
        options: &DispatchOptions,
    ) -> RestResult<Value> {
        let uri = build_uri(&options.protocol, device, options.port, &options.base, command);
        self.dispatch_uri(&uri, options)
    }

    /// Same as [`Dispatcher::dispatch`] on an already resolved URI. Protocol,
    /// port and base of `options` are ignored.
    pub fn dispatch_uri(&self, uri: &str, options: &DispatchOptions) -> RestResult<Value> {
        let request = PreparedRequest {
            uri: uri.to_string(),
            method: options.method,
            content_type: PreparedRequest::JSON,
            body: options.body.clone().map(|body| wrap_body(body).to_string()),
            timeout: options.timeout,
            credential: options.credential.clone(),
        };
        let body = self.send(&request, options.retry_count)?;
        classify_response(uri, &body)
    }

    /// Sends `message` to the push endpoint of `device`. The phone answers
    /// with free text which is returned untouched.
    pub fn push(
        &self,
        device: &str,
        message: &PushMessage,
        options: &DispatchOptions,
    ) -> RestResult<String> {
        let request = PreparedRequest {
            uri: build_uri(&options.protocol, device, options.port, &options.base, ""),
            method: HttpMethod::Post,
            content_type: PreparedRequest::XML,
            body: Some(message.to_xml()),
            timeout: options.timeout,
            credential: options.credential.clone(),
        };
        self.send(&request, options.retry_count)
    }

    /// Sends `request` up to `retry_count + 1` times, stopping at the first
    /// transport success.
    fn send(&self, request: &PreparedRequest, retry_count: u32) -> RestResult<String> {
        let attempts = retry_count.saturating_add(1);
        let mut attempt = 1;
        loop {
            let id = self.journal.record(request, attempt);
            debug!(
                "[REST] {} {} attempt {}/{}",
                request.method, request.uri, attempt, attempts
            );
            match self.transport.send(request) {
                Ok(body) => {
                    self.journal.complete(id, &body);
                    return Ok(body);
                }
                Err(err) => {
                    self.journal.fail(id, err.to_string());
                    if attempt >= attempts {
                        warn!(
                            "[REST] {} {} giving up after {} attempt(s): {}",
                            request.method, request.uri, attempts, err
                        );
                        return Err(RestError::Transport {
                            uri: request.uri.clone(),
                            attempts,
                            source: err,
                        });
                    }
                    info!(
                        "[REST] {} {} failed ({}), {} retries left",
                        request.method,
                        request.uri,
                        err,
                        attempts - attempt
                    );
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::options::Credential;
    use crate::push::PushPriority;
    use crate::test_server::TestServer;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays scripted outcomes and remembers what it was asked to send.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<String, TransportError>>>,
        fallback: Option<String>,
        seen: RefCell<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Result<String, TransportError>>) -> Self {
            ScriptedTransport {
                replies: RefCell::new(replies.into()),
                ..Default::default()
            }
        }

        fn always(body: &str) -> Self {
            ScriptedTransport {
                fallback: Some(body.to_string()),
                ..Default::default()
            }
        }

        fn attempts(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &PreparedRequest) -> Result<String, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            match self.replies.borrow_mut().pop_front() {
                Some(reply) => reply,
                None => match self.fallback {
                    Some(ref body) => Ok(body.clone()),
                    None => Err(TransportError::Connect("connection refused".into())),
                },
            }
        }
    }

    fn test_options() -> DispatchOptions {
        DispatchOptions::default().with_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_build_uri() {
        assert_eq!(
            build_uri(&Protocol::https(), "10.0.0.5", 443, "api/v1", "mgmt/device/info"),
            "HTTPS://10.0.0.5:443/api/v1/mgmt/device/info"
        );
        assert_eq!(
            build_uri(&"http".parse().unwrap(), "phone", 8080, "/api/v1/", "/mgmt/lineInfo"),
            "http://phone:8080/api/v1/mgmt/lineInfo"
        );
        assert_eq!(
            build_uri(&Protocol::http(), "phone", 80, "push", ""),
            "HTTP://phone:80/push"
        );
    }

    #[test]
    fn test_device_info_over_https() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::always(
            r#"{"Status":2000,"data":{"model":"VVX 411"}}"#,
        ));
        let options = DispatchOptions::default()
            .with_protocol(Protocol::https())
            .with_port(443);

        let payload = dispatcher
            .dispatch("10.0.0.5", "mgmt/device/info", &options)
            .expect("Status 2000 should succeed");
        assert_eq!(payload, json!({"model": "VVX 411"}));

        let seen = dispatcher.transport.seen.borrow();
        assert_eq!(seen[0].uri, "HTTPS://10.0.0.5:443/api/v1/mgmt/device/info");
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].content_type, "application/json");
        assert_eq!(seen[0].body, None, "no body means no entity");
    }

    #[test]
    fn test_empty_mapping_body_is_sent() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::always(r#"{"Status":2000}"#));
        let options = test_options()
            .with_method(HttpMethod::Post)
            .with_body(json!({}));

        let payload = dispatcher
            .dispatch("phone", "mgmt/factoryReset", &options)
            .expect("factory reset should succeed");
        assert_eq!(payload, Value::Null);
        assert_eq!(
            dispatcher.transport.seen.borrow()[0].body.as_deref(),
            Some(r#"{"data":{}}"#)
        );
    }

    #[test]
    fn test_application_errors() {
        for code in (4001..=4010).chain([5000]) {
            let body = format!(r#"{{"Status":{}}}"#, code);
            let dispatcher = Dispatcher::with_transport(ScriptedTransport::always(&body));
            let err = dispatcher
                .dispatch("phone", "mgmt/lineInfo", &test_options())
                .expect_err("non 2000 status must fail");
            let expected = ApiStatus::from_code(code).unwrap().message();
            assert!(
                err.to_string().contains(expected),
                "{} should mention \"{}\"",
                err,
                expected
            );
            assert_eq!(dispatcher.transport.attempts(), 1, "API errors are not retried");
        }
    }

    #[test]
    fn test_unknown_status_code() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::always(r#"{"Status":4242}"#));
        let err = dispatcher
            .dispatch("phone", "mgmt/lineInfo", &test_options())
            .expect_err("unknown status must fail");
        assert!(matches!(err, RestError::UnknownStatus(4242)));
        assert!(err.to_string().contains("unknown status code 4242"));
    }

    #[test]
    fn test_retry_exhaustion() {
        for retry_count in [0u32, 1, 3] {
            let dispatcher = Dispatcher::with_transport(ScriptedTransport::default());
            let options = test_options().with_retry_count(retry_count);
            let err = dispatcher
                .dispatch("phone", "mgmt/device/info", &options)
                .expect_err("transport never succeeds");

            assert_eq!(dispatcher.transport.attempts() as u32, retry_count + 1);
            match err {
                RestError::Transport { attempts, .. } => assert_eq!(attempts, retry_count + 1),
                other => panic!("expected a transport error, got {:?}", other),
            }
            let calls = dispatcher.journal().calls();
            assert_eq!(calls.len() as u32, retry_count + 1);
            assert!(calls.iter().all(|c| c.error.is_some()));
        }
    }

    #[test]
    fn test_retries_reuse_resolved_request() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::replying(vec![
            Err(TransportError::Timeout("timed out".into())),
            Err(TransportError::Status(503)),
            Ok(r#"{"Status":2000,"data":[1,2]}"#.into()),
        ]));
        let options = test_options()
            .with_method(HttpMethod::Post)
            .with_body(json!(["device.prov.serverName"]))
            .with_credential(Some(Credential::new("Polycom", "456")));

        let payload = dispatcher
            .dispatch("phone", "mgmt/config/get", &options)
            .expect("third attempt succeeds");
        assert_eq!(payload, json!([1, 2]));

        let seen = dispatcher.transport.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|request| *request == seen[0]));

        let last = dispatcher.last_call().expect("journal should hold the call");
        assert_eq!(last.attempt, 3);
        assert!(last.error.is_none());
        assert_eq!(last.username.as_deref(), Some("Polycom"));
    }

    #[test]
    fn test_decode_error_not_retried() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::always("<html>login</html>"));
        let err = dispatcher
            .dispatch("phone", "mgmt/device/info", &test_options())
            .expect_err("HTML is not an envelope");
        assert!(matches!(err, RestError::Decode { .. }));
        assert_eq!(dispatcher.transport.attempts(), 1);
    }

    #[test]
    fn test_repeated_dispatch_records_independent_calls() {
        let dispatcher = Dispatcher::with_transport(ScriptedTransport::replying(vec![
            Err(TransportError::Connect("refused".into())),
            Ok(r#"{"Status":2000,"data":"a"}"#.into()),
            Ok(r#"{"Status":2000,"data":"b"}"#.into()),
        ]));
        let options = test_options();

        assert_eq!(dispatcher.dispatch("phone", "mgmt/lineInfo", &options).unwrap(), json!("a"));
        let first = dispatcher.last_call().unwrap();
        assert_eq!(dispatcher.dispatch("phone", "mgmt/lineInfo", &options).unwrap(), json!("b"));
        let second = dispatcher.last_call().unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.attempt, 1);
        assert!(second.error.is_none(), "error of an earlier call must not leak");
        assert_eq!(second.response_body.as_deref(), Some(r#"{"Status":2000,"data":"b"}"#));
    }

    #[test]
    fn test_http_dispatch() {
        let server = TestServer::start(vec![(200, r#"{"Status":2000,"data":{"model":"VVX 411"}}"#)]);
        let dispatcher = Dispatcher::new().expect("client should build");
        let options = test_options()
            .with_port(server.port())
            .with_credential(Some(Credential::new("Polycom", "456")));

        let payload = dispatcher
            .dispatch("127.0.0.1", "mgmt/device/info", &options)
            .expect("dispatch should succeed");
        assert_eq!(payload, json!({"model": "VVX 411"}));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/v1/mgmt/device/info");
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(requests[0].authorization.as_deref(), Some("Basic UG9seWNvbTo0NTY="));
        assert_eq!(requests[0].body, "");
    }

    #[test]
    fn test_http_factory_reset_payload() {
        let server = TestServer::start(vec![(200, r#"{"Status":2000}"#)]);
        let dispatcher = Dispatcher::new().unwrap();
        let options = test_options()
            .with_port(server.port())
            .with_method(HttpMethod::Post)
            .with_body(json!({}));

        dispatcher
            .dispatch("127.0.0.1", "mgmt/factoryReset", &options)
            .expect("factory reset should succeed");
        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].body, r#"{"data":{}}"#);
    }

    #[test]
    fn test_http_error_status_is_retried() {
        let server = TestServer::start(vec![(500, "oops")]);
        let dispatcher = Dispatcher::new().unwrap();
        let options = test_options().with_port(server.port()).with_retry_count(2);

        let err = dispatcher
            .dispatch("127.0.0.1", "mgmt/device/info", &options)
            .expect_err("500 is a transport failure");
        assert!(err.is_transport());
        assert_eq!(server.hits(), 3);
    }

    #[test]
    fn test_http_redirect_not_followed() {
        let server = TestServer::start(vec![(302, "")]);
        let dispatcher = Dispatcher::new().unwrap();
        let options = test_options().with_port(server.port()).with_retry_count(0);

        let err = dispatcher
            .dispatch("127.0.0.1", "mgmt/device/info", &options)
            .expect_err("redirects are failures");
        assert!(matches!(
            err,
            RestError::Transport {
                source: TransportError::Status(302),
                ..
            }
        ));
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn test_http_then_success() {
        let server = TestServer::start(vec![(503, ""), (200, r#"{"Status":2000,"data":"up"}"#)]);
        let dispatcher = Dispatcher::new().unwrap();
        let options = test_options().with_port(server.port());

        let payload = dispatcher
            .dispatch("127.0.0.1", "mgmt/network/info", &options)
            .expect("second attempt succeeds");
        assert_eq!(payload, json!("up"));
        assert_eq!(server.hits(), 2);
    }

    #[test]
    fn test_http_push() {
        let server = TestServer::start(vec![(200, "Push Message will be displayed successfully")]);
        let dispatcher = Dispatcher::new().unwrap();
        let options = DispatchOptions::push()
            .with_port(server.port())
            .with_timeout(Duration::from_secs(2));

        let answer = dispatcher
            .push(
                "127.0.0.1",
                &PushMessage::text(PushPriority::Important, "Lunch & learn"),
                &options,
            )
            .expect("push should succeed");
        assert_eq!(answer, "Push Message will be displayed successfully");

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/push");
        assert_eq!(requests[0].content_type.as_deref(), Some("text/xml"));
        assert_eq!(
            requests[0].body,
            "<PolycomIPPhone><Data priority=\"Important\">Lunch &amp; learn</Data></PolycomIPPhone>"
        );
    }
}
