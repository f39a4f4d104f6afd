use bytes::BytesMut;
use log::{debug, info, warn};
use sip_packets::{
    device_type, Contact, NotifyRequest, NotifyRequestCodec, SipResponse, SipResponseCodec,
};
use std::net::{IpAddr, SocketAddr};
use tokio_util::codec::{Decoder, Encoder};

use super::socket::ProbeSocket;
use super::types::{DiscoveryResult, NotifyResult, ProbeSettings, ProbeStatus, ProbeTarget};

/// Token a VVX puts in its Contact line.
pub const VVX_MARKER: &str = "PolycomVVX";

/// What came back from the single request/response exchange of a probe.
#[derive(Debug)]
enum Exchange {
    Answered(SipResponse),
    NoData,
    Failed {
        status: ProbeStatus,
        response: Option<String>,
    },
}

impl Exchange {
    fn failed(status: ProbeStatus) -> Self {
        Exchange::Failed {
            status,
            response: None,
        }
    }
}

/// Sends one NOTIFY to `target` and waits for one answer. `event` switches
/// between discovery (`None`) and notify mode.
fn exchange(target: &ProbeTarget, settings: &ProbeSettings, event: Option<&str>) -> Exchange {
    let local_ip = match settings.local_ip.parse::<IpAddr>() {
        Ok(ip) => ip,
        Err(err) => {
            warn!("[Probe] invalid local address {}: {}", settings.local_ip, err);
            return Exchange::failed(ProbeStatus::SocketFailure);
        }
    };
    let socket = match ProbeSocket::bind(SocketAddr::new(local_ip, settings.local_port)) {
        Ok(socket) => socket,
        Err(err) => {
            warn!(
                "[Probe] cannot bind {}:{}: {}",
                settings.local_ip, settings.local_port, err
            );
            return Exchange::failed(ProbeStatus::SocketFailure);
        }
    };
    if let Err(err) = socket.connect(&target.address, target.port) {
        warn!(
            "[Probe] cannot connect to {}:{}: {}",
            target.address, target.port, err
        );
        return Exchange::failed(ProbeStatus::UnableToConnect);
    }

    let local_port = socket.local_addr().port();
    let request = match event {
        Some(event) => NotifyRequest::notify(
            target.address.as_str(),
            target.port,
            settings.local_ip.as_str(),
            local_port,
            event,
        ),
        None => NotifyRequest::discover(
            target.address.as_str(),
            target.port,
            settings.local_ip.as_str(),
            local_port,
        ),
    };
    let mut datagram = BytesMut::new();
    if let Err(err) = NotifyRequestCodec::new().encode(&request, &mut datagram) {
        warn!("[Probe] cannot encode request for {}: {}", target.address, err);
        return Exchange::failed(ProbeStatus::UnableToConnect);
    }
    if let Err(err) = socket.send(&datagram) {
        warn!("[Probe] cannot send to {}: {}", target.address, err);
        return Exchange::failed(ProbeStatus::UnableToConnect);
    }
    debug!("[Probe] sent {} bytes to {}", datagram.len(), target.address);

    match socket.receive(settings.effective_wait_time()) {
        Ok(None) => Exchange::failed(ProbeStatus::NoResponse),
        Ok(Some(mut received)) => match SipResponseCodec::new().decode(&mut received) {
            Ok(Some(response)) => Exchange::Answered(response),
            _ => Exchange::NoData,
        },
        Err(err) => Exchange::Failed {
            status: ProbeStatus::SocketFailure,
            response: Some(err.to_string()),
        },
    }
}

fn is_vvx(contact: &Contact) -> bool {
    contact.value.contains(VVX_MARKER)
}

/// Discovery of a single device.
pub fn discover(target: &ProbeTarget, settings: &ProbeSettings) -> DiscoveryResult {
    let mut result = DiscoveryResult {
        device: target.address.clone(),
        port: target.port,
        local_ip: settings.local_ip.clone(),
        ..Default::default()
    };
    match exchange(target, settings, None) {
        Exchange::Answered(response) => apply_discovery(&mut result, &response),
        Exchange::NoData => result.status = ProbeStatus::NoDataReceived,
        Exchange::Failed { status, response } => {
            result.status = status;
            result.response = response;
        }
    }
    info!("[Probe] discover {}: {}", result.device, result.status);
    result
}

fn apply_discovery(result: &mut DiscoveryResult, response: &SipResponse) {
    result.response = Some(response.raw.clone());
    // any answer proves the device is there
    result.status = ProbeStatus::Online;
    if !response.is_ok() {
        return;
    }

    result.device_type = Some(device_type::classify(&response.raw).to_string());
    if let Some(contact) = response.contact() {
        if contact.is_registered() {
            result.sip_user = Some(contact.user_part().to_string());
            result.lync_server = contact.target_name().map(String::from);
        }
    }
    result.user_agent = response.user_agent().map(String::from);
}

/// Sends `event` to a single device and reports who is logged in.
pub fn notify(target: &ProbeTarget, settings: &ProbeSettings, event: &str) -> NotifyResult {
    let mut result = NotifyResult {
        device: target.address.clone(),
        port: target.port,
        local_ip: settings.local_ip.clone(),
        ..Default::default()
    };
    match exchange(target, settings, Some(event)) {
        Exchange::Answered(response) => apply_notify(&mut result, &response),
        Exchange::NoData => result.status = ProbeStatus::NoDataReceived,
        Exchange::Failed { status, response } => {
            result.status = status;
            result.response = response;
        }
    }
    info!("[Probe] notify {} ({}): {}", result.device, event, result.status);
    result
}

fn apply_notify(result: &mut NotifyResult, response: &SipResponse) {
    result.response = Some(response.raw.clone());
    if !response.is_ok() {
        result.status = ProbeStatus::Error;
        return;
    }
    let contact = match response.contact() {
        Some(contact) if is_vvx(&contact) => contact,
        _ => {
            result.status = ProbeStatus::NonVVXDevice;
            return;
        }
    };

    result.device_type = Some(device_type::classify(&response.raw).to_string());
    result.user_agent = response.user_agent().map(String::from);

    if let Some(model) = contact.bare_model_code() {
        info!(
            "[Probe] {} ({}) has no user logged in",
            result.device,
            model.trim_end_matches('@')
        );
        result.client_app = result.user_agent.clone();
        result.status = ProbeStatus::Online;
        result.registered = false;
    } else if contact.is_registered() {
        result.sip_user = Some(contact.user_part().to_string());
        result.lync_server = contact.target_name().map(String::from);
        result.client_app = result.user_agent.clone();
        result.status = ProbeStatus::Online;
        result.registered = true;
    } else {
        result.status = ProbeStatus::NonVVXDevice;
    }
}

/// Devices are probed one after the other, in the given order.
pub fn discover_batch(targets: &[ProbeTarget], settings: &ProbeSettings) -> Vec<DiscoveryResult> {
    targets
        .iter()
        .map(|target| discover(target, settings))
        .collect()
}

pub fn notify_batch(
    targets: &[ProbeTarget],
    settings: &ProbeSettings,
    event: &str,
) -> Vec<NotifyResult> {
    targets
        .iter()
        .map(|target| notify(target, settings, event))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::sync::mpsc;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    const REGISTERED_OK: &str = "SIP/2.0 200 OK\r\n\
        Via: SIP/2.0/UDP 127.0.0.1:50000;branch=z9hG4bK1\r\n\
        CSeq: 1 NOTIFY\r\n\
        Contact: <sip:alice@contoso.com;opaque=user:epid:Xk3;gruu>;+sip.instance=\"<urn:uuid:1>\";+x-agent=\"PolycomVVX-VVX_411\";targetname=\"pool01.contoso.com\"\r\n\
        User-Agent: PolycomVVX-VVX_411-UA/5.9.0.9373\r\n\
        Content-Length: 0\r\n\
        \r\n";

    const LOGGED_OUT_OK: &str = "SIP/2.0 200 OK\r\n\
        CSeq: 1 NOTIFY\r\n\
        Contact: <sip:VVX500@10.0.0.5:5060>;+x-agent=\"PolycomVVX-VVX_500\"\r\n\
        User-Agent: PolycomVVX-VVX_500-UA/6.4.0.1\r\n\
        \r\n";

    const OTHER_VENDOR_OK: &str = "SIP/2.0 200 OK\r\n\
        Contact: <sip:bob@10.0.0.9;opaque=x>\r\n\
        User-Agent: Yealink SIP-T46S\r\n\
        \r\n";

    const NOT_FOUND: &str = "SIP/2.0 404 Not Found\r\nCSeq: 1 NOTIFY\r\n\r\n";

    fn loopback_settings(wait_ms: u64) -> ProbeSettings {
        ProbeSettings::new("127.0.0.1", 0, Duration::from_millis(wait_ms))
    }

    /// Loopback peer answering the first datagram with `answer` and handing
    /// back what it received.
    fn responder(answer: &'static [u8]) -> (u16, JoinHandle<String>) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();
        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            ready_tx.send(()).unwrap();
            let mut buf = [0u8; 2048];
            let (len, from) = peer.recv_from(&mut buf).unwrap();
            peer.send_to(answer, from).unwrap();
            String::from_utf8_lossy(&buf[..len]).into_owned()
        });
        ready_rx.recv().unwrap();
        (port, handle)
    }

    #[test]
    fn test_discovery_registered_phone() {
        let mut result = DiscoveryResult::default();
        apply_discovery(&mut result, &SipResponse::parse(REGISTERED_OK));

        assert_eq!(result.status, ProbeStatus::Online);
        assert_eq!(result.device_type.as_deref(), Some("VVX 411"));
        assert_eq!(result.sip_user.as_deref(), Some("alice@contoso.com"));
        assert_eq!(result.lync_server.as_deref(), Some("pool01.contoso.com"));
        assert_eq!(
            result.user_agent.as_deref(),
            Some("PolycomVVX-VVX_411-UA/5.9.0.9373")
        );
        assert_eq!(result.response.as_deref(), Some(REGISTERED_OK));
    }

    #[test]
    fn test_discovery_unknown_device() {
        let mut result = DiscoveryResult::default();
        apply_discovery(
            &mut result,
            &SipResponse::parse("SIP/2.0 200 OK\r\nContact: <sip:100@10.0.0.7>\r\n\r\n"),
        );
        assert_eq!(result.status, ProbeStatus::Online);
        assert_eq!(result.device_type.as_deref(), Some("SIP Device"));
        assert_eq!(result.sip_user, None);
        assert_eq!(result.user_agent, None);
    }

    #[test]
    fn test_non_ok_answer_is_online_for_discovery_and_error_for_notify() {
        let response = SipResponse::parse(NOT_FOUND);

        let mut discovered = DiscoveryResult::default();
        apply_discovery(&mut discovered, &response);
        assert_eq!(discovered.status, ProbeStatus::Online);
        assert_eq!(discovered.device_type, None);
        assert_eq!(discovered.response.as_deref(), Some(NOT_FOUND));

        let mut notified = NotifyResult::default();
        apply_notify(&mut notified, &response);
        assert_eq!(notified.status, ProbeStatus::Error);
        assert_eq!(notified.response.as_deref(), Some(NOT_FOUND));
    }

    #[test]
    fn test_notify_registered_phone() {
        let mut result = NotifyResult::default();
        apply_notify(&mut result, &SipResponse::parse(REGISTERED_OK));

        assert_eq!(result.status, ProbeStatus::Online);
        assert!(result.registered);
        assert_eq!(result.sip_user.as_deref(), Some("alice@contoso.com"));
        assert_eq!(result.lync_server.as_deref(), Some("pool01.contoso.com"));
        assert_eq!(
            result.client_app.as_deref(),
            Some("PolycomVVX-VVX_411-UA/5.9.0.9373")
        );
    }

    #[test]
    fn test_notify_phone_without_user() {
        let mut result = NotifyResult::default();
        apply_notify(&mut result, &SipResponse::parse(LOGGED_OUT_OK));

        assert_eq!(result.status, ProbeStatus::Online);
        assert!(!result.registered);
        assert_eq!(result.sip_user, None);
        assert_eq!(result.device_type.as_deref(), Some("VVX 500"));
        assert_eq!(result.client_app.as_deref(), Some("PolycomVVX-VVX_500-UA/6.4.0.1"));
    }

    #[test]
    fn test_notify_other_vendor() {
        let mut result = NotifyResult::default();
        apply_notify(&mut result, &SipResponse::parse(OTHER_VENDOR_OK));
        assert_eq!(result.status, ProbeStatus::NonVVXDevice);
        assert_eq!(result.sip_user, None);
    }

    #[test]
    fn test_notify_marker_only_in_user_agent() {
        let mut result = NotifyResult::default();
        apply_notify(
            &mut result,
            &SipResponse::parse(
                "SIP/2.0 200 OK\r\n\
                 Contact: <sip:alice@contoso.com;opaque=user:epid:Xk3;gruu>\r\n\
                 User-Agent: PolycomVVX-VVX_411-UA/5.9.0.9373\r\n\r\n",
            ),
        );
        assert_eq!(result.status, ProbeStatus::NonVVXDevice);
        assert!(!result.registered);
        assert_eq!(result.sip_user, None);
    }

    #[test]
    fn test_notify_without_contact() {
        let mut result = NotifyResult::default();
        apply_notify(
            &mut result,
            &SipResponse::parse("SIP/2.0 200 OK\r\nUser-Agent: PolycomVVX-VVX_411-UA/5.9\r\n\r\n"),
        );
        assert_eq!(result.status, ProbeStatus::NonVVXDevice);
    }

    #[test]
    fn test_notify_ok_with_extended_reason() {
        let answer = LOGGED_OUT_OK.replacen("200 OK", "200 OK - accepted", 1);
        let mut notified = NotifyResult::default();
        apply_notify(&mut notified, &SipResponse::parse(answer.as_str()));
        assert_eq!(notified.status, ProbeStatus::Online);
        assert_eq!(notified.device_type.as_deref(), Some("VVX 500"));

        let mut discovered = DiscoveryResult::default();
        apply_discovery(&mut discovered, &SipResponse::parse(answer.as_str()));
        assert_eq!(discovered.device_type.as_deref(), Some("VVX 500"));
    }

    #[test]
    fn test_notify_ok_after_keep_alive() {
        let answer = format!("\r\n{}", LOGGED_OUT_OK);
        let mut result = NotifyResult::default();
        apply_notify(&mut result, &SipResponse::parse(answer.as_str()));
        assert_eq!(result.status, ProbeStatus::Online);
        assert!(!result.registered);
        assert_eq!(result.client_app.as_deref(), Some("PolycomVVX-VVX_500-UA/6.4.0.1"));
    }

    #[test]
    fn test_notify_vvx_neither_registered_nor_idle() {
        let mut result = NotifyResult::default();
        apply_notify(
            &mut result,
            &SipResponse::parse(
                "SIP/2.0 200 OK\r\nContact: <sip:1234@10.0.0.5>;+x-agent=\"PolycomVVX-VVX_311\"\r\n\r\n",
            ),
        );
        assert_eq!(result.status, ProbeStatus::NonVVXDevice);
    }

    #[test]
    fn test_discover_silent_peer() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = ProbeTarget::new("127.0.0.1", peer.local_addr().unwrap().port());

        let result = discover(&target, &loopback_settings(50));
        assert_eq!(result.status, ProbeStatus::NoResponse);
        assert_eq!(result.response, None);
        assert_eq!(result.device_type, None);
        assert_eq!(result.local_ip, "127.0.0.1");
    }

    #[test]
    fn test_zero_wait_time_is_clamped() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = ProbeTarget::new("127.0.0.1", peer.local_addr().unwrap().port());

        let result = discover(&target, &loopback_settings(0));
        assert_eq!(result.status, ProbeStatus::NoResponse);
    }

    #[test]
    fn test_discover_documentation_address() {
        let target = ProbeTarget::new("198.51.100.9", 5060);
        let settings = ProbeSettings::new("0.0.0.0", 0, Duration::from_millis(50));
        // the outcome depends on whether this host has a route to TEST-NET-2
        let routed = UdpSocket::bind("0.0.0.0:0")
            .and_then(|socket| socket.connect("198.51.100.9:5060"))
            .is_ok();

        let result = discover(&target, &settings);
        if routed {
            assert_eq!(result.status, ProbeStatus::NoResponse);
        } else {
            assert_eq!(result.status, ProbeStatus::UnableToConnect);
        }
        assert_eq!(result.device_type, None);
        assert_eq!(result.response, None);
    }

    #[test]
    fn test_discover_over_loopback() {
        let (port, handle) = responder(REGISTERED_OK.as_bytes());
        let target = ProbeTarget::new("127.0.0.1", port);

        let result = discover(&target, &loopback_settings(2000));
        let request = handle.join().unwrap();

        assert!(request.starts_with(&format!("NOTIFY sip:127.0.0.1:{} SIP/2.0\r\n", port)));
        assert!(!request.contains("Event:"));
        assert!(request.ends_with("Content-Length: 0\r\n\r\n"));
        assert_eq!(result.status, ProbeStatus::Online);
        assert_eq!(result.device_type.as_deref(), Some("VVX 411"));
        assert_eq!(result.port, port);
    }

    #[test]
    fn test_notify_over_loopback() {
        let (port, handle) = responder(LOGGED_OUT_OK.as_bytes());
        let target = ProbeTarget::new("127.0.0.1", port);

        let result = notify(&target, &loopback_settings(2000), "check-sync");
        let request = handle.join().unwrap();

        assert!(request.contains("\r\nEvent: check-sync\r\n"));
        assert!(request.contains("\r\nMax-Forwards: 10\r\n"));
        assert_eq!(result.status, ProbeStatus::Online);
        assert!(!result.registered);
    }

    #[test]
    fn test_empty_datagram() {
        let (port, handle) = responder(b"");
        let target = ProbeTarget::new("127.0.0.1", port);

        let result = discover(&target, &loopback_settings(2000));
        handle.join().unwrap();
        assert_eq!(result.status, ProbeStatus::NoDataReceived);
        assert_eq!(result.response, None);
    }

    #[test]
    fn test_unresolvable_device() {
        let target = ProbeTarget::new("no-such-phone.invalid", 5060);
        let result = notify(&target, &loopback_settings(50), "check-sync");
        assert_eq!(result.status, ProbeStatus::UnableToConnect);
    }

    #[test]
    fn test_bind_failures() {
        let target = ProbeTarget::new("127.0.0.1", 5060);

        let result = discover(&target, &ProbeSettings::new("not-an-ip", 0, Duration::ZERO));
        assert_eq!(result.status, ProbeStatus::SocketFailure);

        let busy = UdpSocket::bind("127.0.0.1:0").unwrap();
        let busy_port = busy.local_addr().unwrap().port();
        let result = discover(
            &target,
            &ProbeSettings::new("127.0.0.1", busy_port, Duration::from_millis(10)),
        );
        assert_eq!(result.status, ProbeStatus::SocketFailure);
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let first = UdpSocket::bind("127.0.0.1:0").unwrap();
        let second = UdpSocket::bind("127.0.0.1:0").unwrap();
        let targets = vec![
            ProbeTarget::new("127.0.0.1", second.local_addr().unwrap().port()),
            ProbeTarget::new("no-such-phone.invalid", 5060),
            ProbeTarget::new("127.0.0.1", first.local_addr().unwrap().port()),
        ];

        let results = discover_batch(&targets, &loopback_settings(10));
        let statuses: Vec<ProbeStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProbeStatus::NoResponse,
                ProbeStatus::UnableToConnect,
                ProbeStatus::NoResponse
            ]
        );
        assert_eq!(results[1].device, "no-such-phone.invalid");
    }
}
