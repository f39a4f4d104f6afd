use log::debug;
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::ops::RangeInclusive;

use crate::error::{ExecResult, ExecutionError};

/// Dynamic/private port range.
pub const EPHEMERAL_PORTS: RangeInclusive<u16> = 49152..=65535;
pub const MAX_PORT_TRIES: usize = 32;

const VIRTUAL_INTERFACE_PREFIXES: &[&str] = &["lo", "docker", "veth"];

fn is_usable(interface_name: &str, ip: &Ipv4Addr) -> bool {
    !VIRTUAL_INTERFACE_PREFIXES
        .iter()
        .any(|prefix| interface_name.starts_with(prefix))
        && !ip.is_loopback()
        && !ip.is_link_local()
        && !ip.is_unspecified()
}

/// First IPv4 address of a physical interface.
pub fn local_ipv4() -> ExecResult<Ipv4Addr> {
    let interfaces = NetworkInterface::show()?;
    for interface in interfaces {
        for addr in &interface.addr {
            if let IpAddr::V4(ipv4) = addr.ip() {
                if is_usable(&interface.name, &ipv4) {
                    debug!("[Net] using {} on {}", ipv4, interface.name);
                    return Ok(ipv4);
                }
            }
        }
    }
    Err(ExecutionError::NoLocalAddress)
}

/// A random port of [`EPHEMERAL_PORTS`] which could be bound for UDP on `ip`.
/// The port is released before returning, so another process may still grab
/// it in between.
pub fn free_udp_port(ip: IpAddr) -> ExecResult<u16> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_PORT_TRIES {
        let port = rng.gen_range(EPHEMERAL_PORTS);
        if UdpSocket::bind(SocketAddr::new(ip, port)).is_ok() {
            return Ok(port);
        }
        debug!("[Net] port {} is taken", port);
    }
    Err(ExecutionError::NoFreePort(MAX_PORT_TRIES))
}
