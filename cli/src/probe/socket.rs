use bytes::BytesMut;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Connected UDP socket used for a single probe. Closed when dropped.
pub struct ProbeSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buffer_size: usize,
}

impl ProbeSocket {
    /// Used when the system does not report its receive buffer size.
    pub const FALLBACK_BUFFER_SIZE: usize = 65_535;

    pub fn bind(local: SocketAddr) -> IoResult<Self> {
        let socket = Socket::new(Domain::for_address(local), Type::DGRAM, Some(Protocol::UDP))?;
        socket.bind(&local.into())?;
        let buffer_size = match socket.recv_buffer_size() {
            Ok(size) if size > 0 => size,
            _ => Self::FALLBACK_BUFFER_SIZE,
        };
        let socket: UdpSocket = socket.into();
        let local_addr = socket.local_addr()?;
        Ok(ProbeSocket {
            socket,
            local_addr,
            buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves `host` and connects to the first address of the local
    /// address family.
    pub fn connect(&self, host: &str, port: u16) -> IoResult<SocketAddr> {
        let remote = (host, port)
            .to_socket_addrs()?
            .find(|addr| addr.is_ipv4() == self.local_addr.is_ipv4())
            .ok_or_else(|| {
                IoError::new(
                    ErrorKind::AddrNotAvailable,
                    format!("{} has no address reachable from {}", host, self.local_addr),
                )
            })?;
        self.socket.connect(remote)?;
        Ok(remote)
    }

    pub fn send(&self, datagram: &[u8]) -> IoResult<()> {
        self.socket.send(datagram).map(|_| ())
    }

    /// Waits up to `wait` for one datagram. `Ok(None)` on timeout.
    pub fn receive(&self, wait: Duration) -> IoResult<Option<BytesMut>> {
        self.socket.set_read_timeout(Some(wait))?;
        let mut buf = vec![0u8; self.buffer_size];
        match self.socket.recv(&mut buf) {
            Ok(len) => Ok(Some(BytesMut::from(&buf[..len]))),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn loopback() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
    }

    #[test]
    fn test_bind_reports_port_and_buffer() {
        let socket = ProbeSocket::bind(loopback()).expect("Should bind loopback");
        assert_ne!(socket.local_addr().port(), 0);
        assert!(socket.buffer_size > 0);
    }

    #[test]
    fn test_receive_times_out() {
        let peer = UdpSocket::bind(loopback()).unwrap();
        let socket = ProbeSocket::bind(loopback()).unwrap();
        socket
            .connect("127.0.0.1", peer.local_addr().unwrap().port())
            .expect("Should connect to loopback peer");
        socket.send(b"ping").unwrap();

        let received = socket
            .receive(Duration::from_millis(20))
            .expect("timeout is not an error");
        assert!(received.is_none());
    }

    #[test]
    fn test_receive_datagram() {
        let peer = UdpSocket::bind(loopback()).unwrap();
        let socket = ProbeSocket::bind(loopback()).unwrap();
        socket
            .connect("127.0.0.1", peer.local_addr().unwrap().port())
            .unwrap();
        socket.send(b"ping").unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"ping");
        peer.send_to(b"pong", from).unwrap();

        let received = socket.receive(Duration::from_secs(2)).unwrap();
        assert_eq!(received.as_deref(), Some(&b"pong"[..]));
    }
}
