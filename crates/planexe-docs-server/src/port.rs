//! Port allocation over a small fixed range.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::{TcpListener, TcpSocket};

use crate::server::ServeError;

/// A contiguous range of candidate ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First port tried
    pub start: u16,

    /// Number of ports in the range
    pub count: u16,
}

impl PortRange {
    pub fn new(start: u16, count: u16) -> Self {
        Self { start, count }
    }

    /// Last port in the range.
    pub fn last(&self) -> u16 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }

    /// Candidate ports in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = u16> {
        let start = self.start;
        (0..self.count).map_while(move |i| start.checked_add(i))
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 18525,
            count: 6,
        }
    }
}

/// Bind a listener on the first free port of `range`.
///
/// Ports already in use are skipped. Any other bind failure is returned
/// immediately. Sockets are created with `SO_REUSEADDR` so a port released by
/// a previous run can be taken again straight away.
pub fn bind_first_free(host: IpAddr, range: PortRange) -> Result<(TcpListener, u16), ServeError> {
    for port in range.ports() {
        let addr = SocketAddr::new(host, port);
        match bind_reusable(addr) {
            Ok(listener) => return Ok((listener, port)),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                tracing::debug!("Port {} is in use, trying next", port);
            }
            Err(source) => return Err(ServeError::Bind { addr, source }),
        }
    }

    Err(ServeError::AllPortsInUse {
        first: range.start,
        last: range.last(),
    })
}

fn bind_reusable(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}
