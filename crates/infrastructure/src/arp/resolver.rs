use async_trait::async_trait;
use ipguard_application::ports::ArpResolver;
use ipguard_domain::{DomainError, MacAddr};
use socket2::{Domain, Protocol, Socket, Type};
use std::future::Future;
use std::io::{self, Read};
use std::net::Ipv4Addr;
use std::os::unix::io::AsRawFd;
use tokio::io::unix::AsyncFd;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::packet::{ArpOperation, ArpPacket, ETHERTYPE_ARP};
use crate::system::LinkInterface;

/// Large enough for any Ethernet frame the socket can deliver.
const RECV_BUF_LEN: usize = 1514;

/// ARP resolver over an `AF_PACKET` raw socket bound to one interface.
///
/// Sends a single broadcast request per `resolve` and waits for the matching
/// reply until the configured deadline. Requires `CAP_NET_RAW`. The socket is
/// closed when the resolver is dropped.
pub struct RawArpResolver {
    socket: AsyncFd<Socket>,
    interface: String,
    ifindex: u32,
    mac: MacAddr,
    ipv4: Ipv4Addr,
    deadline: Option<Instant>,
}

impl RawArpResolver {
    /// Must be called from within a tokio runtime.
    pub fn open(interface: &LinkInterface) -> Result<Self, DomainError> {
        let init_error = |reason: String| DomainError::ResolverInit {
            interface: interface.name.clone(),
            reason,
        };

        if interface.mac.is_zero() {
            return Err(init_error("interface has no link-layer address".to_string()));
        }
        let ipv4 = interface
            .ipv4
            .ok_or_else(|| init_error("interface has no IPv4 address".to_string()))?;

        let socket = open_packet_socket(interface.index).map_err(|e| init_error(e.to_string()))?;
        let socket = AsyncFd::new(socket).map_err(|e| init_error(e.to_string()))?;

        debug!(
            interface = %interface.name,
            ifindex = interface.index,
            mac = %interface.mac,
            ipv4 = %ipv4,
            "ARP socket opened"
        );

        Ok(Self {
            socket,
            interface: interface.name.clone(),
            ifindex: interface.index,
            mac: interface.mac,
            ipv4,
            deadline: None,
        })
    }

    async fn exchange(&self, ip: Ipv4Addr) -> Result<MacAddr, DomainError> {
        let stale = self.drain().map_err(|e| {
            DomainError::IoError(format!("Failed to drain ARP socket on {}: {}", self.interface, e))
        })?;
        if stale > 0 {
            trace!(stale, interface = %self.interface, "Discarded queued frames");
        }

        self.send_request(ip).await.map_err(|e| {
            DomainError::IoError(format!("Failed to send ARP request on {}: {}", self.interface, e))
        })?;
        trace!(ip = %ip, interface = %self.interface, "ARP request sent");

        let mut buf = vec![0u8; RECV_BUF_LEN];
        loop {
            let n = self.recv_frame(&mut buf).await.map_err(|e| {
                DomainError::IoError(format!(
                    "Failed to receive ARP frame on {}: {}",
                    self.interface, e
                ))
            })?;

            if let Some(mac) = reply_from(&buf[..n], ip) {
                return Ok(mac);
            }
        }
    }

    /// Discards every frame already queued on the socket without waiting.
    fn drain(&self) -> io::Result<usize> {
        let mut socket: &Socket = self.socket.get_ref();
        let mut buf = [0u8; RECV_BUF_LEN];
        let mut discarded = 0;
        loop {
            match socket.read(&mut buf) {
                Ok(_) => discarded += 1,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(discarded),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_request(&self, target: Ipv4Addr) -> io::Result<()> {
        let frame = ArpPacket::request(self.mac, self.ipv4, target).to_frame(MacAddr::BROADCAST);
        let dst = link_layer_addr(self.ifindex, MacAddr::BROADCAST);

        loop {
            let mut guard = self.socket.writable().await?;
            match guard.try_io(|inner| send_frame(inner.get_ref(), &frame, &dst)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv_frame(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.socket.readable().await?;
            match guard.try_io(|inner| {
                let mut socket: &Socket = inner.get_ref();
                socket.read(buf)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}

#[async_trait]
impl ArpResolver for RawArpResolver {
    fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    async fn resolve(&mut self, ip: Ipv4Addr) -> Result<MacAddr, DomainError> {
        match self.deadline {
            Some(deadline) => until_deadline(deadline, self.exchange(ip)).await,
            None => self.exchange(ip).await,
        }
    }
}

/// Runs `exchange` until `deadline`; expiry is reported as `NoAnswer`. A
/// deadline that has already passed never polls `exchange`.
async fn until_deadline<F>(deadline: Instant, exchange: F) -> Result<MacAddr, DomainError>
where
    F: Future<Output = Result<MacAddr, DomainError>>,
{
    if Instant::now() >= deadline {
        return Err(DomainError::NoAnswer);
    }

    match tokio::time::timeout_at(deadline, exchange).await {
        Ok(result) => result,
        Err(_elapsed) => Err(DomainError::NoAnswer),
    }
}

/// Sender MAC of `frame` when it is an ARP reply from `ip`.
fn reply_from(frame: &[u8], ip: Ipv4Addr) -> Option<MacAddr> {
    match ArpPacket::parse_frame(frame) {
        Ok(packet) if packet.operation == ArpOperation::Reply && packet.sender_ip == ip => {
            Some(packet.sender_mac)
        }
        Ok(_) => None,
        Err(e) => {
            trace!(error = %e, "Skipping frame");
            None
        }
    }
}

fn open_packet_socket(ifindex: u32) -> io::Result<Socket> {
    let protocol = Protocol::from(ETHERTYPE_ARP.to_be() as libc::c_int);
    let socket = Socket::new(Domain::PACKET, Type::RAW, Some(protocol))?;

    let addr = link_layer_addr(ifindex, MacAddr::ZERO);
    let rc = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    socket.set_nonblocking(true)?;
    Ok(socket)
}

fn send_frame(socket: &Socket, frame: &[u8], dst: &libc::sockaddr_ll) -> io::Result<()> {
    let n = unsafe {
        libc::sendto(
            socket.as_raw_fd(),
            frame.as_ptr() as *const libc::c_void,
            frame.len(),
            libc::MSG_DONTWAIT,
            dst as *const libc::sockaddr_ll as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn link_layer_addr(ifindex: u32, dst: MacAddr) -> libc::sockaddr_ll {
    let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
    addr.sll_family = libc::AF_PACKET as libc::c_ushort;
    addr.sll_protocol = ETHERTYPE_ARP.to_be();
    addr.sll_ifindex = ifindex as libc::c_int;
    addr.sll_halen = 6;
    addr.sll_addr[..6].copy_from_slice(&dst.octets());
    addr
}
