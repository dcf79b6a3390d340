use ipguard_domain::{DomainError, MacAddr};
use std::ffi::{CStr, CString};
use std::io;
use std::net::Ipv4Addr;
use tracing::debug;

/// Local network interface as seen by the ARP resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInterface {
    pub name: String,
    pub index: u32,
    pub mac: MacAddr,
    pub ipv4: Option<Ipv4Addr>,
}

impl LinkInterface {
    /// Looks up `name` via `getifaddrs(3)`.
    ///
    /// The MAC comes from the interface's `AF_PACKET` entry and the address
    /// from its first `AF_INET` entry.
    pub fn by_name(name: &str) -> Result<Self, DomainError> {
        let c_name =
            CString::new(name).map_err(|_| DomainError::InterfaceNotFound(name.to_string()))?;
        let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if index == 0 {
            return Err(DomainError::InterfaceNotFound(name.to_string()));
        }

        let addrs = IfAddrs::new()
            .map_err(|e| DomainError::IoError(format!("getifaddrs failed: {}", e)))?;

        let mut mac = MacAddr::ZERO;
        let mut ipv4 = None;

        for entry in addrs.iter() {
            if entry.ifa_name.is_null() || entry.ifa_addr.is_null() {
                continue;
            }
            let entry_name = unsafe { CStr::from_ptr(entry.ifa_name) };
            if entry_name.to_bytes() != name.as_bytes() {
                continue;
            }

            let family = unsafe { (*entry.ifa_addr).sa_family } as libc::c_int;
            match family {
                libc::AF_PACKET => {
                    let ll = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_ll) };
                    if ll.sll_halen == 6 {
                        let mut octets = [0u8; 6];
                        octets.copy_from_slice(&ll.sll_addr[..6]);
                        mac = MacAddr::new(octets);
                    }
                }
                libc::AF_INET if ipv4.is_none() => {
                    let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
                    ipv4 = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
                }
                _ => {}
            }
        }

        debug!(interface = name, index, mac = %mac, ipv4 = ?ipv4, "Interface resolved");

        Ok(Self {
            name: name.to_string(),
            index,
            mac,
            ipv4,
        })
    }
}

/// Owned `getifaddrs` list, freed on drop.
struct IfAddrs {
    head: *mut libc::ifaddrs,
}

impl IfAddrs {
    fn new() -> io::Result<Self> {
        let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { head })
    }

    fn iter(&self) -> impl Iterator<Item = &libc::ifaddrs> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor.is_null() {
                return None;
            }
            let entry = unsafe { &*cursor };
            cursor = entry.ifa_next;
            Some(entry)
        })
    }
}

impl Drop for IfAddrs {
    fn drop(&mut self) {
        if !self.head.is_null() {
            unsafe { libc::freeifaddrs(self.head) };
        }
    }
}
