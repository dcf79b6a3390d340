//! Ethernet II framed ARP for IPv4 over Ethernet (RFC 826).

use ipguard_domain::{DomainError, MacAddr};
use std::net::Ipv4Addr;

pub const ETHERTYPE_ARP: u16 = 0x0806;
const ETHERTYPE_IPV4: u16 = 0x0800;
const HTYPE_ETHERNET: u16 = 1;

const ETH_HEADER_LEN: usize = 14;
const ARP_PAYLOAD_LEN: usize = 28;

/// Ethernet header plus ARP payload, without trailer padding.
pub const ARP_FRAME_LEN: usize = ETH_HEADER_LEN + ARP_PAYLOAD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Other(u16),
}

impl From<u16> for ArpOperation {
    fn from(code: u16) -> Self {
        match code {
            1 => ArpOperation::Request,
            2 => ArpOperation::Reply,
            other => ArpOperation::Other(other),
        }
    }
}

impl From<ArpOperation> for u16 {
    fn from(op: ArpOperation) -> Self {
        match op {
            ArpOperation::Request => 1,
            ArpOperation::Reply => 2,
            ArpOperation::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    pub operation: ArpOperation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// "Who has `target_ip`? Tell `sender_ip`."
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            operation: ArpOperation::Request,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::ZERO,
            target_ip,
        }
    }

    /// Encodes the packet inside an Ethernet II frame addressed to `dst`.
    pub fn to_frame(&self, dst: MacAddr) -> [u8; ARP_FRAME_LEN] {
        let mut frame = [0u8; ARP_FRAME_LEN];

        frame[0..6].copy_from_slice(&dst.octets());
        frame[6..12].copy_from_slice(&self.sender_mac.octets());
        frame[12..14].copy_from_slice(&ETHERTYPE_ARP.to_be_bytes());

        let arp = &mut frame[ETH_HEADER_LEN..];
        arp[0..2].copy_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        arp[2..4].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        arp[4] = 6;
        arp[5] = 4;
        arp[6..8].copy_from_slice(&u16::from(self.operation).to_be_bytes());
        arp[8..14].copy_from_slice(&self.sender_mac.octets());
        arp[14..18].copy_from_slice(&self.sender_ip.octets());
        arp[18..24].copy_from_slice(&self.target_mac.octets());
        arp[24..28].copy_from_slice(&self.target_ip.octets());

        frame
    }

    /// Decodes an Ethernet II frame carrying Ethernet/IPv4 ARP.
    ///
    /// Trailing bytes (Ethernet minimum-size padding) are ignored.
    pub fn parse_frame(frame: &[u8]) -> Result<Self, DomainError> {
        if frame.len() < ARP_FRAME_LEN {
            return Err(DomainError::MalformedArpReply(format!(
                "frame too short: {} bytes",
                frame.len()
            )));
        }

        let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
        if ethertype != ETHERTYPE_ARP {
            return Err(DomainError::MalformedArpReply(format!(
                "unexpected ethertype 0x{:04x}",
                ethertype
            )));
        }

        let arp = &frame[ETH_HEADER_LEN..];
        let htype = u16::from_be_bytes([arp[0], arp[1]]);
        let ptype = u16::from_be_bytes([arp[2], arp[3]]);
        if htype != HTYPE_ETHERNET || ptype != ETHERTYPE_IPV4 || arp[4] != 6 || arp[5] != 4 {
            return Err(DomainError::MalformedArpReply(format!(
                "unsupported ARP format htype={} ptype=0x{:04x} hlen={} plen={}",
                htype, ptype, arp[4], arp[5]
            )));
        }

        Ok(Self {
            operation: ArpOperation::from(u16::from_be_bytes([arp[6], arp[7]])),
            sender_mac: mac_at(arp, 8),
            sender_ip: ipv4_at(arp, 14),
            target_mac: mac_at(arp, 18),
            target_ip: ipv4_at(arp, 24),
        })
    }
}

fn mac_at(buf: &[u8], offset: usize) -> MacAddr {
    let mut octets = [0u8; 6];
    octets.copy_from_slice(&buf[offset..offset + 6]);
    MacAddr::new(octets)
}

fn ipv4_at(buf: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3])
}
