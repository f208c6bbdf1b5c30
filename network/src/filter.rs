//! Packet acceptance filter.
//!
//! Decides, from the leading bytes of a freshly received frame, whether it
//! is worth a pool allocation and a handoff to the IP stack. False accepts
//! are cheap (the stack drops them later); this is not a security boundary.
//!
//! Frame layout inspected:
//! ```text
//! [dst:6][src:6][ethertype:2] [ver/ihl:1]..[frag:2]..[proto:1].. [sport:2][dport:2]
//! ```

use smoltcp::wire::{EthernetFrame, EthernetProtocol, IpProtocol, Ipv4Packet, UdpPacket};

use crate::hal::PortRegistry;

/// LLMNR (RFC 4795).
pub const LLMNR_PORT: u16 = 5355;
/// NetBIOS name service.
pub const NBNS_PORT: u16 = 137;
/// DNS.
pub const DNS_PORT: u16 = 53;

const IPV4_MIN_HEADER: usize = 20;
const UDP_HEADER: usize = 8;
/// Version 4, IHL 5..=15.
const VERSION_IHL_RANGE: core::ops::RangeInclusive<u8> = 0x45..=0x4F;

/// Acceptance filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Inspect IPv4 headers. When off every IPv4 frame is accepted.
    pub filter_ip: bool,
    /// Let LLMNR through by source or destination port.
    pub llmnr: bool,
    /// Let NBNS through by source or destination port.
    pub nbns: bool,
    /// Let DNS responses through by source port.
    pub dns: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_ip: true,
            llmnr: true,
            nbns: true,
            dns: true,
        }
    }
}

impl FilterConfig {
    /// Accept every ARP, IPv4 and IPv6 frame.
    pub const fn permissive() -> Self {
        Self {
            filter_ip: false,
            llmnr: false,
            nbns: false,
            dns: false,
        }
    }

    fn is_discovery(&self, src: u16, dst: u16) -> bool {
        (self.llmnr && (src == LLMNR_PORT || dst == LLMNR_PORT))
            || (self.nbns && (src == NBNS_PORT || dst == NBNS_PORT))
            || (self.dns && src == DNS_PORT)
    }
}

/// Whether a received frame should be handed to the IP stack.
///
/// `frame` starts at the destination MAC address.
pub fn may_accept<P: PortRegistry + ?Sized>(frame: &[u8], ports: &P, cfg: &FilterConfig) -> bool {
    let eth = match EthernetFrame::new_checked(frame) {
        Ok(eth) => eth,
        Err(_) => return false,
    };

    match eth.ethertype() {
        // Validated by the stack.
        EthernetProtocol::Arp | EthernetProtocol::Ipv6 => true,
        EthernetProtocol::Ipv4 => !cfg.filter_ip || accept_ipv4(eth.payload(), ports, cfg),
        _ => false,
    }
}

fn accept_ipv4<P: PortRegistry + ?Sized>(packet: &[u8], ports: &P, cfg: &FilterConfig) -> bool {
    if packet.len() < IPV4_MIN_HEADER {
        return false;
    }
    if !VERSION_IHL_RANGE.contains(&packet[0]) {
        return false;
    }

    let ip = Ipv4Packet::new_unchecked(packet);
    // Only outgoing traffic is ever fragmented.
    if ip.frag_offset() != 0 {
        return false;
    }

    if ip.next_header() != IpProtocol::Udp {
        return true;
    }

    let header_len = usize::from(ip.header_len());
    if packet.len() < header_len + UDP_HEADER {
        return false;
    }
    let udp = UdpPacket::new_unchecked(&packet[header_len..]);
    let (src, dst) = (udp.src_port(), udp.dst_port());

    ports.has_udp_listener(dst) || cfg.is_discovery(src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::frames;

    const NO_PORTS: [u16; 0] = [];

    #[test]
    fn test_arp_always_accepted() {
        let frame = frames::arp();
        assert!(may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
        // Payload contents are irrelevant.
        let mut junk = frames::arp();
        for b in junk[14..].iter_mut() {
            *b = 0xFF;
        }
        assert!(may_accept(&junk, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_ipv6_accepted() {
        let frame = frames::ethernet(0x86DD, &[0x60; 40]);
        assert!(may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_unknown_ethertype_rejected() {
        let frame = frames::ethernet(0x88CC, &[0; 46]);
        assert!(!may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_runt_rejected() {
        assert!(!may_accept(&[0u8; 10], &NO_PORTS, &FilterConfig::default()));
        let frame = frames::ethernet(0x0800, &[0x45; 12]);
        assert!(!may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_udp_to_unregistered_port_rejected() {
        let frame = frames::udp(40000, 9999);
        assert!(!may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_udp_to_registered_port_accepted() {
        let frame = frames::udp(40000, 9999);
        assert!(may_accept(&frame, &[9999u16], &FilterConfig::default()));
    }

    #[test]
    fn test_discovery_ports() {
        let cfg = FilterConfig::default();
        assert!(may_accept(&frames::udp(40000, LLMNR_PORT), &NO_PORTS, &cfg));
        assert!(may_accept(&frames::udp(LLMNR_PORT, 40000), &NO_PORTS, &cfg));
        assert!(may_accept(&frames::udp(NBNS_PORT, 40000), &NO_PORTS, &cfg));
        assert!(may_accept(&frames::udp(DNS_PORT, 40000), &NO_PORTS, &cfg));
        // DNS is only matched as a response.
        assert!(!may_accept(&frames::udp(40000, DNS_PORT), &NO_PORTS, &cfg));

        let cfg = FilterConfig {
            llmnr: false,
            ..FilterConfig::default()
        };
        assert!(!may_accept(&frames::udp(40000, LLMNR_PORT), &NO_PORTS, &cfg));
    }

    #[test]
    fn test_fragment_rejected() {
        let mut frame = frames::udp(40000, 9999);
        // Fragment offset 1 (8 bytes).
        frame[14 + 6] = 0x00;
        frame[14 + 7] = 0x01;
        assert!(!may_accept(&frame, &[9999u16], &FilterConfig::default()));
    }

    #[test]
    fn test_bad_version_ihl_rejected() {
        let mut frame = frames::udp(40000, 9999);
        frame[14] = 0x44;
        assert!(!may_accept(&frame, &[9999u16], &FilterConfig::default()));
        frame[14] = 0x65;
        assert!(!may_accept(&frame, &[9999u16], &FilterConfig::default()));
    }

    #[test]
    fn test_non_udp_ipv4_accepted() {
        let frame = frames::ipv4(6, &[0; 20]);
        assert!(may_accept(&frame, &NO_PORTS, &FilterConfig::default()));
    }

    #[test]
    fn test_permissive_skips_ip_checks() {
        let mut frame = frames::udp(40000, 9999);
        frame[14 + 7] = 0x01;
        assert!(may_accept(&frame, &NO_PORTS, &FilterConfig::permissive()));
    }
}
