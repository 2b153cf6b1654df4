//! Link, network and transport decapsulation.
//!
//! Walks a captured Ethernet frame down to the UDP payload. Anything that is
//! not a plain UDP datagram over IPv4 or IPv6 is rejected by returning `None`;
//! the capture filter already narrows traffic to port 53, so no port check is
//! repeated here.

const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;
const IPPROTO_UDP: u8 = 17;
const UDP_HEADER_LEN: usize = 8;

/// Strips the Ethernet, IP and UDP headers, returning the UDP payload.
///
/// The payload is clipped to the UDP length field so trailing link-layer
/// padding never reaches the DNS decoder.
pub fn udp_payload(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return None;
    }

    let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
    let ip = &frame[ETHERNET_HEADER_LEN..];

    let ip_header_len = match ethertype {
        ETHERTYPE_IPV4 => ipv4_header_len(ip)?,
        ETHERTYPE_IPV6 => ipv6_header_len(ip)?,
        _ => return None,
    };

    let udp = ip.get(ip_header_len..)?;
    if udp.len() < UDP_HEADER_LEN {
        return None;
    }

    let udp_len = usize::from(u16::from_be_bytes([udp[4], udp[5]]));
    if udp_len < UDP_HEADER_LEN {
        return None;
    }

    let payload = udp.get(UDP_HEADER_LEN..)?;
    Some(&payload[..payload.len().min(udp_len - UDP_HEADER_LEN)])
}

fn ipv4_header_len(ip: &[u8]) -> Option<usize> {
    if ip.len() < IPV4_MIN_HEADER_LEN || ip[9] != IPPROTO_UDP {
        return None;
    }
    let ihl = usize::from(ip[0] & 0x0F) * 4;
    if ihl < IPV4_MIN_HEADER_LEN {
        return None;
    }
    Some(ihl)
}

fn ipv6_header_len(ip: &[u8]) -> Option<usize> {
    // Extension headers are not walked; a datagram whose next header is not
    // UDP is rejected outright.
    if ip.len() < IPV6_HEADER_LEN || ip[6] != IPPROTO_UDP {
        return None;
    }
    Some(IPV6_HEADER_LEN)
}
