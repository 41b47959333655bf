//! Mesh address-space classification.

use ipnet::{Ipv4Net, Ipv6Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// CGNAT range used for IPv4 mesh addresses.
pub const MESH_V4: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::new(100, 64, 0, 0), 10);

/// ULA prefix used for IPv6 mesh addresses.
pub const MESH_V6: Ipv6Net =
    Ipv6Net::new_assert(Ipv6Addr::new(0xfd7a, 0x115c, 0xa1e0, 0, 0, 0, 0, 0), 48);

/// Whether `ip` belongs to the mesh address space.
///
/// IPv4-mapped IPv6 addresses are classified by their IPv4 form.
pub fn is_tailscale_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => MESH_V4.contains(&v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => MESH_V4.contains(&v4),
            None => MESH_V6.contains(&v6),
        },
    }
}

/// Whether `ip` is a loopback address (including IPv4-mapped loopback).
pub fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_cgnat_boundaries() {
        assert!(is_tailscale_ip(ip("100.64.0.1")));
        assert!(is_tailscale_ip(ip("100.64.0.0")));
        assert!(is_tailscale_ip(ip("100.127.255.255")));
        assert!(!is_tailscale_ip(ip("100.63.255.255")));
        assert!(!is_tailscale_ip(ip("100.128.0.0")));
    }

    #[test]
    fn test_ipv6_prefix() {
        assert!(is_tailscale_ip(ip("fd7a:115c:a1e0::1")));
        assert!(is_tailscale_ip(ip("fd7a:115c:a1e0:ab12:4843:cd96:6258:b240")));
        assert!(!is_tailscale_ip(ip("fd7a:115c:a1e1::1")));
        assert!(!is_tailscale_ip(ip("2001:db8::1")));
    }

    #[test]
    fn test_other_addresses() {
        assert!(!is_tailscale_ip(ip("192.168.1.1")));
        assert!(!is_tailscale_ip(ip("127.0.0.1")));
        assert!(!is_tailscale_ip(ip("10.0.0.1")));
        assert!(!is_tailscale_ip(ip("::1")));
    }

    #[test]
    fn test_ipv4_mapped() {
        assert!(is_tailscale_ip(ip("::ffff:100.64.0.1")));
        assert!(!is_tailscale_ip(ip("::ffff:192.168.1.1")));
        assert!(is_loopback(ip("::ffff:127.0.0.1")));
    }

    #[test]
    fn test_mesh_ranges() {
        assert_eq!(MESH_V4.to_string(), "100.64.0.0/10");
        assert_eq!(MESH_V6.to_string(), "fd7a:115c:a1e0::/48");
    }

    #[test]
    fn test_loopback() {
        assert!(is_loopback(ip("127.0.0.1")));
        assert!(is_loopback(ip("127.1.2.3")));
        assert!(is_loopback(ip("::1")));
        assert!(!is_loopback(ip("100.64.0.1")));
        assert!(!is_loopback(ip("192.168.1.1")));
    }
}
