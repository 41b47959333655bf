//! Caller address extraction.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// First hop of `X-Forwarded-For`.
pub const FORWARDED_FOR: &str = "x-forwarded-for";
/// Single-address proxy header.
pub const REAL_IP: &str = "x-real-ip";

/// Resolve the caller's IP.
///
/// Prefers the first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// socket peer. Unparseable header values are skipped.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    let real = headers
        .get(REAL_IP)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    if real.is_some() {
        return real;
    }

    remote.map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn remote() -> Option<SocketAddr> {
        Some("10.0.0.9:52100".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_wins() {
        let h = headers(&[
            (FORWARDED_FOR, "100.64.0.2, 10.0.0.1"),
            (REAL_IP, "100.64.0.3"),
        ]);
        assert_eq!(client_ip(&h, remote()), Some("100.64.0.2".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_next() {
        let h = headers(&[(REAL_IP, " 100.64.0.3 ")]);
        assert_eq!(client_ip(&h, remote()), Some("100.64.0.3".parse().unwrap()));
    }

    #[test]
    fn test_socket_peer_last() {
        assert_eq!(
            client_ip(&HeaderMap::new(), remote()),
            Some("10.0.0.9".parse().unwrap())
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_garbage_headers_skipped() {
        let h = headers(&[(FORWARDED_FOR, "not-an-ip"), (REAL_IP, "also-bad")]);
        assert_eq!(client_ip(&h, remote()), Some("10.0.0.9".parse().unwrap()));
    }

    #[test]
    fn test_ipv6_forwarded() {
        let h = headers(&[(FORWARDED_FOR, "fd7a:115c:a1e0::1")]);
        assert_eq!(
            client_ip(&h, None),
            Some("fd7a:115c:a1e0::1".parse().unwrap())
        );
    }
}
