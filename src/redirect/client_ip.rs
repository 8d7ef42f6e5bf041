//! Client IP extraction for visit tracking

use axum::http::HeaderMap;
use std::net::IpAddr;

pub const UNKNOWN_IP: &str = "unknown";

/// Address recorded for a visit.
///
/// Proxy headers are only consulted when `trust_proxy_headers` is set;
/// otherwise the socket peer is used. Falls back to `"unknown"`.
pub fn client_ip(headers: &HeaderMap, socket_ip: Option<IpAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = from_x_forwarded_for(headers).or_else(|| from_x_real_ip(headers)) {
            return ip.to_string();
        }
    }

    socket_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Leftmost parseable entry, i.e. the originating client.
fn from_x_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|s| s.trim().parse::<IpAddr>().ok())
}

fn from_x_real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")?
        .to_str()
        .ok()?
        .trim()
        .parse::<IpAddr>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn socket() -> Option<IpAddr> {
        Some("192.168.1.1".parse().unwrap())
    }

    fn forwarded_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        headers
    }

    #[test]
    fn test_socket_address_by_default() {
        assert_eq!(client_ip(&forwarded_headers(), socket(), false), "192.168.1.1");
    }

    #[test]
    fn test_forwarded_for_when_trusted() {
        assert_eq!(client_ip(&forwarded_headers(), socket(), true), "203.0.113.1");
    }

    #[test]
    fn test_real_ip_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 2001:db8::1 "));
        assert_eq!(client_ip(&headers, socket(), true), "2001:db8::1");
    }

    #[test]
    fn test_garbage_headers_fall_back_to_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers, socket(), true), "192.168.1.1");
    }

    #[test]
    fn test_unknown_without_socket() {
        assert_eq!(client_ip(&HeaderMap::new(), None, true), UNKNOWN_IP);
    }
}
