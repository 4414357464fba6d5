//! Client IP extraction from proxy headers

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Client IP from X-Forwarded-For, then X-Real-IP, then the socket address.
///
/// With `trusted_proxy_count` N the last N X-Forwarded-For entries are our own
/// proxies and the entry before them is the client. Returns "unknown" when
/// nothing valid is found.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| from_forwarded_for(v, trusted_proxy_count))
    {
        return ip;
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_valid_ip(v))
    {
        return real_ip.to_string();
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let candidate = if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        ips.last()?
    } else {
        ips.get(ips.len() - trusted_proxy_count - 1)?
    };

    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}
