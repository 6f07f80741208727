//! Client identity extracted from request headers.

use serde::{Deserialize, Serialize};

/// Placeholder recorded when no forwarding header names the client.
pub const LOOPBACK_PLACEHOLDER: &str = "127.0.0.1";

/// Headers consulted for the client address, highest priority first.
pub const CLIENT_IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// IP address and user agent of the request that triggered a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn new(ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent,
        }
    }

    /// Builds request metadata from a header lookup.
    ///
    /// Header names are passed in lowercase.
    pub fn from_headers<'a, F>(header: F) -> Self
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        Self {
            ip_address: client_ip(&header),
            user_agent: header("user-agent")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

impl Default for RequestMeta {
    fn default() -> Self {
        Self::new(LOOPBACK_PLACEHOLDER, None)
    }
}

/// Resolves the client address: the first `x-forwarded-for` entry, then
/// `x-real-ip`, then `cf-connecting-ip`, then the loopback placeholder.
///
/// Blank values are skipped.
pub fn client_ip<'a, F>(header: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| {
            let value = header(name)?;
            let candidate = if *name == "x-forwarded-for" {
                value.split(',').next().unwrap_or_default()
            } else {
                value
            };
            Some(candidate.trim())
        })
        .find(|ip| !ip.is_empty())
        .unwrap_or(LOOPBACK_PLACEHOLDER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<&'static str> {
        let map: HashMap<&'static str, &'static str> = pairs.iter().copied().collect();
        move |name| map.get(name).copied()
    }

    #[test]
    fn test_forwarded_for_first_entry_trimmed() {
        let ip = client_ip(lookup(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1, 10.0.0.2"),
            ("x-real-ip", "10.0.0.9"),
        ]));
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_real_ip_before_cloudflare() {
        let ip = client_ip(lookup(&[
            ("x-real-ip", "198.51.100.4"),
            ("cf-connecting-ip", "192.0.2.1"),
        ]));
        assert_eq!(ip, "198.51.100.4");
    }

    #[test]
    fn test_cloudflare_header() {
        let ip = client_ip(lookup(&[("cf-connecting-ip", "192.0.2.1")]));
        assert_eq!(ip, "192.0.2.1");
    }

    #[test]
    fn test_fallback_placeholder() {
        assert_eq!(client_ip(lookup(&[])), LOOPBACK_PLACEHOLDER);
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let ip = client_ip(lookup(&[
            ("x-forwarded-for", "  "),
            ("x-real-ip", ""),
            ("cf-connecting-ip", "192.0.2.44"),
        ]));
        assert_eq!(ip, "192.0.2.44");
    }

    #[test]
    fn test_from_headers_user_agent() {
        let meta = RequestMeta::from_headers(lookup(&[
            ("x-real-ip", "198.51.100.4"),
            ("user-agent", "Mozilla/5.0"),
        ]));
        assert_eq!(meta.ip_address, "198.51.100.4");
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));

        let bare = RequestMeta::from_headers(lookup(&[]));
        assert_eq!(bare, RequestMeta::default());
    }
}
