// ── Host allowlist ──
//
// The SSRF boundary. Built once at startup from the webcam catalogue's
// source hosts plus configured extras, then only read.

use std::collections::HashSet;
use std::net::Ipv6Addr;

use url::Url;

use crate::error::GatewayError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    hosts: HashSet<String>,
}

impl Allowlist {
    /// Union of the baseline (catalogue) hosts and the extra hosts.
    pub fn new<B, E>(baseline: B, extra: E) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let hosts = baseline
            .into_iter()
            .map(|h| normalize(h.as_ref()))
            .chain(extra.into_iter().map(|h| normalize(h.as_ref())))
            .filter(|h| !h.is_empty())
            .collect();
        Self { hosts }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Exact, case-insensitive hostname match.
    pub fn contains_host(&self, host: &str) -> bool {
        self.hosts.contains(&normalize(host))
    }

    pub fn permits(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| self.contains_host(h))
    }

    /// Reject URLs whose host is not allowlisted.
    pub fn check(&self, url: &Url) -> Result<(), GatewayError> {
        if self.permits(url) {
            Ok(())
        } else {
            Err(GatewayError::ForbiddenHost {
                host: url.host_str().unwrap_or_default().to_owned(),
            })
        }
    }

    /// Sorted host list, for startup logging.
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.hosts.iter().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}

/// Lower-case the host. IPv6 literals lose their URL brackets and are
/// rendered in one canonical form, so `::1`, `[::1]` and `[0:0::1]` match.
fn normalize(host: &str) -> String {
    let host = host.trim();
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    match bare.parse::<Ipv6Addr>() {
        Ok(addr) => addr.to_string(),
        Err(_) => host.to_ascii_lowercase(),
    }
}
