//! URL validation for SSRF protection.
//!
//! Search results and links scraped from supplier pages are untrusted;
//! every URL is checked before the fetcher touches it.

use ipnet::IpNet;
use std::collections::HashSet;
use std::net::IpAddr;
use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

/// Networks no datasheet or supplier page lives on.
const BLOCKED_NETWORKS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10", // carrier-grade NAT
    "127.0.0.0/8",
    "169.254.0.0/16", // link-local, cloud metadata
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::/128",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Hostnames of local and cloud metadata services.
const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

/// Suffixes of names that only resolve inside a private network.
const BLOCKED_SUFFIXES: &[&str] = &[".localhost", ".local", ".internal", ".lan"];

/// Checks URLs against scheme, host and network rules.
///
/// Only `http` and `https` are fetched. IP literals are matched against
/// the blocked networks (IPv4-mapped IPv6 included); hostnames against
/// the blocked names and suffixes, and after DNS resolution in
/// [`Self::validate_with_dns`].
#[derive(Debug, Clone)]
pub struct UrlValidator {
    blocked_hosts: HashSet<String>,
    blocked_networks: Vec<IpNet>,
    allowed_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    pub fn new() -> Self {
        Self {
            blocked_hosts: BLOCKED_HOSTS.iter().map(|h| h.to_string()).collect(),
            blocked_networks: BLOCKED_NETWORKS
                .iter()
                .filter_map(|n| n.parse().ok())
                .collect(),
            allowed_hosts: HashSet::new(),
        }
    }

    /// Trust a host unconditionally (e.g. a local test server).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    pub fn block_cidr(mut self, network: IpNet) -> Self {
        self.blocked_networks.push(network);
        self
    }

    /// Parse and check a URL without touching the network.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        self.check(&Url::parse(url)?)
    }

    /// Check a parsed URL without touching the network.
    pub fn check(&self, url: &Url) -> SecurityResult<()> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SecurityError::DisallowedScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(SecurityError::BlockedHost(
                "credentials embedded in URL".into(),
            ));
        }

        match url.host().ok_or(SecurityError::NoHost)? {
            Host::Ipv4(ip) => self.check_ip(IpAddr::V4(ip)),
            Host::Ipv6(ip) => self.check_ip(IpAddr::V6(ip)),
            Host::Domain(name) => self.check_name(name),
        }
    }

    /// Check a URL, then resolve its hostname and check every address.
    ///
    /// Catches public names that resolve into private networks.
    pub async fn validate_with_dns(&self, url: &str) -> SecurityResult<()> {
        let parsed = Url::parse(url)?;
        self.check(&parsed)?;

        let Some(Host::Domain(name)) = parsed.host() else {
            return Ok(());
        };
        if self.allowed_hosts.contains(&name.to_ascii_lowercase()) {
            return Ok(());
        }

        let port = parsed.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((name, port))
            .await
            .map_err(|e| SecurityError::DnsResolution(format!("{}: {}", name, e)))?;

        for addr in addrs {
            self.check_ip(addr.ip()).map_err(|_| {
                SecurityError::BlockedCidr(format!("{} resolves to {}", name, addr.ip()))
            })?;
        }
        Ok(())
    }

    fn check_name(&self, name: &str) -> SecurityResult<()> {
        let name = name.trim_end_matches('.').to_ascii_lowercase();
        if self.allowed_hosts.contains(&name) {
            return Ok(());
        }
        if self.blocked_hosts.contains(&name)
            || BLOCKED_SUFFIXES.iter().any(|s| name.ends_with(s))
        {
            return Err(SecurityError::BlockedHost(name));
        }
        Ok(())
    }

    fn check_ip(&self, ip: IpAddr) -> SecurityResult<()> {
        if self.allowed_hosts.contains(&ip.to_string()) {
            return Ok(());
        }

        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        if self.blocked_networks.iter().any(|n| n.contains(&ip)) {
            return Err(SecurityError::BlockedCidr(ip.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_loopback_and_private_literals() {
        let validator = UrlValidator::new();
        for url in [
            "http://127.0.0.1/ds.pdf",
            "http://[::1]/",
            "http://10.0.0.1/",
            "http://172.16.4.2/",
            "http://192.168.1.1/",
            "http://100.64.0.1/",
            "http://169.254.169.254/latest/meta-data/",
        ] {
            assert!(
                matches!(validator.validate(url), Err(SecurityError::BlockedCidr(_))),
                "{} should be blocked",
                url
            );
        }
    }

    #[test]
    fn test_blocks_ipv4_mapped_ipv6() {
        let validator = UrlValidator::new();
        assert!(validator.validate("http://[::ffff:10.0.0.1]/").is_err());
        assert!(validator.validate("http://[::ffff:203.0.113.7]/").is_ok());
    }

    #[test]
    fn test_blocks_internal_names() {
        let validator = UrlValidator::new();
        assert!(validator.validate("http://localhost:8080/").is_err());
        assert!(validator.validate("http://metadata.google.internal/").is_err());
        assert!(validator.validate("http://files.corp.internal/ds.pdf").is_err());
        assert!(validator.validate("http://printer.local/").is_err());
        assert!(validator.validate("http://LOCALHOST./").is_err());
    }

    #[test]
    fn test_rejects_schemes_and_credentials() {
        let validator = UrlValidator::new();
        assert!(matches!(
            validator.validate("file:///etc/passwd"),
            Err(SecurityError::DisallowedScheme(_))
        ));
        assert!(validator.validate("ftp://ti.com/lm7805.pdf").is_err());
        assert!(validator.validate("https://user:pw@ti.com/lm7805.pdf").is_err());
        assert!(matches!(
            validator.validate("not a url"),
            Err(SecurityError::UrlParse(_))
        ));
    }

    #[test]
    fn test_allows_supplier_urls() {
        let validator = UrlValidator::new();
        assert!(validator.validate("https://www.ti.com/lit/ds/symlink/lm7805.pdf").is_ok());
        assert!(validator.validate("http://203.0.113.10/a.pdf").is_ok());
    }

    #[test]
    fn test_allow_and_block_builders() {
        let validator = UrlValidator::new()
            .allow_host("localhost")
            .block_host("datasheets.example")
            .block_cidr("203.0.113.0/24".parse().unwrap());

        assert!(validator.validate("http://localhost/").is_ok());
        assert!(matches!(
            validator.validate("https://Datasheets.example/a.pdf"),
            Err(SecurityError::BlockedHost(_))
        ));
        assert!(validator.validate("http://203.0.113.10/a.pdf").is_err());
    }

    #[tokio::test]
    async fn test_validate_with_dns_checks_literals_without_lookup() {
        let validator = UrlValidator::new();
        assert!(validator.validate_with_dns("http://10.1.2.3/").await.is_err());
        assert!(validator.validate_with_dns("http://203.0.113.10/").await.is_ok());
    }
}
