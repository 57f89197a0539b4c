//! SSRF protection for URLs handed to the browser.
//!
//! Search results are untrusted input. A headless browser will happily load
//! `file://` paths, loopback services, or cloud metadata endpoints, so every
//! candidate is checked before navigation.

use std::collections::HashSet;
use std::net::IpAddr;

use crate::error::{SecurityError, SecurityResult};

const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "::1",
    "[::1]",
    "0.0.0.0",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

const BLOCKED_CIDRS: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "169.254.0.0/16", // Link-local / cloud metadata
    "127.0.0.0/8",    // Loopback
    "0.0.0.0/8",
    "::1/128",   // IPv6 loopback
    "fc00::/7",  // IPv6 private
    "fe80::/10", // IPv6 link-local
];

/// URL validator with scheme, host, and CIDR rules.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<ipnet::IpNet>,
    /// Hosts that bypass the host and CIDR checks
    allowed_hosts: HashSet<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    /// Create a new URL validator with default security rules.
    pub fn new() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: BLOCKED_HOSTS.iter().map(|h| h.to_string()).collect(),
            blocked_cidrs: BLOCKED_CIDRS.iter().filter_map(|c| c.parse().ok()).collect(),
            allowed_hosts: HashSet::new(),
        }
    }

    /// Add an allowed host (bypasses validation).
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(host.into());
        self
    }

    /// Block an additional host.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into());
        self
    }

    /// Validate a URL for safety.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        let parsed = url::Url::parse(url)?;

        if !self.allowed_schemes.contains(parsed.scheme()) {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let host = parsed.host_str().ok_or(SecurityError::NoHost)?;

        if self.allowed_hosts.contains(host) {
            return Ok(());
        }

        if self.blocked_hosts.contains(host) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }

        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            if self.blocked_cidrs.iter().any(|cidr| cidr.contains(&ip)) {
                return Err(SecurityError::BlockedCidr(ip.to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_https_allowed() {
        let validator = UrlValidator::new();
        assert!(validator.validate("https://www.gov.uk/holiday-entitlement-rights").is_ok());
        assert!(validator.validate("http://www.legislation.gov.au/").is_ok());
    }

    #[test]
    fn test_disallowed_schemes() {
        let validator = UrlValidator::new();
        assert!(matches!(
            validator.validate("file:///etc/passwd"),
            Err(SecurityError::DisallowedScheme(s)) if s == "file"
        ));
        assert!(matches!(
            validator.validate("chrome://settings"),
            Err(SecurityError::DisallowedScheme(_))
        ));
    }

    #[test]
    fn test_internal_hosts_blocked() {
        let validator = UrlValidator::new();
        assert!(matches!(
            validator.validate("http://localhost:8080/admin"),
            Err(SecurityError::BlockedHost(_))
        ));
        assert!(matches!(
            validator.validate("http://169.254.169.254/latest/meta-data"),
            Err(SecurityError::BlockedCidr(_))
        ));
        assert!(matches!(
            validator.validate("http://10.1.2.3/"),
            Err(SecurityError::BlockedCidr(_))
        ));
        assert!(matches!(
            validator.validate("http://[fe80::1]/"),
            Err(SecurityError::BlockedCidr(_))
        ));
    }

    #[test]
    fn test_allow_host_bypasses_rules() {
        let validator = UrlValidator::new().allow_host("localhost");
        assert!(validator.validate("http://localhost:3000/fixture").is_ok());
    }
}
