use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

pub const DEFAULT_DNS_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedAddress {
    ip_address: IpAddr,
    resolved_at: Instant,
}

/// Resolved addresses keyed by hostname, each valid for a fixed lifetime.
#[derive(Debug)]
pub struct DnsCache {
    entries: HashMap<String, CachedAddress>,
    ttl: Duration,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new(DEFAULT_DNS_TTL)
    }
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Address for `hostname` if it was resolved less than one lifetime ago.
    /// Expired entries are dropped on lookup.
    pub fn get(&mut self, hostname: &str) -> Option<IpAddr> {
        self.get_at(hostname, Instant::now())
    }

    pub fn insert(&mut self, hostname: &str, ip_address: IpAddr) {
        self.insert_at(hostname, ip_address, Instant::now());
    }

    fn get_at(&mut self, hostname: &str, now: Instant) -> Option<IpAddr> {
        let entry = self.entries.get(hostname)?;
        if now.saturating_duration_since(entry.resolved_at) > self.ttl {
            self.entries.remove(hostname);
            return None;
        }
        Some(entry.ip_address)
    }

    fn insert_at(&mut self, hostname: &str, ip_address: IpAddr, now: Instant) {
        self.entries.insert(
            hostname.to_string(),
            CachedAddress {
                ip_address,
                resolved_at: now,
            },
        );
    }
}
