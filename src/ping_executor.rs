use std::io;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, IcmpPacket, PingIdentifier, PingSequence, SurgeError};
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use crate::dns_cache::DnsCache;
use crate::ping::ProbeOutput;

/// Reasons a probe produced no output at all.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ping did not finish within {0:?}")]
    Timeout(Duration),
    #[error("could not run ping: {0}")]
    Spawn(#[source] io::Error),
    #[error("invalid target host {0:?}")]
    InvalidHost(String),
    #[error("could not resolve {0}")]
    Resolve(String),
    #[error("ICMP socket error: {0}")]
    Socket(String),
}

impl ProbeError {
    /// Event-log line for a failed attempt.
    pub fn log_message(&self) -> String {
        match self {
            ProbeError::Timeout(_) => "Ping command itself timed out".to_string(),
            other => format!("Error during ping: {other}"),
        }
    }
}

/// Sends one echo request to `host` and waits at most `timeout` for it.
pub trait Prober {
    fn probe(&mut self, host: &str, timeout: Duration) -> Result<ProbeOutput, ProbeError>;
}

impl<P: Prober + ?Sized> Prober for Box<P> {
    fn probe(&mut self, host: &str, timeout: Duration) -> Result<ProbeOutput, ProbeError> {
        (**self).probe(host, timeout)
    }
}

/// Keep only characters valid in a hostname (alphanumeric, dots, hyphens).
/// IP literals pass through untouched. Returns None if nothing usable is left.
fn sanitize_hostname(hostname: &str) -> Option<String> {
    if hostname.parse::<IpAddr>().is_ok() {
        return Some(hostname.to_string());
    }

    // Also handle case where user included port like "example.com:8080"
    let hostname = hostname.split(':').next().unwrap_or(hostname);

    let sanitized: String = hostname
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    // A leading dash would reach the ping command as an option
    if sanitized.is_empty() || sanitized.starts_with('-') {
        None
    } else {
        Some(sanitized)
    }
}

/// How long the echo itself may wait, leaving the outer deadline room to fire last.
fn reply_wait(timeout: Duration) -> Duration {
    timeout
        .saturating_sub(Duration::from_secs(1))
        .max(Duration::from_secs(1))
}

/// Round a measured round trip to the nearest millisecond.
fn round_millis(duration: Duration) -> u64 {
    (duration.as_secs_f64() * 1000.0).round() as u64
}

fn current_thread_runtime() -> io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Runs the platform `ping` command for a single echo request.
pub struct SystemPing {
    runtime: Runtime,
}

impl SystemPing {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            runtime: current_thread_runtime()?,
        })
    }

    fn command(host: &str, timeout: Duration) -> Command {
        let wait = reply_wait(timeout);
        let mut command = Command::new("ping");
        if cfg!(target_os = "windows") {
            let wait_ms = wait.as_millis().to_string();
            command.args(["-n", "1", "-w", wait_ms.as_str(), host]);
        } else {
            let wait_secs = wait.as_secs().to_string();
            let wait_flag = if cfg!(target_os = "macos") { "-t" } else { "-W" };
            command.args(["-c", "1", wait_flag, wait_secs.as_str(), host]);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Prober for SystemPing {
    fn probe(&mut self, host: &str, timeout: Duration) -> Result<ProbeOutput, ProbeError> {
        let host = sanitize_hostname(host).ok_or_else(|| ProbeError::InvalidHost(host.to_string()))?;
        let mut command = Self::command(&host, timeout);

        self.runtime.block_on(async move {
            match tokio::time::timeout(timeout, command.output()).await {
                Err(_) => Err(ProbeError::Timeout(timeout)),
                Ok(Err(e)) => Err(ProbeError::Spawn(e)),
                Ok(Ok(output)) => {
                    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                    text.push_str(&String::from_utf8_lossy(&output.stderr));
                    Ok(ProbeOutput::Text(text))
                }
            }
        })
    }
}

/// Sends echo requests from this process through an ICMP socket.
pub struct IcmpPing {
    runtime: Runtime,
    dns_cache: DnsCache,
    identifier: u16,
    sequence: u16,
}

impl IcmpPing {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            runtime: current_thread_runtime()?,
            dns_cache: DnsCache::default(),
            identifier: std::process::id() as u16,
            sequence: 0,
        })
    }

    async fn resolve_target(dns_cache: &mut DnsCache, target: &str) -> Result<IpAddr, ProbeError> {
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ip);
        }

        let sanitized = sanitize_hostname(target)
            .ok_or_else(|| ProbeError::InvalidHost(target.to_string()))?;
        if let Some(ip) = dns_cache.get(&sanitized) {
            return Ok(ip);
        }

        let ip = tokio::net::lookup_host(format!("{sanitized}:0"))
            .await
            .map_err(|e| ProbeError::Resolve(format!("{sanitized}: {e}")))?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| ProbeError::Resolve(sanitized.clone()))?;

        log::debug!("Resolved {sanitized} to {ip}");
        dns_cache.insert(&sanitized, ip);
        Ok(ip)
    }

    async fn echo(
        target_ip: IpAddr,
        identifier: u16,
        sequence: u16,
        wait: Duration,
    ) -> Result<ProbeOutput, ProbeError> {
        let config = match target_ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|e| ProbeError::Socket(e.to_string()))?;

        let mut pinger = client.pinger(target_ip, PingIdentifier(identifier)).await;
        pinger.timeout(wait);

        match pinger.ping(PingSequence(sequence), &[0; 8]).await {
            Ok((IcmpPacket::V4(packet), duration)) => Ok(ProbeOutput::Reply {
                rtt_ms: round_millis(duration),
                ttl: packet.get_ttl().map(u32::from),
            }),
            Ok((IcmpPacket::V6(_), duration)) => Ok(ProbeOutput::Reply {
                rtt_ms: round_millis(duration),
                ttl: None,
            }),
            Err(SurgeError::Timeout { .. }) => Ok(ProbeOutput::NoReply),
            Err(e) => Err(ProbeError::Socket(e.to_string())),
        }
    }
}

impl Prober for IcmpPing {
    fn probe(&mut self, host: &str, timeout: Duration) -> Result<ProbeOutput, ProbeError> {
        self.sequence = self.sequence.wrapping_add(1);
        let (identifier, sequence) = (self.identifier, self.sequence);
        let dns_cache = &mut self.dns_cache;

        self.runtime.block_on(async move {
            let attempt = async {
                let target_ip = Self::resolve_target(dns_cache, host).await?;
                Self::echo(target_ip, identifier, sequence, reply_wait(timeout)).await
            };
            tokio::time::timeout(timeout, attempt)
                .await
                .unwrap_or_else(|_| Err(ProbeError::Timeout(timeout)))
        })
    }
}
