/// Markers that mean the target did not answer, in any ping dialect we know.
const TIMEOUT_MARKERS: [&str; 4] = [
    "request timed out",
    "host unreachable",
    "100% packet loss",
    "100.0% packet loss",
];

/// Largest round-trip time accepted from probe output.
pub const MAX_RTT_MS: u64 = u32::MAX as u64;

/// Classified result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success { rtt_ms: u64, ttl: Option<u32> },
    Timeout,
    Unparseable,
}

/// What a prober hands back: raw command output, or an already structured answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutput {
    Text(String),
    Reply { rtt_ms: u64, ttl: Option<u32> },
    NoReply,
}

impl From<ProbeOutput> for Outcome {
    fn from(output: ProbeOutput) -> Self {
        match output {
            ProbeOutput::Text(text) => parse_ping_output(&text),
            ProbeOutput::Reply { rtt_ms, ttl } => Outcome::Success { rtt_ms, ttl },
            ProbeOutput::NoReply => Outcome::Timeout,
        }
    }
}

/// Classify the textual output of one `ping` run.
pub fn parse_ping_output(output: &str) -> Outcome {
    let lower = output.to_ascii_lowercase();
    if TIMEOUT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Outcome::Timeout;
    }

    match parse_rtt(output) {
        Some(rtt_ms) => Outcome::Success {
            rtt_ms,
            ttl: parse_ttl(&lower),
        },
        None => Outcome::Unparseable,
    }
}

fn parse_rtt(output: &str) -> Option<u64> {
    // Windows summary: "Minimum = 11ms, Maximum = 11ms, Average = 11ms"
    if let Some(start) = output.find("Average = ") {
        let after = &output[start + "Average = ".len()..];
        if let Some(ms_pos) = after.find("ms") {
            return parse_millis(&after[..ms_pos]);
        }
    }

    // Unix summary: "rtt min/avg/max/mdev = 11.2/11.4/11.9/0.3 ms"
    if let Some(line) = output.lines().find(|line| line.contains("min/avg/max")) {
        if let Some(eq_pos) = line.find('=') {
            if let Some(avg) = line[eq_pos + 1..].trim().split('/').nth(1) {
                if let Some(rtt) = parse_millis(avg) {
                    return Some(rtt);
                }
            }
        }
    }

    // Single reply line: "time=11.2 ms" (Unix) or "time=11ms" (Windows)
    if let Some(line) = output.lines().find(|line| line.contains("time=")) {
        if let Some(start) = line.find("time=") {
            let time_part = &line[start + "time=".len()..];
            let end = time_part
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(time_part.len());
            return parse_millis(&time_part[..end]);
        }
    }

    if output.contains("time<1ms") {
        return Some(1);
    }

    None
}

fn parse_ttl(lower: &str) -> Option<u32> {
    let start = lower.find("ttl=")?;
    let digits: String = lower[start + "ttl=".len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Plain decimal milliseconds only: no sign, no exponent, nothing above [`MAX_RTT_MS`].
fn parse_millis(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = text.parse::<f64>().ok()?.round();
    if value <= MAX_RTT_MS as f64 {
        Some(value as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOWS_REPLY: &str = "\
Pinging 8.8.8.8 with 32 bytes of data:
Reply from 8.8.8.8: bytes=32 time=42ms TTL=117

Ping statistics for 8.8.8.8:
    Packets: Sent = 1, Received = 1, Lost = 0 (0% loss),
Approximate round trip times in milli-seconds:
    Minimum = 42ms, Maximum = 42ms, Average = 42ms
";

    const LINUX_REPLY: &str = "\
PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.6 ms

--- 1.1.1.1 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 11.612/11.612/11.612/0.000 ms
";

    #[test]
    fn windows_average_is_the_rtt() {
        assert_eq!(
            parse_ping_output(WINDOWS_REPLY),
            Outcome::Success {
                rtt_ms: 42,
                ttl: Some(117)
            }
        );
    }

    #[test]
    fn bare_average_line_without_ttl() {
        assert_eq!(
            parse_ping_output("Average = 42ms"),
            Outcome::Success {
                rtt_ms: 42,
                ttl: None
            }
        );
    }

    #[test]
    fn linux_summary_rounds_to_millis() {
        assert_eq!(
            parse_ping_output(LINUX_REPLY),
            Outcome::Success {
                rtt_ms: 12,
                ttl: Some(57)
            }
        );
    }

    #[test]
    fn single_reply_line_without_summary() {
        let line = "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.4 ms";
        assert_eq!(
            parse_ping_output(line),
            Outcome::Success {
                rtt_ms: 0,
                ttl: Some(64)
            }
        );
    }

    #[test]
    fn sub_millisecond_windows_reply() {
        let line = "Reply from 192.168.1.1: bytes=32 time<1ms TTL=64";
        assert_eq!(
            parse_ping_output(line),
            Outcome::Success {
                rtt_ms: 1,
                ttl: Some(64)
            }
        );
    }

    #[test]
    fn timeout_marker_wins_over_rtt_text() {
        let output = "Request timed out.\n    Minimum = 5ms, Maximum = 5ms, Average = 5ms";
        assert_eq!(parse_ping_output(output), Outcome::Timeout);

        let output = "Reply from 10.0.0.1: Destination host unreachable. time=3ms";
        assert_eq!(parse_ping_output(output), Outcome::Timeout);
    }

    #[test]
    fn linux_total_loss_is_a_timeout() {
        let output = "1 packets transmitted, 0 received, 100% packet loss, time 0ms";
        assert_eq!(parse_ping_output(output), Outcome::Timeout);
    }

    #[test]
    fn garbage_is_unparseable() {
        assert_eq!(parse_ping_output(""), Outcome::Unparseable);
        assert_eq!(
            parse_ping_output("ping: unknown host nowhere.invalid"),
            Outcome::Unparseable
        );
        assert_eq!(parse_ping_output("Average = -3ms"), Outcome::Unparseable);
        assert_eq!(parse_ping_output("time=ms"), Outcome::Unparseable);
    }

    #[test]
    fn absurd_rtt_figures_are_unparseable() {
        assert_eq!(parse_ping_output("Average = 1e30ms"), Outcome::Unparseable);
        assert_eq!(
            parse_ping_output("Average = 99999999999999999999999ms"),
            Outcome::Unparseable
        );
        assert_eq!(parse_ping_output("Average = 5000000000ms"), Outcome::Unparseable);
        assert_eq!(parse_ping_output("Average = .ms"), Outcome::Unparseable);
        assert_eq!(
            parse_ping_output("Average = 4294967295ms"),
            Outcome::Success {
                rtt_ms: MAX_RTT_MS,
                ttl: None
            }
        );
    }

    #[test]
    fn structured_output_converts_directly() {
        assert_eq!(
            Outcome::from(ProbeOutput::Reply {
                rtt_ms: 7,
                ttl: None
            }),
            Outcome::Success {
                rtt_ms: 7,
                ttl: None
            }
        );
        assert_eq!(Outcome::from(ProbeOutput::NoReply), Outcome::Timeout);
        assert_eq!(
            Outcome::from(ProbeOutput::Text("Average = 9ms".into())),
            Outcome::Success {
                rtt_ms: 9,
                ttl: None
            }
        );
    }
}
