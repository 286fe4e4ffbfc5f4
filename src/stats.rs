use crate::ping::Outcome;

/// Running totals for the whole monitoring session.
#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    pub ping_count: u64,
    pub logged_count: u64,
    pub total_rtt: u64,
    pub valid_rtt_count: u64,
    pub total_ttl: u64,
    pub valid_ttl_count: u64,
    pub rtt_samples: Vec<u64>,
    pub min_rtt: Option<u64>,
    pub max_rtt: Option<u64>,
}

/// Derived, read-only view of [`AggregateStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub ping_count: u64,
    pub logged_count: u64,
    pub percent_logged: f64,
    pub mean_rtt: f64,
    pub median_rtt: f64,
    pub min_rtt: Option<u64>,
    pub max_rtt: Option<u64>,
    pub mean_ttl: f64,
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one probe outcome in. Returns the event-log message when the
    /// outcome is worth logging.
    pub fn record(&mut self, outcome: Outcome, rtt_threshold_ms: u64) -> Option<String> {
        self.ping_count += 1;

        match outcome {
            Outcome::Timeout => {
                self.logged_count += 1;
                Some("Ping timeout".to_string())
            }
            Outcome::Unparseable => {
                self.logged_count += 1;
                Some("Ping result could not be parsed".to_string())
            }
            Outcome::Success { rtt_ms, ttl } => {
                self.record_rtt(rtt_ms);
                if let Some(ttl) = ttl {
                    self.total_ttl = self.total_ttl.saturating_add(u64::from(ttl));
                    self.valid_ttl_count += 1;
                }

                if rtt_ms > rtt_threshold_ms {
                    self.logged_count += 1;
                    Some(format!("High RTT: {rtt_ms} ms"))
                } else {
                    None
                }
            }
        }
    }

    /// Count a probe attempt that never produced output. Always logged.
    pub fn record_failure(&mut self) {
        self.ping_count += 1;
        self.logged_count += 1;
    }

    fn record_rtt(&mut self, rtt_ms: u64) {
        self.total_rtt = self.total_rtt.saturating_add(rtt_ms);
        self.valid_rtt_count += 1;
        self.rtt_samples.push(rtt_ms);
        self.min_rtt = Some(self.min_rtt.map_or(rtt_ms, |min| min.min(rtt_ms)));
        self.max_rtt = Some(self.max_rtt.map_or(rtt_ms, |max| max.max(rtt_ms)));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ping_count: self.ping_count,
            logged_count: self.logged_count,
            percent_logged: ratio(self.logged_count, self.ping_count) * 100.0,
            mean_rtt: ratio(self.total_rtt, self.valid_rtt_count),
            median_rtt: median(&self.rtt_samples),
            min_rtt: self.min_rtt,
            max_rtt: self.max_rtt,
            mean_ttl: ratio(self.total_ttl, self.valid_ttl_count),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Median with the even-length case taken as the mean of the two middle values.
/// An empty sample set has median 0.
fn median(samples: &[u64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}
