use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::control::{ControlKey, ControlState, KeyListener, StopFlag};
use crate::event_log::EventLog;
use crate::ping::Outcome;
use crate::ping_executor::Prober;
use crate::stats::AggregateStats;
use crate::status::{draw_status, final_summary, status_line, stopped_log_line};

/// Length of one idle slice between control polls.
pub const POLL_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Paused,
    Stopped,
}

/// The probing loop. Owns the statistics and drives every collaborator from
/// a single thread; the only cross-thread input is the [`StopFlag`].
pub struct Monitor<P, L, K, W> {
    config: MonitorConfig,
    prober: P,
    log: L,
    keys: K,
    out: W,
    stats: AggregateStats,
    control: ControlState,
    stop: StopFlag,
    poll_slice: Duration,
}

impl<P, L, K, W> Monitor<P, L, K, W>
where
    P: Prober,
    L: EventLog,
    K: KeyListener,
    W: Write,
{
    pub fn new(config: MonitorConfig, prober: P, log: L, keys: K, out: W) -> Self {
        Self {
            config,
            prober,
            log,
            keys,
            out,
            stats: AggregateStats::new(),
            control: ControlState::default(),
            stop: StopFlag::new(),
            poll_slice: POLL_SLICE,
        }
    }

    /// Share an externally owned stop flag, e.g. one set by a signal handler.
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_poll_slice(mut self, poll_slice: Duration) -> Self {
        self.poll_slice = poll_slice;
        self
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn event_log(&self) -> &L {
        &self.log
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn state(&self) -> MonitorState {
        if !self.control.running {
            MonitorState::Stopped
        } else if self.control.paused {
            MonitorState::Paused
        } else {
            MonitorState::Running
        }
    }

    /// Log the start line, then cycle until stopped.
    pub fn run(&mut self) {
        self.log_event(&format!("Starting ping monitor for {}...", self.config.target));
        while self.step() != MonitorState::Stopped {}
    }

    /// Run one cycle: poll keys, then either idle while paused or probe once
    /// and wait out the interval.
    pub fn step(&mut self) -> MonitorState {
        if !self.control.running {
            return MonitorState::Stopped;
        }

        self.poll_control();
        if self.stop.is_requested() {
            self.finalize();
            return MonitorState::Stopped;
        }

        if self.control.paused {
            self.redraw();
            thread::sleep(self.poll_slice);
            return MonitorState::Paused;
        }

        self.probe_once();
        self.redraw();

        if let Some(max) = self.config.max_pings {
            if self.stats.ping_count >= max {
                self.finalize();
                return MonitorState::Stopped;
            }
        }

        self.idle();
        self.state()
    }

    /// Log and print the final summary. Only the first call has any effect.
    pub fn finalize(&mut self) {
        if !self.control.stop() {
            return;
        }

        let snapshot = self.stats.snapshot();
        log::info!(
            "Stopping after {} pings, {} logged",
            snapshot.ping_count,
            snapshot.logged_count
        );
        self.print("\r\nStopping ping monitor...\r\n");
        self.log_event(&stopped_log_line(&snapshot));
        self.print(&format!("{}\r\n", final_summary(&snapshot)));
    }

    fn poll_control(&mut self) {
        match self.keys.poll() {
            Some(ControlKey::TogglePause) => {
                let paused = self.control.toggle_pause();
                self.log_event(if paused {
                    "Ping monitor paused"
                } else {
                    "Ping monitor resumed"
                });
                self.redraw();
            }
            Some(ControlKey::Interrupt) => self.stop.request_stop(),
            None => {}
        }
    }

    fn probe_once(&mut self) {
        match self.prober.probe(&self.config.target, self.config.probe_timeout) {
            Ok(output) => {
                let outcome = Outcome::from(output);
                if let Some(message) = self.stats.record(outcome, self.config.rtt_threshold_ms) {
                    self.log_event(&message);
                }
            }
            Err(e) => {
                log::debug!("Probe of {} failed: {e}", self.config.target);
                self.stats.record_failure();
                self.log_event(&e.log_message());
            }
        }
    }

    /// Wait out the interval in short slices, leaving early on pause or stop.
    fn idle(&mut self) {
        for _ in 0..self.config.idle_slices() {
            thread::sleep(self.poll_slice);
            self.poll_control();
            if self.control.paused || self.stop.is_requested() {
                break;
            }
        }
    }

    fn redraw(&mut self) {
        let line = status_line(&self.stats.snapshot(), self.control.paused, &self.config);
        if let Err(e) = draw_status(&mut self.out, &line, self.control.paused) {
            log::debug!("Status redraw failed: {e}");
        }
    }

    fn print(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            log::debug!("Console write failed: {e}");
        }
    }

    fn log_event(&mut self, message: &str) {
        if let Err(e) = self.log.log_event(message) {
            log::warn!("Failed to write event log: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::NoTerminal;
    use crate::event_log::MemoryEventLog;
    use crate::ping::ProbeOutput;
    use crate::ping_executor::ProbeError;
    use std::collections::VecDeque;

    struct Replies(VecDeque<Result<ProbeOutput, ProbeError>>);

    impl Prober for Replies {
        fn probe(&mut self, _host: &str, _timeout: Duration) -> Result<ProbeOutput, ProbeError> {
            self.0
                .pop_front()
                .unwrap_or(Ok(ProbeOutput::Text("Average = 10ms".into())))
        }
    }

    fn monitor(
        replies: Vec<Result<ProbeOutput, ProbeError>>,
        max_pings: Option<u64>,
    ) -> Monitor<Replies, MemoryEventLog, NoTerminal, Vec<u8>> {
        let mut config = MonitorConfig::new("192.0.2.1");
        config.max_pings = max_pings;
        config.interval = Duration::from_millis(50);
        Monitor::new(
            config,
            Replies(replies.into()),
            MemoryEventLog::default(),
            NoTerminal,
            Vec::new(),
        )
        .with_poll_slice(Duration::ZERO)
    }

    fn logged_messages(log: &MemoryEventLog) -> Vec<String> {
        log.lines
            .iter()
            .map(|line| line.split_once("] ").map_or(line.clone(), |(_, msg)| msg.to_string()))
            .collect()
    }

    #[test]
    fn probe_failures_are_logged_and_survived() {
        let mut monitor = monitor(
            vec![
                Err(ProbeError::Timeout(Duration::from_secs(5))),
                Err(ProbeError::Spawn(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "ping not found",
                ))),
                Ok(ProbeOutput::Text("Request timed out.".into())),
                Ok(ProbeOutput::Text("garbage".into())),
                Ok(ProbeOutput::Text("Reply from x: time=250ms TTL=50".into())),
            ],
            Some(5),
        );
        monitor.run();

        assert_eq!(monitor.stats().ping_count, 5);
        assert_eq!(monitor.stats().logged_count, 5);
        assert_eq!(
            &logged_messages(monitor.event_log())[..6],
            [
                "Starting ping monitor for 192.0.2.1...",
                "Ping command itself timed out",
                "Error during ping: could not run ping: ping not found",
                "Ping timeout",
                "Ping result could not be parsed",
                "High RTT: 250 ms",
            ]
        );
    }

    #[test]
    fn stop_request_finalizes_on_next_step() {
        let mut monitor = monitor(vec![], None);
        assert_eq!(monitor.step(), MonitorState::Running);
        monitor.stop_flag().request_stop();
        assert_eq!(monitor.step(), MonitorState::Stopped);
        assert_eq!(monitor.step(), MonitorState::Stopped);

        assert_eq!(monitor.stats().ping_count, 1);
        let messages = logged_messages(monitor.event_log());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Monitor stopped. Total pings: 1"));
    }

    #[test]
    fn finalize_prints_summary_once() {
        let mut monitor = monitor(vec![], Some(1));
        monitor.run();
        monitor.finalize();

        let printed = String::from_utf8(monitor.output().clone()).unwrap();
        assert_eq!(printed.matches("Stopping ping monitor...").count(), 1);
        assert_eq!(printed.matches("Final summary -> Pings: 1,").count(), 1);
        assert!(!monitor.control().running);
    }
}
