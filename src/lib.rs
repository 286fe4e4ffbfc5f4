pub mod cli;
pub mod config;
pub mod control;
pub mod dns_cache;
pub mod event_log;
pub mod monitor;
pub mod ping;
pub mod ping_executor;
pub mod stats;
pub mod status;

pub use config::{Defaults, MonitorConfig, ProbeBackend};
pub use control::{ControlKey, ControlState, KeyListener, NoTerminal, StopFlag};
pub use event_log::{EventLog, FileEventLog, MemoryEventLog};
pub use monitor::{Monitor, MonitorState};
pub use ping::{Outcome, ProbeOutput, parse_ping_output};
pub use ping_executor::{IcmpPing, ProbeError, Prober, SystemPing};
pub use stats::{AggregateStats, Snapshot};
