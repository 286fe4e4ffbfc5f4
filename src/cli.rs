use std::path::PathBuf;

use clap::Parser;

/// Ping monitor with event logging and pause support
#[derive(Parser, Debug, Clone)]
#[command(name = "ping-watch")]
#[command(long_about = None)]
#[command(after_help = "While running, press P to pause or resume pinging. Ctrl+C stops and prints a summary.")]
pub struct Args {
    /// Target server to ping (default: 8.8.8.8)
    #[arg(long = "s", value_name = "HOST")]
    pub server: Option<String>,

    /// Delay between pings in seconds (default: 1)
    #[arg(long = "t", value_name = "SECONDS")]
    pub interval: Option<f64>,

    /// RTT logging threshold in ms (default: 100)
    #[arg(long = "limit", value_name = "MS")]
    pub limit: Option<u64>,

    /// Log file name (default: ping_log.txt)
    #[arg(long = "log", value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Exit after this many pings
    #[arg(long = "n", value_name = "COUNT", value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    /// Seconds to wait for a single ping before giving up
    #[arg(long = "timeout", value_name = "SECONDS", default_value = "5")]
    pub timeout: f64,

    /// Send echo requests directly instead of running the system ping command
    #[arg(long = "icmp")]
    pub icmp: bool,
}

/// Printed for any flag clap refuses.
pub const USAGE_HINT: &str = "Illegal or unrecognized flag. Use: ping-watch --help";

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Args::try_parse_from(["ping-watch", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_is_a_display_request() {
        let err = Args::try_parse_from(["ping-watch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(Args::try_parse_from(["ping-watch", "--n", "0"]).is_err());
    }

    #[test]
    fn no_flags_leaves_everything_to_defaults() {
        let args = Args::try_parse_from(["ping-watch"]).unwrap();
        assert!(args.server.is_none());
        assert!(args.interval.is_none());
        assert!(args.count.is_none());
        assert!(!args.icmp);
        assert_eq!(args.timeout, 5.0);
    }
}
