use std::io;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;

use ping_watch::cli::{Args, USAGE_HINT};
use ping_watch::control::key_listener;
use ping_watch::{
    Defaults, EventLog, FileEventLog, IcmpPing, Monitor, MonitorConfig, ProbeBackend, Prober,
    StopFlag, SystemPing,
};

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            log::debug!("Argument error: {e}");
            eprintln!("{USAGE_HINT}");
            process::exit(1);
        }
    };

    let config = match MonitorConfig::from_args(&args, &Defaults::load()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(config.clone()) {
        let mut log = FileEventLog::new(&config.log_file);
        if let Err(log_err) = log.log_event(&format!("Unexpected error: {e:#}")) {
            log::warn!("Failed to write event log: {log_err}");
        }
        eprintln!("\nError: {e:#}");
        process::exit(1);
    }
}

fn run(config: MonitorConfig) -> Result<()> {
    let stop = StopFlag::new();
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.request_stop())
        .context("Error setting Ctrl-C handler")?;

    let prober: Box<dyn Prober> = match config.backend {
        ProbeBackend::System => {
            Box::new(SystemPing::new().context("Failed to start probe runtime")?)
        }
        ProbeBackend::Icmp => Box::new(IcmpPing::new().context("Failed to start probe runtime")?),
    };

    let log = FileEventLog::new(&config.log_file);
    log::info!(
        "Monitoring {} every {:?}, logging to {}",
        config.target,
        config.interval,
        log.path().display()
    );

    let mut monitor =
        Monitor::new(config, prober, log, key_listener(), io::stdout()).with_stop_flag(stop);
    monitor.run();
    Ok(())
}
