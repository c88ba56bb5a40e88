//! Movement command integration test
//!
//! Sends each test coordinate to the flight-software core and waits for the
//! housekeeping telemetry that echoes it back.
//!
//! # Usage
//!
//! ```text
//! cargo run --bin movement_harness -- --host 127.0.0.1 --cmd-port 1234 --tlm-port 1235
//! ```
//!
//! # Options
//!
//! - `--host ADDR` - Flight-software address (default: 127.0.0.1)
//! - `--cmd-port PORT` - Command port (default: 1234)
//! - `--tlm-port PORT` - Local telemetry port (default: 1235)
//! - `--timeout SEC` - Telemetry wait per case (default: 5)
//! - `--settle SEC` - Pause after each command (default: 1)
//! - `--simulate` - Answer commands with the built-in simulator
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::ExitCode;
use std::time::Duration;

use cfs_movement::harness::{
    DEFAULT_COMMAND_PORT, DEFAULT_TELEMETRY_PORT, Harness, HarnessConfig, RunReport,
};
use cfs_movement::sim::{SimConfig, Simulator};

struct Options {
    host: IpAddr,
    cmd_port: u16,
    tlm_port: u16,
    timeout: Duration,
    settle: Duration,
    simulate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            cmd_port: DEFAULT_COMMAND_PORT,
            tlm_port: DEFAULT_TELEMETRY_PORT,
            timeout: Duration::from_secs(5),
            settle: Duration::from_secs(1),
            simulate: false,
        }
    }
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "--host" => {
                options.host = value("--host")?
                    .parse::<IpAddr>()
                    .map_err(|e| format!("invalid --host: {e}"))?;
            }
            "--cmd-port" => {
                options.cmd_port = value("--cmd-port")?
                    .parse::<u16>()
                    .map_err(|e| format!("invalid --cmd-port: {e}"))?;
            }
            "--tlm-port" => {
                options.tlm_port = value("--tlm-port")?
                    .parse::<u16>()
                    .map_err(|e| format!("invalid --tlm-port: {e}"))?;
            }
            "--timeout" => {
                options.timeout = parse_seconds("--timeout", &value("--timeout")?)?;
            }
            "--settle" => {
                options.settle = parse_seconds("--settle", &value("--settle")?)?;
            }
            "--simulate" => options.simulate = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(options)
}

fn parse_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    raw.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| format!("invalid {name}: {raw}"))
}

fn print_usage() {
    println!("Usage: movement_harness [OPTIONS]");
    println!();
    println!("  --host ADDR       Flight-software address (default: 127.0.0.1)");
    println!("  --cmd-port PORT   Command port (default: {DEFAULT_COMMAND_PORT})");
    println!("  --tlm-port PORT   Local telemetry port (default: {DEFAULT_TELEMETRY_PORT})");
    println!("  --timeout SEC     Telemetry wait per case (default: 5)");
    println!("  --settle SEC      Pause after each command (default: 1)");
    println!("  --simulate        Answer commands with the built-in simulator");
}

fn init_logger() {
    use tracing::metadata::LevelFilter;
    use tracing_subscriber::{
        EnvFilter, Layer, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let filter_directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::builder()
        .with_default_directive(Directive::from(LevelFilter::INFO))
        .parse_lossy(filter_directives);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(filter))
        .init();
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "=".repeat(60));
    println!("SAMPLE_APP MOVEMENT COMMAND TEST");
    println!("{}", "=".repeat(60));
    for case in report.cases() {
        let verdict = if case.passed() { "PASS" } else { "FAIL" };
        println!("[{verdict}] case {}: {}", case.case, case.position);
        if let Err(err) = &case.send {
            println!("       send: {err}");
        }
        match &case.telemetry {
            Ok(reception) => {
                let packet = &reception.packet;
                println!(
                    "       telemetry from {}: cmd={} err={} {}",
                    reception.source,
                    packet.command_counter(),
                    packet.error_counter(),
                    packet.position()
                );
            }
            Err(err) => println!("       telemetry: {err}"),
        }
    }
    println!("{}", "-".repeat(40));
    println!("{} passed, {} failed", report.passed(), report.failed());
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            return Ok(ExitCode::from(2));
        }
    };
    init_logger();

    let config = HarnessConfig {
        command_addr: SocketAddr::new(options.host, options.cmd_port),
        telemetry_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), options.tlm_port),
        settle_delay: options.settle,
        receive_timeout: options.timeout,
        ..HarnessConfig::default()
    };

    // The simulator must answer after the harness has bound its telemetry port.
    let _sim = if options.simulate {
        Some(Simulator::spawn(SimConfig {
            command_bind: config.command_addr,
            telemetry_destination: SocketAddr::new(options.host, options.tlm_port),
            reply_delay: config.settle_delay.saturating_add(Duration::from_millis(250)),
            ..SimConfig::default()
        })?)
    } else {
        None
    };

    let report = Harness::new(config)?.run();
    print_summary(&report);

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seconds_accepts_fractions() {
        assert_eq!(parse_seconds("--settle", "0.25"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_seconds("--timeout", "5"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_seconds("--settle", "0"), Ok(Duration::ZERO));
    }

    #[test]
    fn parse_seconds_rejects_out_of_range() {
        for raw in ["1e20", "-1", "inf", "NaN", "soon"] {
            assert_eq!(parse_seconds("--settle", raw), Err(format!("invalid --settle: {raw}")));
        }
    }
}
