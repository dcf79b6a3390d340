use clap::Parser;
use ipguard_domain::{CliOverrides, MacAddr};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

mod bootstrap;

/// Exit status for a detected conflict. Errors from `main` exit with 1.
const EXIT_CONFLICT: u8 = 2;

#[derive(Parser)]
#[command(name = "ipguard")]
#[command(version)]
#[command(about = "Check whether an IPv4 address is already claimed by another MAC on the local segment")]
#[command(after_help = "Exit status: 0 when the address is free, 2 on conflict, 1 on error.")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Interface to query on
    #[arg(short = 'i', long)]
    interface: Option<String>,

    /// Upper bound for the ARP query in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Caller deadline in milliseconds from now
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Candidate IPv4 address
    ip: Ipv4Addr,

    /// MAC address about to be bound to the candidate address
    mac: MacAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        interface: cli.interface.clone(),
        timeout_ms: cli.timeout_ms,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting ipguard v{}", env!("CARGO_PKG_VERSION"));

    let detector = ipguard_infrastructure::open_conflict_detector(
        &config.detector.interface,
        config.detector.timeout(),
    )
    .map_err(|e| {
        error!(error = %e, interface = %config.detector.interface, "Failed to open conflict detector");
        anyhow::anyhow!(e)
    })?;

    let deadline = cli
        .deadline_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let conflict = detector.would_conflict(deadline, cli.ip, cli.mac).await;
    println!("{}", if conflict { "conflict" } else { "free" });
    Ok(ExitCode::from(exit_status(conflict)))
}

fn exit_status(conflict: bool) -> u8 {
    if conflict {
        EXIT_CONFLICT
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query_arguments() {
        let cli = Cli::try_parse_from([
            "ipguard",
            "-i",
            "br0",
            "--deadline-ms",
            "200",
            "10.0.0.5",
            "AA-BB-CC-DD-EE-01",
        ])
        .unwrap();

        assert_eq!(cli.interface.as_deref(), Some("br0"));
        assert_eq!(cli.deadline_ms, Some(200));
        assert_eq!(cli.ip, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(cli.mac.to_string(), "aa:bb:cc:dd:ee:01");
    }

    #[test]
    fn test_conflict_exit_status_differs_from_error() {
        assert_eq!(exit_status(false), 0);
        assert_eq!(exit_status(true), 2);
        assert_ne!(exit_status(true), 1);
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let result = bootstrap::load_config(
            Some("/nonexistent/ipguard.toml"),
            CliOverrides::default(),
        );

        let message = result.unwrap_err().to_string();
        assert!(message.contains("/nonexistent/ipguard.toml"), "got: {message}");
    }

    #[test]
    fn test_rejects_malformed_mac() {
        let result = Cli::try_parse_from(["ipguard", "10.0.0.5", "not-a-mac"]);
        assert!(result.is_err());
    }
}
