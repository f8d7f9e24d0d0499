//! Integration tests for CLI argument handling
//!
//! Tests the binary's flag validation and the library's config conversion.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_aqiproxy"))
        .args(args)
        .env_remove("AQI_CACHE_TTL")
        .env_remove("AQI_MAX_ENTRIES")
        .env_remove("AQI_FETCH_TIMEOUT")
        .output()
        .expect("Failed to execute aqiproxy")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aqiproxy"), "Help should mention aqiproxy");
    assert!(stdout.contains("--cache-ttl"), "Help should mention --cache-ttl");
    assert!(stdout.contains("--max-entries"), "Help should mention --max-entries");
}

#[test]
fn test_help_does_not_print_token() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("PLACEHOLDER_TOKEN"));
}

#[test]
fn test_zero_max_entries_prints_error_and_exits() {
    let output = run_cli(&["--max-entries", "0"]);
    assert!(!output.status.success(), "Expected zero capacity to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("max-entries") || stderr.contains("invalid"),
        "Should print error message about --max-entries: {}",
        stderr
    );
}

#[test]
fn test_invalid_host_prints_error_and_exits() {
    let output = run_cli(&["--host", "not-an-ip", "--port", "0"]);
    assert!(!output.status.success(), "Expected invalid host to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid host"),
        "Should print error message about host: {}",
        stderr
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use std::time::Duration;

    use aqiproxy::cli::{Cli, LogFormat, ProxyConfig};
    use clap::Parser;

    #[test]
    fn test_cli_log_format_pretty() {
        let cli = Cli::parse_from(["aqiproxy", "--log-format", "pretty"]);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_cli_no_cors_flag() {
        let cli = Cli::parse_from(["aqiproxy", "--no-cors"]);
        assert!(cli.no_cors);
    }

    #[test]
    fn test_config_from_cli_durations() {
        let cli = Cli::parse_from([
            "aqiproxy",
            "--host",
            "127.0.0.1",
            "--base-url",
            "http://localhost:9000",
            "--cache-ttl",
            "120",
            "--fetch-timeout",
            "5",
        ]);
        let config = ProxyConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_config_from_cli_ipv6_host() {
        let cli = Cli::parse_from([
            "aqiproxy",
            "--host",
            "::1",
            "--port",
            "7000",
            "--base-url",
            "https://api.waqi.info",
        ]);
        let config = ProxyConfig::from_cli(&cli).unwrap();
        assert_eq!(config.listen_addr.port(), 7000);
        assert!(config.listen_addr.is_ipv6());
    }
}
