mod summary;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use wpt_core::http::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The normalized result as JSON, with `runs` as an array.
    Json,
    /// A short human-readable table of runs.
    Summary,
}

/// Fetch a WebPageTest result and print it with runs in order.
#[derive(Debug, Parser)]
#[command(name = "wpt-fetch", version, about)]
struct Cli {
    /// Test key as returned when the test was submitted.
    test_key: String,

    /// Base URL of the WebPageTest server.
    #[arg(long, env = "WPT_SERVER", default_value = "https://www.webpagetest.org")]
    server: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Print JSON on a single line.
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the result; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = HttpClient::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let result = match wpt_core::fetch_and_normalize_with(&client, &cli.server, &cli.test_key)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            let phase = e.phase();
            return Err(anyhow::Error::new(e)
                .context(format!("{phase} failed for test {}", cli.test_key)));
        }
    };

    if !result.is_complete() {
        tracing::warn!(
            status_code = result.status_code,
            status_text = %result.status_text,
            "test is not complete"
        );
    }

    let output = match cli.format {
        OutputFormat::Json if cli.compact => serde_json::to_string(&result)?,
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Summary => summary::render(&result),
    };
    println!("{output}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["wpt-fetch", "150310_7Q_1B4"]).unwrap();
        assert_eq!(cli.test_key, "150310_7Q_1B4");
        assert_eq!(cli.timeout_secs, 30);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.compact);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parses_all_options() {
        let cli = Cli::try_parse_from([
            "wpt-fetch",
            "--server",
            "http://wpt.internal",
            "--timeout-secs",
            "5",
            "--format",
            "summary",
            "-vv",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://wpt.internal");
        assert_eq!(cli.timeout_secs, 5);
        assert_eq!(cli.format, OutputFormat::Summary);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.test_key, "abc");
    }

    #[test]
    fn test_key_is_required() {
        assert!(Cli::try_parse_from(["wpt-fetch"]).is_err());
    }
}
