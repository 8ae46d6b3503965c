//! Hash-prefix lookup CLI
//!
//! Checks URL lists against a Safe Browsing style full-hash lookup service
//! and offers offline views of canonicalization and hashing.

mod check;
mod input;
mod inspect;
mod lookup;
mod output;

use clap::{Parser, Subcommand};

use sb_core::coordinator::DEFAULT_BATCH_SIZE;
use sb_core::protocol::DEFAULT_SERVER_URL;

use check::{run_check, CheckOptions};
use inspect::{run_canonicalize, run_hashes, InspectOptions};

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(about = "Hash-prefix URL lookup and diagnostics")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a CSV of URLs and write match records as CSV
    Check {
        /// Lookup API key
        #[arg(long, env = "SB_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Lookup server base URL
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Input CSV (URL in the first column), `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output CSV, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,

        /// URLs per lookup request
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Log and skip batches whose lookup fails instead of aborting
        #[arg(long)]
        skip_failed_batches: bool,

        /// Treat the first input row as data
        #[arg(long)]
        no_header: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Extra attempts for 429/5xx and transport failures
        #[arg(long, default_value_t = 0)]
        retries: usize,
    },

    /// Print the canonical form of each input line
    Canonicalize {
        /// One URL per line, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Print the permutations and hashes each input line expands to
    Hashes {
        /// One URL per line, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Check {
            api_key,
            server,
            input,
            output,
            batch_size,
            skip_failed_batches,
            no_header,
            timeout_secs,
            retries,
        } => cmd_check(CheckOptions {
            input,
            output,
            api_key,
            server,
            batch_size,
            skip_failed_batches,
            has_header: !no_header,
            timeout_secs,
            retries,
        }),
        Commands::Canonicalize { input } => run_canonicalize(InspectOptions { input }),
        Commands::Hashes { input } => run_hashes(InspectOptions { input }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_check(opts: CheckOptions) -> Result<(), String> {
    let stats = run_check(opts)?;

    eprintln!("Checked {} URLs", stats.submitted);
    eprintln!("  Unresolved:  {}", stats.unresolved);
    eprintln!("  Prefixes:    {} in {} batches", stats.prefixes_sent, stats.batches_sent);
    if stats.batches_failed > 0 {
        eprintln!("  Failed:      {} batches skipped", stats.batches_failed);
    }
    eprintln!("  Matches:     {} ({} not from this run)", stats.matches, stats.unknown_matches);
    eprintln!("  Residuals:   {}", stats.residuals);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::try_parse_from(["sb-cli", "check", "--api-key", "k"]).unwrap();
        match cli.command {
            Commands::Check {
                server,
                input,
                output,
                batch_size,
                skip_failed_batches,
                no_header,
                retries,
                ..
            } => {
                assert_eq!(server, DEFAULT_SERVER_URL);
                assert_eq!(input, "-");
                assert_eq!(output, "-");
                assert_eq!(batch_size, 200);
                assert!(!skip_failed_batches);
                assert!(!no_header);
                assert_eq!(retries, 0);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["sb-cli", "hashes", "-v", "-i", "urls.txt"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Hashes { input } if input == "urls.txt"));
    }
}
