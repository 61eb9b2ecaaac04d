//! Lookalike CLI - submit image fingerprints and inspect detector parameters.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod exit_codes;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  65  Data error (malformed key, fingerprint rejected by the server)
  66  Input file could not be read
  69  Server unavailable (after retries)";

#[derive(Parser)]
#[command(name = "lookalike")]
#[command(author, version, about = "Group-scoped duplicate image detection", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Suppress decorated output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an image fingerprint to a running server
    Submit(commands::submit::SubmitArgs),

    /// Show banding parameters for a similarity threshold
    Params {
        /// Minimum signature similarity
        #[arg(short, long, default_value_t = 0.2)]
        threshold: f64,

        /// Signature length (number of permutations)
        #[arg(short = 'n', long, default_value_t = 128)]
        num_perm: usize,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode or decode record keys
    #[command(subcommand)]
    Key(KeyCommand),
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Decode a record key into its fields
    Decode {
        /// Encoded record key
        #[arg(value_name = "KEY")]
        key: String,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode fields into a record key
    Encode {
        /// Content hash
        #[arg(long)]
        content_hash: String,

        /// Structural hash (hex)
        #[arg(long)]
        structural_hash: String,

        /// Group identifier
        #[arg(long)]
        group: String,

        /// User identifier
        #[arg(long)]
        user: String,

        /// Timestamp (seconds since epoch)
        #[arg(long)]
        timestamp: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Submit(args) => commands::submit::execute(args, cli.quiet).await,
        Commands::Params {
            threshold,
            num_perm,
            json,
        } => commands::params::execute(threshold, num_perm, json),
        Commands::Key(KeyCommand::Decode { key, json }) => commands::key::decode(&key, json),
        Commands::Key(KeyCommand::Encode {
            content_hash,
            structural_hash,
            group,
            user,
            timestamp,
        }) => commands::key::encode(content_hash, &structural_hash, group, user, timestamp),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let exit = exit_codes::ExitCode::from_anyhow(&err);
            eprintln!("{} {}", "Error:".red().bold(), exit.message);
            ExitCode::from(exit.code)
        }
    }
}
