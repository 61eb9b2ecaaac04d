//! Submit command implementation.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{TimeZone, Utc};
use clap::{ArgGroup, Args};
use colored::Colorize;
use lookalike_core::{RecordKey, Signature};
use sha3::{Digest, Sha3_256};
use tracing::{debug, info};

use crate::client::{LookalikeClient, RetryConfig, SubmitOutcome, SubmitPayload};

#[derive(Args)]
#[command(group(ArgGroup::new("content").required(true).args(["file", "content_hash"])))]
#[command(group(ArgGroup::new("sig").required(true).args(["signature_file", "signature"])))]
pub struct SubmitArgs {
    /// Server base URL
    #[arg(long, env = "LOOKALIKE_URL", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    /// Image file; its content hash is the SHA3-256 of the bytes
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Precomputed content hash
    #[arg(long, value_name = "HEX")]
    pub content_hash: Option<String>,

    /// Structural hash (up to 16 hex digits)
    #[arg(long, value_name = "HEX")]
    pub structural_hash: String,

    /// Signature file: binary signature blob, or integers separated by commas or whitespace
    #[arg(long, value_name = "PATH")]
    pub signature_file: Option<PathBuf>,

    /// Signature components, comma-separated
    #[arg(long, value_name = "CSV")]
    pub signature: Option<String>,

    /// Group identifier
    #[arg(short, long)]
    pub group: String,

    /// User identifier
    #[arg(short, long)]
    pub user: String,

    /// Submission timestamp in seconds (default: now)
    #[arg(long)]
    pub timestamp: Option<i64>,

    /// Print the request instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the server response as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the submit command.
pub async fn execute(args: SubmitArgs, quiet: bool) -> Result<()> {
    let content_hash = match (&args.file, &args.content_hash) {
        (Some(path), _) => hash_file(path)?,
        (None, Some(hash)) => hash.clone(),
        (None, None) => bail!("Either --file or --content-hash is required"),
    };

    let structural_hash = parse_structural_hash(&args.structural_hash)?;

    let signature = match (&args.signature_file, &args.signature) {
        (Some(path), _) => load_signature(path)?,
        (None, Some(csv)) => parse_signature_text(csv)?,
        (None, None) => bail!("Either --signature-file or --signature is required"),
    };
    debug!(components = signature.len(), "Loaded signature");

    let payload = SubmitPayload {
        content_hash,
        structural_hash: format!("{:016x}", structural_hash),
        signature: BASE64.encode(signature.encode()),
        group_id: args.group,
        user_id: args.user,
        timestamp: args.timestamp.unwrap_or_else(|| Utc::now().timestamp()),
    };

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    info!(server = %args.server, group_id = %payload.group_id, "Submitting fingerprint");
    let client = LookalikeClient::new(&args.server, RetryConfig::default())?;
    let outcome = client.submit(&payload).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if quiet {
        println!("{}", outcome.status);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &SubmitOutcome) {
    let status = outcome.status.to_uppercase();
    let headline = match outcome.status.as_str() {
        "new" => status.green().bold(),
        "same" | "duplicate" => status.red().bold(),
        _ => status.yellow().bold(),
    };

    println!();
    println!("   {} {}", "Status:".dimmed(), headline);

    if let (Some(group), Some(user)) = (&outcome.group_id, &outcome.user_id) {
        println!("   {} {} in {}", "First seen by:".dimmed(), user, group);
    }
    if let Some(ts) = outcome.timestamp {
        println!("   {} {}", "First seen at:".dimmed(), format_timestamp(ts));
    }
    if let Some(distance) = outcome.hamming_distance {
        println!("   {} {} bits", "Structural distance:".dimmed(), distance);
    }
    if let Some(similarity) = outcome.similarity {
        println!("   {} {:.3}", "Signature similarity:".dimmed(), similarity);
    }
    if let Some(hash) = &outcome.structural_hash {
        println!("   {} {}", "Matched structural hash:".dimmed(), hash);
    }
    println!();
}

/// SHA3-256 of a file's bytes, hex-encoded.
pub fn hash_file(path: &Path) -> Result<String> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "Read file");
    Ok(hex::encode(Sha3_256::digest(&content)))
}

/// Parse a hex structural hash given on the command line.
pub fn parse_structural_hash(value: &str) -> Result<u64> {
    RecordKey::parse_structural_hex(value).map_err(|e| anyhow!("Invalid parameter: {e}"))
}

/// Parse integers separated by commas and/or whitespace.
pub fn parse_signature_text(text: &str) -> Result<Signature> {
    let values = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .with_context(|| format!("Invalid signature component '{part}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        bail!("Invalid signature: no components");
    }
    Ok(Signature::new(values))
}

/// Load a signature file, accepting either the binary wire format or text.
pub fn load_signature(path: &Path) -> Result<Signature> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read signature file: {}", path.display()))?;

    if let Ok(signature) = Signature::decode(&bytes) {
        debug!(format = "binary", "Parsed signature");
        return Ok(signature);
    }

    let text = std::str::from_utf8(&bytes)
        .context("Invalid signature: file is neither a signature blob nor text")?;
    debug!(format = "text", "Parsed signature");
    parse_signature_text(text)
}

/// Format a Unix timestamp (seconds) as a human-readable UTC string.
pub fn format_timestamp(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => format!("{}s", timestamp),
    }
}
