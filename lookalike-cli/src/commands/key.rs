//! Key command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lookalike_core::{KeyCodec, RecordKey};

use crate::commands::submit::{format_timestamp, parse_structural_hash};

/// Decode a record key and print its fields.
pub fn decode(encoded: &str, json: bool) -> Result<()> {
    let key = KeyCodec::decode(encoded)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&key)?);
        return Ok(());
    }

    println!("   {} {}", "Content hash:".dimmed(), key.content_hash);
    println!("   {} {}", "Structural hash:".dimmed(), key.structural_hex());
    println!("   {} {}", "Group:".dimmed(), key.group_id);
    println!("   {} {}", "User:".dimmed(), key.user_id);
    println!(
        "   {} {} ({})",
        "Timestamp:".dimmed(),
        key.timestamp,
        format_timestamp(key.timestamp)
    );
    Ok(())
}

/// Encode fields into a record key and print it.
pub fn encode(
    content_hash: String,
    structural_hash: &str,
    group_id: String,
    user_id: String,
    timestamp: i64,
) -> Result<()> {
    let key = RecordKey {
        content_hash,
        structural_hash: parse_structural_hash(structural_hash)?,
        group_id,
        user_id,
        timestamp,
    };
    key.validate().context("Cannot encode key")?;

    println!("{}", KeyCodec::encode(&key));
    Ok(())
}
