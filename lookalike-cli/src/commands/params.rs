//! Params command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use lookalike_core::BandingParams;

/// Similarities at which the collision probability is tabulated.
const PROBE_SIMILARITIES: [f64; 8] = [0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.9];

/// Execute the params command.
pub fn execute(threshold: f64, num_perm: usize, json: bool) -> Result<()> {
    let params = BandingParams::optimal(threshold, num_perm)
        .context("Failed to derive banding parameters")?;

    if json {
        let curve: Vec<_> = PROBE_SIMILARITIES
            .iter()
            .map(|&s| serde_json::json!({ "similarity": s, "probability": params.collision_probability(s) }))
            .collect();
        let out = serde_json::json!({
            "threshold": threshold,
            "num_perm": num_perm,
            "bands": params.bands,
            "rows": params.rows,
            "threshold_point": params.threshold_point(),
            "collision_curve": curve,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("   {} {}", "Threshold:".dimmed(), threshold);
    println!("   {} {}", "Signature length:".dimmed(), num_perm);
    println!(
        "   {} {} x {}",
        "Bands x rows:".dimmed(),
        params.bands.to_string().bold(),
        params.rows.to_string().bold()
    );
    println!(
        "   {} {:.4}",
        "S-curve midpoint:".dimmed(),
        params.threshold_point()
    );
    println!();
    println!("   {}", "Candidate probability by similarity".bold());
    for s in PROBE_SIMILARITIES {
        let p = params.collision_probability(s);
        let line = format!("   s = {:<5} P = {:.4}", s, p);
        if s >= threshold {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
    println!();

    Ok(())
}
