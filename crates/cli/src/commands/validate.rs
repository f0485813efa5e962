use anyhow::{Context, Result};
use launchkit_validator::{parse_generation_result, validate_content};
use std::fs;
use std::path::PathBuf;

use super::{Workspace, print_report};

/// Check a site content JSON file against the generation schema
pub async fn run(ws: &Workspace, file: PathBuf) -> Result<()> {
    println!("Validating site content at: {}", file.display());

    let json = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let content = parse_generation_result(&json)?;
    println!("✓ Schema valid");
    println!("  Title: {}", content.title);
    println!("  Slug: {}", content.slug);

    let report = validate_content(&content, &ws.config.renderer.tailwind_runtime_url);
    print_report(&report);
    if !report.is_valid() {
        anyhow::bail!("{} error(s) found", report.errors.len());
    }
    Ok(())
}
