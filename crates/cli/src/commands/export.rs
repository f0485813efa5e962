use anyhow::{Context, Result};
use launchkit_core::{SiteContent, SiteId};
use launchkit_renderer::{RenderOptions, render_document};
use launchkit_store::SiteStore;
use std::fs;
use std::path::{Path, PathBuf};

use super::Workspace;
use crate::session;

/// Write the compiled document for `content` into `output`
pub fn write_site(
    content: &SiteContent,
    options: &RenderOptions,
    output: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output).context("Failed to create output directory")?;
    let index = output.join("index.html");
    fs::write(&index, render_document(content, options)).context("Failed to write index.html")?;
    Ok(index)
}

/// Export one of the owner's sites as a standalone `index.html`
pub async fn run(ws: &Workspace, id: String, output: PathBuf) -> Result<()> {
    let session = session::require(&ws.home)?;
    let record = SiteStore::for_owner(ws.backend(), &session.owner_id)
        .get(&session.owner_id, &SiteId::new(id)?)
        .await?;

    println!("🔨 Exporting {}...", record.content.title);
    println!("   Output: {}", output.display());

    let index = write_site(&record.content, &ws.render_options(), &output)?;
    println!("   ✓ Generated {}", index.display());

    if !record.content.assets.is_empty() {
        println!("   ⚠ Asset placeholders to supply:");
        for asset in &record.content.assets {
            println!("      {}  ({})", asset.path, asset.alt_text);
        }
    }
    if !record.is_published {
        println!("   ℹ Site is not published; the export is for your own use");
    }

    println!();
    println!("✅ Export complete!");
    println!("To test locally:");
    println!("   cd {} && python3 -m http.server 8000", output.display());
    Ok(())
}
