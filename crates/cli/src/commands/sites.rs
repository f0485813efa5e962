use anyhow::{Context, Result};
use launchkit_core::{Address, SiteId, SiteRecord, share_link};
use launchkit_generator::{PRESETS, find_preset};
use launchkit_store::{Resolver, SiteStore};
use launchkit_validator::{parse_generation_result, validate_content};
use std::fs;
use std::path::PathBuf;

use super::{Workspace, print_report};
use crate::session::{self, Session};

fn owner_store(ws: &Workspace, session: &Session) -> SiteStore {
    SiteStore::for_owner(ws.backend(), &session.owner_id)
}

/// Prompt text from either a literal prompt or a preset key
fn prompt_text(
    session: &Session,
    prompt: Option<String>,
    preset: Option<String>,
) -> Result<String> {
    match (prompt, preset) {
        (Some(_), Some(_)) => anyhow::bail!("Pass either a prompt or --preset, not both"),
        (Some(prompt), None) => Ok(prompt),
        (None, Some(key)) => {
            if !session.can_use_presets() {
                anyhow::bail!("Presets are available to elevated sessions only");
            }
            let preset = find_preset(&key).with_context(|| {
                format!("Unknown preset '{}'. Run 'launchkit presets' to list them", key)
            })?;
            Ok(preset.text.to_string())
        }
        (None, None) => anyhow::bail!("A prompt is required"),
    }
}

fn print_record(record: &SiteRecord, base_url: &str) {
    let state = if record.is_published {
        "published"
    } else {
        "draft"
    };
    println!("{}  {}", record.id, record.content.title);
    println!("   Slug: {}", record.content.slug);
    println!("   Created: {}", record.created_at.to_rfc3339());
    println!("   State: {}", state);
    println!("   Link: {}", share_link(base_url, &record.address()));
}

pub async fn generate(
    ws: &Workspace,
    prompt: Option<String>,
    preset: Option<String>,
) -> Result<()> {
    let session = session::require(&ws.home)?;
    let prompt = prompt_text(&session, prompt, preset)?;
    let generator = ws.generator()?;

    println!("✨ Generating landing page...");
    let content = generator.generate(&prompt).await?;
    println!("   ✓ {}", content.title);
    print_report(&validate_content(
        &content,
        &ws.config.renderer.tailwind_runtime_url,
    ));

    let record = owner_store(ws, &session)
        .create(&session.owner_id, &prompt, content)
        .await?;

    println!();
    println!("✓ Saved as {}", record.id);
    println!("   Address: {}", record.address());
    println!("   Not yet published. Run 'launchkit publish {}'", record.id);
    Ok(())
}

pub async fn regenerate(ws: &Workspace, id: String, prompt: Option<String>) -> Result<()> {
    let session = session::require(&ws.home)?;
    let id = SiteId::new(id)?;
    let store = owner_store(ws, &session);
    let record = store.get(&session.owner_id, &id).await?;
    let prompt = prompt.unwrap_or(record.prompt);
    let generator = ws.generator()?;

    println!("✨ Regenerating {}...", id);
    let content = generator.generate(&prompt).await?;
    let updated = store
        .replace_content(&session.owner_id, &id, content)
        .await?;
    println!("✓ Replaced content: {}", updated.content.title);
    if updated.is_published {
        println!("   ⚠ Site is published; the new content is live");
    }
    Ok(())
}

pub async fn list(ws: &Workspace) -> Result<()> {
    let session = session::require(&ws.home)?;
    let records = owner_store(ws, &session).list(&session.owner_id).await?;

    if records.is_empty() {
        println!("No sites yet. Run 'launchkit generate \"<prompt>\"'");
        return Ok(());
    }
    for record in &records {
        let marker = if record.is_published { "●" } else { "○" };
        println!(
            "{} {}  {}  {}",
            marker,
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.content.title
        );
    }
    println!("\n{} site(s), newest first", records.len());
    Ok(())
}

pub async fn show(ws: &Workspace, id: String, json: bool) -> Result<()> {
    let session = session::require(&ws.home)?;
    let record = owner_store(ws, &session)
        .get(&session.owner_id, &SiteId::new(id)?)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.content)?);
    } else {
        print_record(&record, &ws.base_url());
        println!("   Prompt: {}", record.prompt);
        if !record.content.preview_instructions.is_empty() {
            println!("   Preview: {}", record.content.preview_instructions);
        }
        if !record.content.author_notes.is_empty() {
            println!("   Notes: {}", record.content.author_notes);
        }
    }
    Ok(())
}

pub async fn publish(ws: &Workspace, id: String) -> Result<()> {
    let session = session::require(&ws.home)?;
    let record = owner_store(ws, &session)
        .publish(&session.owner_id, &SiteId::new(id)?)
        .await?;
    println!("✓ Published {}", record.content.title);
    println!("   {}", share_link(&ws.base_url(), &record.address()));
    Ok(())
}

pub async fn unpublish(ws: &Workspace, id: String) -> Result<()> {
    let session = session::require(&ws.home)?;
    let record = owner_store(ws, &session)
        .unpublish(&session.owner_id, &SiteId::new(id)?)
        .await?;
    println!("✓ Unpublished {}", record.content.title);
    Ok(())
}

pub async fn link(ws: &Workspace, id: String) -> Result<()> {
    let session = session::require(&ws.home)?;
    let record = owner_store(ws, &session)
        .get(&session.owner_id, &SiteId::new(id)?)
        .await?;
    println!("{}", share_link(&ws.base_url(), &record.address()));
    if !record.is_published {
        eprintln!("⚠ Not yet published; visitors will see an unpublished notice");
    }
    Ok(())
}

/// Resolve an address the way an anonymous visitor would
pub async fn resolve(ws: &Workspace, address: String) -> Result<()> {
    let address = Address::parse(&address)?;
    let content = Resolver::new(ws.backend())
        .resolve_address(&address)
        .await?;
    println!("✓ {}", content.title);
    println!("   Slug: {}", content.slug);
    if !content.description.is_empty() {
        println!("   {}", content.description);
    }
    Ok(())
}

/// Replace a site's content wholesale from a JSON file
pub async fn edit(ws: &Workspace, id: String, file: PathBuf) -> Result<()> {
    let session = session::require(&ws.home)?;
    let json = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let content = parse_generation_result(&json)
        .with_context(|| format!("{} is not valid site content", file.display()))?;

    let record = owner_store(ws, &session)
        .replace_content(&session.owner_id, &SiteId::new(id)?, content)
        .await?;
    println!("✓ Updated {}", record.content.title);
    Ok(())
}

pub async fn presets(ws: &Workspace) -> Result<()> {
    let session = session::require(&ws.home)?;
    if !session.can_use_presets() {
        println!("Presets are available to elevated sessions only");
        return Ok(());
    }
    for preset in PRESETS {
        println!("{:<12} {}", preset.key, preset.label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use launchkit_core::OwnerId;

    fn session(role: Role) -> Session {
        Session::new(OwnerId::new("u1").unwrap(), role)
    }

    #[test]
    fn test_literal_prompt() {
        let text = prompt_text(&session(Role::Standard), Some("Bakery".into()), None).unwrap();
        assert_eq!(text, "Bakery");
    }

    #[test]
    fn test_preset_requires_elevated() {
        assert!(prompt_text(&session(Role::Standard), None, Some("saas".into())).is_err());

        let text = prompt_text(&session(Role::Elevated), None, Some("SaaS".into())).unwrap();
        assert_eq!(text, find_preset("saas").unwrap().text);
    }

    #[test]
    fn test_prompt_and_preset_are_exclusive() {
        let elevated = session(Role::Elevated);
        assert!(prompt_text(&elevated, Some("x".into()), Some("saas".into())).is_err());
        assert!(prompt_text(&session(Role::Elevated), None, None).is_err());
        assert!(prompt_text(&session(Role::Elevated), None, Some("nope".into())).is_err());
    }
}
