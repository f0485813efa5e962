use anyhow::Result;
use launchkit_core::OwnerId;

use super::Workspace;
use crate::session::{self, Role, Session};

pub async fn login(ws: &Workspace, owner: String, role: Role) -> Result<()> {
    let owner_id = OwnerId::new(owner)?;
    if let Some(previous) = session::load(&ws.home)?
        && previous.owner_id != owner_id
    {
        println!("   Replacing session for {}", previous.owner_id);
    }

    let session = Session::new(owner_id, role);
    session::save(&ws.home, &session)?;
    println!("✓ Logged in as {} ({:?})", session.owner_id, session.role);
    Ok(())
}

pub async fn logout(ws: &Workspace) -> Result<()> {
    if session::clear(&ws.home)? {
        println!("✓ Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub async fn whoami(ws: &Workspace) -> Result<()> {
    match session::load(&ws.home)? {
        Some(session) => {
            println!("{}", session.owner_id);
            println!("   Role: {:?}", session.role);
            if session.can_use_presets() {
                println!("   Presets: available");
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}
