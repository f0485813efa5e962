//! Compiles [`launchkit_core::SiteContent`] into a standalone document and
//! mounts it behind a sandbox boundary.

pub mod document;
pub mod mount;
pub mod sandbox;

pub use document::{RenderOptions, html_escape, render_document};
pub use mount::{
    ContentFingerprint, MountOutcome, MountTicket, MountView, MountedDocument, PreviewMount,
};
pub use sandbox::{Capability, SandboxPolicy, message_page, shell_page};
