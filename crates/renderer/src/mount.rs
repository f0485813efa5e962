use launchkit_core::SiteContent;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::document::{RenderOptions, render_document};

/// SHA-256 over every field of a [`SiteContent`].
///
/// Two contents with equal fingerprints render to the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    pub fn of(content: &SiteContent) -> Self {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };

        field(content.title.as_bytes());
        field(content.description.as_bytes());
        field(content.slug.as_bytes());
        field(content.html.as_bytes());
        field(content.css.as_bytes());
        field(content.scripts.as_bytes());
        field(&[content.tailwind_enabled as u8, content.mobile_first as u8]);
        field(&(content.assets.len() as u64).to_le_bytes());
        for asset in &content.assets {
            field(asset.path.as_bytes());
            field(asset.alt_text.as_bytes());
        }
        for value in [
            &content.seo.title_tag,
            &content.seo.meta_description,
            &content.seo.og_title,
            &content.seo.og_description,
            &content.seo.og_image,
        ] {
            match value {
                Some(v) => {
                    field(&[1]);
                    field(v.as_bytes());
                }
                None => field(&[0]),
            }
        }
        field(content.accessibility_notes.as_bytes());
        field(content.author_notes.as_bytes());
        field(content.preview_instructions.as_bytes());

        Self(hasher.finalize().into())
    }

    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A document currently installed in the preview surface
#[derive(Debug, Clone)]
pub struct MountedDocument {
    pub fingerprint: ContentFingerprint,
    pub title: String,
    pub document: Arc<str>,
    /// Increments on every fresh mount; a changed value tells viewers to
    /// rebuild their frame
    pub generation: u64,
}

/// Claim on the preview surface, taken before the content is available
#[derive(Debug, PartialEq, Eq)]
pub struct MountTicket(u64);

/// State of the surface when a background refresh started reading.
///
/// Any reserve, mount or teardown after it was taken makes it outdated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountView(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Previous document torn down, new one installed
    Mounted { generation: u64 },
    /// Same fingerprint as what is already mounted; nothing changed
    Unchanged,
    /// The surface moved on since the ticket or view was taken; result
    /// discarded
    Stale,
}

/// Single preview surface with teardown-before-mount semantics.
///
/// Callers reserve a ticket before starting slow work (generation, a store
/// read) and present it with the result. Only the most recently reserved
/// ticket may mount, so a slow earlier request can never overwrite the
/// output of a later one.
///
/// Background refreshes of the shown record go through [`PreviewMount::view`]
/// and [`PreviewMount::refresh`] instead, so they never supersede a pending
/// request.
#[derive(Debug)]
pub struct PreviewMount {
    options: RenderOptions,
    current: Option<MountedDocument>,
    latest_ticket: u64,
    generation: u64,
    revision: u64,
}

impl PreviewMount {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            current: None,
            latest_ticket: 0,
            generation: 0,
            revision: 0,
        }
    }

    pub fn reserve(&mut self) -> MountTicket {
        self.latest_ticket += 1;
        self.revision += 1;
        MountTicket(self.latest_ticket)
    }

    pub fn view(&self) -> MountView {
        MountView(self.revision)
    }

    /// Remount from a background re-read, unless the surface changed since
    /// `view` was taken. Pending tickets stay valid.
    pub fn refresh(&mut self, view: MountView, content: &SiteContent) -> MountOutcome {
        if view.0 != self.revision {
            debug!(view = view.0, revision = self.revision, "discarding outdated refresh");
            return MountOutcome::Stale;
        }
        self.install(content)
    }

    pub fn mount(&mut self, ticket: MountTicket, content: &SiteContent) -> MountOutcome {
        if ticket.0 < self.latest_ticket {
            debug!(
                ticket = ticket.0,
                latest = self.latest_ticket,
                "discarding stale preview result"
            );
            return MountOutcome::Stale;
        }
        self.install(content)
    }

    fn install(&mut self, content: &SiteContent) -> MountOutcome {
        let fingerprint = ContentFingerprint::of(content);
        if self
            .current
            .as_ref()
            .is_some_and(|m| m.fingerprint == fingerprint)
        {
            return MountOutcome::Unchanged;
        }

        self.teardown();
        self.generation += 1;
        let document = render_document(content, &self.options);
        self.current = Some(MountedDocument {
            fingerprint,
            title: content.title.clone(),
            document: Arc::from(document),
            generation: self.generation,
        });
        info!(
            generation = self.generation,
            fingerprint = %fingerprint.short(),
            title = %content.title,
            "preview mounted"
        );
        MountOutcome::Mounted {
            generation: self.generation,
        }
    }

    /// Reserve and mount in one step
    pub fn mount_now(&mut self, content: &SiteContent) -> MountOutcome {
        let ticket = self.reserve();
        self.mount(ticket, content)
    }

    /// Drop the mounted document. Returns whether anything was mounted.
    pub fn teardown(&mut self) -> bool {
        self.revision += 1;
        match self.current.take() {
            Some(previous) => {
                debug!(generation = previous.generation, "preview torn down");
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&MountedDocument> {
        self.current.as_ref()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }
}

impl Default for PreviewMount {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}
