//! Public addressing of site records.
//!
//! An address is the `(owner, site)` pair, carried as two path-like segments
//! behind a `p/` marker: `p/<owner>/<site>`. Share links put that token in the
//! URL fragment (`https://host/#p/<owner>/<site>`); the HTTP server also
//! routes the same token as a path. The cosmetic slug never takes part.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::{OwnerId, SiteId};

const MARKER: &str = "p";
const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub owner: OwnerId,
    pub site: SiteId,
}

impl Address {
    pub fn new(owner: OwnerId, site: SiteId) -> Self {
        Self { owner, site }
    }

    /// Token form, `p/<owner>/<site>`
    pub fn encode(&self) -> String {
        format!("{MARKER}{SEPARATOR}{}{SEPARATOR}{}", self.owner, self.site)
    }

    /// Inverse of [`Address::encode`]. Only the bare token is accepted.
    pub fn decode(raw: &str) -> Result<Self> {
        from_token(raw).ok_or_else(|| invalid(raw))
    }

    /// Like [`parse_address`], with a reason on failure
    pub fn parse(raw: &str) -> Result<Self> {
        parse_address(raw).ok_or_else(|| invalid(raw))
    }
}

fn invalid(raw: &str) -> Error {
    Error::InvalidAddress(format!("'{}' is not of the form p/<owner>/<site>", raw))
}

fn from_token(token: &str) -> Option<Address> {
    let mut parts = token.split(SEPARATOR);
    if parts.next()? != MARKER {
        return None;
    }
    let owner = OwnerId::new(parts.next()?).ok()?;
    let site = SiteId::new(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Address { owner, site })
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Parse a raw address.
///
/// Accepts the bare token (`p/o/s`), a fragment (`#p/o/s`), a path (`/p/o/s`)
/// or a full share link whose fragment holds the token. A single trailing `/`
/// is tolerated; anything else (extra segments, empty or invalid ids) yields
/// `None`.
pub fn parse_address(raw: &str) -> Option<Address> {
    let raw = raw.trim();
    let token = match raw.split_once('#') {
        Some((_, fragment)) => fragment,
        None => raw,
    };
    let token = token.strip_prefix(SEPARATOR).unwrap_or(token);
    let token = token.strip_suffix(SEPARATOR).unwrap_or(token);
    from_token(token)
}

/// Build a shareable link for an address under `base_url`
pub fn share_link(base_url: &str, address: &Address) -> String {
    format!("{}/#{}", base_url.trim_end_matches(SEPARATOR), address.encode())
}
