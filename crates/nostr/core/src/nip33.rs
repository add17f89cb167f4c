//! NIP-33: Parameterized Replaceable Events (addressable events)
//!
//! Addressable events are referenced by coordinate rather than by id:
//!
//! ```text
//! <kind>:<pubkey>:<d-tag-value>
//! ```
//!
//! In tags they appear as `["a", "<kind>:<pubkey>:<d-tag-value>", "<relay>"]`.
//! Coordinates read from tags are normalized (lowercase pubkey, decimal kind)
//! so they compare equal to coordinates decoded from `naddr` identifiers.

use std::fmt;

use thiserror::Error;

/// Tag name for addressable event references
pub const A_TAG: &str = "a";

/// Errors that can occur during NIP-33 operations.
#[derive(Debug, Error)]
pub enum Nip33Error {
    #[error("invalid address format: {0}")]
    InvalidAddress(String),
}

/// A parsed `<kind>:<pubkey>:<d-tag>` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub kind: u32,
    /// Lowercase hex public key of the author
    pub pubkey: String,
    /// The d tag value; may be empty and may itself contain `:`
    pub identifier: String,
}

impl Coordinate {
    /// Convert to an "a" tag, with an optional relay hint.
    pub fn to_tag(&self, relay_url: Option<&str>) -> Vec<String> {
        let mut tag = vec![A_TAG.to_string(), self.to_string()];
        if let Some(url) = relay_url {
            tag.push(url.to_string());
        }
        tag
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&create_address(self.kind, &self.pubkey, &self.identifier))
    }
}

impl std::str::FromStr for Coordinate {
    type Err = Nip33Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

/// Create an address string for an addressable event.
///
/// ```
/// use nostr_refs::nip33::create_address;
///
/// let address = create_address(
///     30023,
///     "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d",
///     "my-article",
/// );
/// assert_eq!(
///     address,
///     "30023:3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d:my-article"
/// );
/// ```
pub fn create_address(kind: u32, pubkey: &str, d_tag: &str) -> String {
    format!("{}:{}:{}", kind, pubkey, d_tag)
}

/// Parse an address string into a normalized coordinate.
///
/// ```
/// use nostr_refs::nip33::parse_address;
///
/// let coordinate = parse_address(
///     "30023:3BF0C63FCB93463407AF97A5E5EE64FA883D107EF9E558472C4EB9AAAEFA459D:my-article",
/// )
/// .unwrap();
/// assert_eq!(coordinate.kind, 30023);
/// assert_eq!(
///     coordinate.pubkey,
///     "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d"
/// );
/// assert_eq!(coordinate.identifier, "my-article");
/// ```
pub fn parse_address(address: &str) -> Result<Coordinate, Nip33Error> {
    let mut parts = address.splitn(3, ':');
    let (Some(kind), Some(pubkey), Some(identifier)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Nip33Error::InvalidAddress(
            "address must have format kind:pubkey:dtag".to_string(),
        ));
    };

    let kind = kind
        .parse::<u32>()
        .map_err(|_| Nip33Error::InvalidAddress(format!("invalid kind: {}", kind)))?;

    if pubkey.len() != 64 || !pubkey.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Nip33Error::InvalidAddress(
            "pubkey must be 64 hex characters".to_string(),
        ));
    }

    Ok(Coordinate {
        kind,
        pubkey: pubkey.to_ascii_lowercase(),
        identifier: identifier.to_string(),
    })
}
