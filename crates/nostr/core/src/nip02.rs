//! NIP-02: Follow List (Contact List)
//!
//! A kind 3 event is a snapshot of who a user follows: one `p` tag per
//! followed key with an optional relay hint, and (by convention) the user's
//! relay read/write preferences serialized as JSON in the content.
//!
//! Decoding is best-effort. A bad key drops that entry and unreadable content
//! yields no preferences; both are logged, neither invalidates the list.
//!
//! See: <https://github.com/nostr-protocol/nips/blob/master/02.md>

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::Event;
use crate::nip01::KIND_CONTACTS;
use crate::nip19::public_key_hex;
use crate::tags::USER_MARKER;

#[cfg(feature = "full")]
use crate::nip01::{EventTemplate, Nip01Error, finalize_event};

/// Event kind for contact lists (follow lists)
pub const CONTACT_LIST_KIND: u16 = KIND_CONTACTS;

/// Errors that can occur during NIP-02 operations
#[derive(Debug, Error)]
pub enum Nip02Error {
    #[error("invalid event kind: expected 3, got {0}")]
    InvalidKind(u16),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "full")]
    #[error("signing error: {0}")]
    Signing(#[from] Nip01Error),
}

/// A single followed profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// The public key of the followed profile (32-byte hex)
    pub pubkey: String,

    /// Optional relay URL where this profile can be found
    pub relay_url: Option<String>,
}

impl Contact {
    pub fn new(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_url: None,
        }
    }

    pub fn with_relay(pubkey: impl Into<String>, relay_url: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_url: Some(relay_url.into()),
        }
    }

    /// Convert to a p-tag: two elements, or three with a relay hint.
    pub fn to_tag(&self) -> Vec<String> {
        let mut tag = vec![USER_MARKER.to_string(), self.pubkey.clone()];
        if let Some(ref relay_url) = self.relay_url {
            tag.push(relay_url.clone());
        }
        tag
    }
}

/// Relay usage flags stored in contact list content. Missing flags read as false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadWrite {
    pub read: bool,
    pub write: bool,
}

/// Relay URL to usage flags; ordered so serialization is reproducible.
pub type RelayPreferences = BTreeMap<String, ReadWrite>;

/// Contact list (follow list) event
#[derive(Debug, Clone)]
pub struct ContactListEvent {
    pub event: Event,
    verified_follows: OnceLock<HashSet<String>>,
}

impl ContactListEvent {
    /// Wrap an event, checking it is a contact list.
    pub fn from_event(event: Event) -> Result<Self, Nip02Error> {
        if event.kind != CONTACT_LIST_KIND {
            return Err(Nip02Error::InvalidKind(event.kind));
        }
        Ok(Self {
            event,
            verified_follows: OnceLock::new(),
        })
    }

    /// Build and sign a contact list.
    ///
    /// Identical inputs produce identical tags, content and id.
    #[cfg(feature = "full")]
    pub fn create(
        follows: &[Contact],
        relay_use: Option<&RelayPreferences>,
        secret_key: &[u8; 32],
        created_at: u64,
    ) -> Result<Self, Nip02Error> {
        let content = match relay_use {
            Some(prefs) => serde_json::to_string(prefs)?,
            None => String::new(),
        };

        let template = EventTemplate {
            created_at,
            kind: CONTACT_LIST_KIND,
            tags: follows.iter().map(Contact::to_tag).collect(),
            content,
        };

        Self::from_event(finalize_event(&template, secret_key)?)
    }

    /// Followed keys that pass validation, as lowercase hex.
    ///
    /// Computed once per instance; entries that fail validation are logged
    /// and left out.
    pub fn verified_follow_key_set(&self) -> &HashSet<String> {
        if let Some(cached) = self.verified_follows.get() {
            return cached;
        }
        let computed = self
            .p_tags()
            .filter_map(|tag| {
                let key = tag.get(1);
                if key.is_none() {
                    warn!("Can't parse tag as a follow: {:?}: missing key", tag);
                }
                key
            })
            .filter_map(|key| match public_key_hex(key) {
                Ok(hex) => Some(hex),
                Err(e) => {
                    warn!("Can't parse tag as a follow: {}: {}", key, e);
                    None
                }
            })
            .collect();
        self.verified_follows.get_or_init(|| computed)
    }

    /// Verified follows plus the list's own author.
    pub fn verified_follow_key_set_and_me(&self) -> HashSet<String> {
        let mut keys = self.verified_follow_key_set().clone();
        keys.insert(self.event.pubkey.clone());
        keys
    }

    /// Raw `p` tag values, unvalidated, in tag order.
    pub fn unverified_follow_key_set(&self) -> Vec<String> {
        self.p_tags()
            .filter_map(|tag| tag.get(1).cloned())
            .collect()
    }

    /// Follows with their relay hints, in tag order.
    ///
    /// Relay hints are kept as written. Entries with a missing or invalid key
    /// are logged and skipped.
    pub fn follows(&self) -> Vec<Contact> {
        self.p_tags()
            .filter_map(|tag| {
                let Some(key) = tag.get(1) else {
                    warn!("Can't parse tag as a follow: {:?}: missing key", tag);
                    return None;
                };
                match public_key_hex(key) {
                    Ok(pubkey) => Some(Contact {
                        pubkey,
                        relay_url: tag.get(2).cloned(),
                    }),
                    Err(e) => {
                        warn!("Can't parse tag as a follow: {}: {}", key, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Relay preferences from the content, if present and readable.
    pub fn relays(&self) -> Option<RelayPreferences> {
        if self.event.content.is_empty() {
            return None;
        }
        match serde_json::from_str(&self.event.content) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn!(
                    "Can't parse content as relay lists: {}: {}",
                    self.event.content, e
                );
                None
            }
        }
    }

    fn p_tags(&self) -> impl Iterator<Item = &Vec<String>> {
        self.event
            .tags
            .iter()
            .filter(|tag| tag.first().map(String::as_str) == Some(USER_MARKER))
    }
}
