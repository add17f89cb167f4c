//! NIP-10: Text Notes and Threads
//!
//! A text note carries two overlapping views of what it points at: the
//! structural `e`/`a`/`p` tags, and the citations written into the content.
//! [`TextNote`] reconciles the two so renderers can show inline citations in
//! place and only draw reply chrome for tags the text doesn't already cite.
//!
//! See: <https://github.com/nostr-protocol/nips/blob/master/10.md>

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::Event;
use crate::nip01::KIND_SHORT_TEXT_NOTE;
use crate::nip27;
use crate::nip33::parse_address;
use crate::tags::{ADDRESS_MARKER, EVENT_MARKER, USER_MARKER};

/// Event kind for text notes
pub const TEXT_NOTE_KIND: u16 = KIND_SHORT_TEXT_NOTE;

/// A text-bearing event with reference resolution.
///
/// Works for any kind whose content may cite other events (notes, long-form,
/// comments); the kind is not checked.
#[derive(Debug, Clone)]
pub struct TextNote {
    pub event: Event,
    cited_users: OnceLock<HashSet<String>>,
}

impl From<Event> for TextNote {
    fn from(event: Event) -> Self {
        Self::new(event)
    }
}

impl TextNote {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            cited_users: OnceLock::new(),
        }
    }

    /// Users tagged with `p`.
    pub fn mentions(&self) -> HashSet<String> {
        self.event
            .tag_index()
            .values_where(USER_MARKER)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Events tagged with `e`, in tag order.
    ///
    /// Order matters to root/reply heuristics downstream.
    pub fn reply_targets(&self) -> Vec<String> {
        self.event
            .tag_index()
            .values_where(EVENT_MARKER)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Addressable events tagged with `a`, as normalized coordinates.
    ///
    /// Tags whose value isn't a valid coordinate are left out.
    pub fn address_targets(&self) -> Vec<String> {
        self.event
            .tag_index()
            .values_where(ADDRESS_MARKER)
            .into_iter()
            .filter_map(|value| parse_address(value).ok())
            .map(|coordinate| coordinate.to_string())
            .collect()
    }

    /// Users cited from the content, through `#[n]` or a decoded identifier
    /// that matches a `p` tag.
    ///
    /// Computed once per instance. Concurrent first calls may each scan the
    /// content; the first result stored wins and all results are identical.
    pub fn cited_users(&self) -> &HashSet<String> {
        if let Some(cached) = self.cited_users.get() {
            return cached;
        }
        let computed = nip27::cited_users(&self.event.tags, &self.event.content);
        self.cited_users.get_or_init(|| computed)
    }

    /// Events and addresses cited from the content through an `e` or `a` tag.
    pub fn find_citations(&self) -> HashSet<String> {
        nip27::find_citations(&self.event.tags, &self.event.content)
    }

    /// Structural reply targets that aren't already cited inline.
    ///
    /// With no citations at all, every `e` target followed by every `a`
    /// coordinate is returned. Once anything is cited, only the `e` targets
    /// that aren't cited are returned and `a` coordinates are dropped
    /// entirely, even uncited ones.
    pub fn tags_without_citations(&self) -> Vec<String> {
        let replies = self.reply_targets();
        let addresses = self.address_targets();
        if replies.is_empty() && addresses.is_empty() {
            return Vec::new();
        }

        let citations = self.find_citations();
        if citations.is_empty() {
            replies.into_iter().chain(addresses).collect()
        } else {
            replies
                .into_iter()
                .filter(|id| !citations.contains(id))
                .collect()
        }
    }

    /// Whether any `e` tag is present.
    pub fn is_reply(&self) -> bool {
        !self.reply_targets().is_empty()
    }

    pub fn content(&self) -> &str {
        &self.event.content
    }

    pub fn author_pubkey(&self) -> &str {
        &self.event.pubkey
    }
}
