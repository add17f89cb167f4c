//! NIP-27: Text Note References
//!
//! Content can cite other profiles and events in two ways:
//!
//! - NIP-08 backreferences (`#[2]`) pointing at a tag by position, and
//! - NIP-19/NIP-21 identifiers (`nostr:npub1…`, `@note1…`, `naddr1…`).
//!
//! Tags are authoritative. A citation only counts when it resolves to a tag
//! entry with the expected marker; an identifier with no matching tag is not
//! a citation, and malformed tokens are skipped rather than reported.
//!
//! ## Example
//!
//! ```
//! use nostr_refs::nip19::encode_note;
//! use nostr_refs::nip27::find_citations;
//!
//! let id = hex::encode([9u8; 32]);
//! let tags = vec![vec!["e".to_string(), id.clone()]];
//! let content = format!("quoting nostr:{}", encode_note(&[9u8; 32]).unwrap());
//!
//! assert!(find_citations(&tags, &content).contains(&id));
//! ```

use std::collections::HashSet;

use crate::nip08::backreferences;
use crate::nip19::{Nip19Entity, ReferenceKind};
use crate::nip21::identifiers;
use crate::tags::{ADDRESS_MARKER, EVENT_MARKER, TagIndex, USER_MARKER, marker};

/// A reference to another entity (profile, event or address) found in content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionReference {
    /// The decoded NIP-19 entity
    pub entity: Nip19Entity,
    /// The token as written, including scheme, `@` and trailing text
    pub uri: String,
    /// Text glued to the end of the identifier (punctuation etc.)
    pub trailing: Option<String>,
    /// The byte position where this reference starts in the content
    pub start: usize,
    /// The byte position where this reference ends in the content
    pub end: usize,
}

/// Users cited in `content` through a `p` tag.
pub fn cited_users(tags: &[Vec<String>], content: &str) -> HashSet<String> {
    collect_citations(&TagIndex::new(tags), content, &[USER_MARKER])
}

/// Events and addresses cited in `content` through an `e` or `a` tag.
pub fn find_citations(tags: &[Vec<String>], content: &str) -> HashSet<String> {
    collect_citations(
        &TagIndex::new(tags),
        content,
        &[EVENT_MARKER, ADDRESS_MARKER],
    )
}

/// Element 1 of every tag reached from `content` whose marker is in `markers`.
pub(crate) fn collect_citations(
    index: &TagIndex<'_>,
    content: &str,
    markers: &[&str],
) -> HashSet<String> {
    let wanted = |tag: &[String]| marker(tag).is_some_and(|m| markers.iter().any(|&w| w == m));
    let mut citations = HashSet::new();

    for backref in backreferences(content) {
        let Some(tag) = backref.index().and_then(|i| index.tag_at(i)) else {
            tracing::debug!("Skipping unresolvable backreference #[{}]", backref.digits);
            continue;
        };
        if tag.len() > 1 && wanted(tag) {
            citations.insert(tag[1].clone());
        }
    }

    for token in identifiers(content) {
        let Some(parsed) = token.parse() else {
            continue;
        };
        if let Some(tag) = index.tag_referencing(&parsed.hex()) {
            if wanted(tag) {
                citations.insert(tag[1].clone());
            }
        }
    }

    citations
}

/// Extract every decodable identifier from content, in order.
///
/// Undecodable tokens are skipped.
pub fn extract_references(content: &str) -> Vec<MentionReference> {
    identifiers(content)
        .filter_map(|token| {
            let parsed = token.parse()?;
            Some(MentionReference {
                entity: parsed.entity,
                uri: token.as_str(content).to_string(),
                trailing: parsed.trailing,
                start: token.start,
                end: token.end,
            })
        })
        .collect()
}

/// Quick check for anything that looks like an identifier; does not decode.
pub fn has_references(content: &str) -> bool {
    identifiers(content).next().is_some()
}

/// Profile references (npub or nprofile) in content.
pub fn extract_profile_references(content: &str) -> Vec<MentionReference> {
    extract_references(content)
        .into_iter()
        .filter(|r| r.entity.kind() == ReferenceKind::User)
        .collect()
}

/// Event references (note, nevent or naddr) in content.
pub fn extract_event_references(content: &str) -> Vec<MentionReference> {
    extract_references(content)
        .into_iter()
        .filter(|r| r.entity.kind() != ReferenceKind::User)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nip19::{
        AddressPointer, EventPointer, ProfilePointer, encode_naddr, encode_nevent,
        encode_note, encode_nprofile, encode_npub,
    };

    fn tag(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn hex32(b: u8) -> String {
        hex::encode([b; 32])
    }

    #[test]
    fn test_backreference_to_p_tag() {
        let tags = vec![tag(&["e", "E1"]), tag(&["p", "U1"])];
        let users = cited_users(&tags, "hello #[1]");
        assert_eq!(users, HashSet::from(["U1".to_string()]));
    }

    #[test]
    fn test_backreference_wrong_marker_ignored() {
        let tags = vec![tag(&["e", "E1"]), tag(&["p", "U1"])];
        assert!(cited_users(&tags, "#[0]").is_empty());
        assert_eq!(
            find_citations(&tags, "#[0]"),
            HashSet::from(["E1".to_string()])
        );
    }

    #[test]
    fn test_backreference_out_of_range_and_short_tag() {
        let tags = vec![tag(&["p"]), tag(&["p", "U1"])];
        assert!(cited_users(&tags, "#[0] #[2] #[99999999999999999999999]").is_empty());
    }

    #[test]
    fn test_identifier_needs_matching_tag() {
        let npub = encode_npub(&[1u8; 32]).unwrap();
        let content = format!("hi nostr:{}", npub);

        assert!(cited_users(&[], &content).is_empty());

        let tags = vec![tag(&["p", &hex32(1)])];
        assert_eq!(cited_users(&tags, &content), HashSet::from([hex32(1)]));
    }

    #[test]
    fn test_nprofile_resolves_to_p_tag() {
        let nprofile = encode_nprofile(&ProfilePointer {
            pubkey: [2u8; 32],
            relays: vec!["wss://relay.example.com".to_string()],
        })
        .unwrap();
        let tags = vec![tag(&["p", &hex32(2), "wss://relay.example.com"])];

        let users = cited_users(&tags, &format!("@{}", nprofile));
        assert_eq!(users, HashSet::from([hex32(2)]));
    }

    #[test]
    fn test_identifier_matched_to_other_marker_not_a_user() {
        let npub = encode_npub(&[3u8; 32]).unwrap();
        let tags = vec![tag(&["e", &hex32(3)])];
        assert!(cited_users(&tags, &format!("nostr:{}", npub)).is_empty());
    }

    #[test]
    fn test_tag_marker_decides_citation_not_identifier_kind() {
        let npub = encode_npub(&[3u8; 32]).unwrap();
        let tags = vec![tag(&["e", &hex32(3)])];
        assert_eq!(
            find_citations(&tags, &format!("nostr:{}", npub)),
            HashSet::from([hex32(3)])
        );
    }

    #[test]
    fn test_nevent_and_naddr_citations() {
        let nevent = encode_nevent(&EventPointer {
            id: [4u8; 32],
            relays: vec![],
            author: None,
            kind: None,
        })
        .unwrap();
        let naddr = encode_naddr(&AddressPointer {
            identifier: "slug".to_string(),
            pubkey: [5u8; 32],
            kind: 30023,
            relays: vec![],
        })
        .unwrap();
        let address = format!("30023:{}:slug", hex32(5));
        let tags = vec![tag(&["e", &hex32(4)]), tag(&["a", &address])];

        let citations = find_citations(&tags, &format!("nostr:{} nostr:{}", nevent, naddr));
        assert_eq!(citations, HashSet::from([hex32(4), address]));
    }

    #[test]
    fn test_both_encodings_deduplicate() {
        let note = encode_note(&[6u8; 32]).unwrap();
        let tags = vec![tag(&["e", &hex32(6)])];
        let content = format!("#[0] nostr:{} {}", note, note);

        assert_eq!(find_citations(&tags, &content).len(), 1);
    }

    #[test]
    fn test_extract_references_positions() {
        let npub = encode_npub(&[7u8; 32]).unwrap();
        let uri = format!("nostr:{}", npub);
        let content = format!("Start {}. end", uri);

        let refs = extract_references(&content);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, 6);
        assert_eq!(refs[0].uri, format!("{}.", uri));
        assert_eq!(refs[0].trailing.as_deref(), Some("."));
        assert_eq!(&content[refs[0].start..refs[0].end], refs[0].uri);
    }

    #[test]
    fn test_extract_profile_and_event_references() {
        let npub = encode_npub(&[8u8; 32]).unwrap();
        let note = encode_note(&[9u8; 32]).unwrap();
        let content = format!("Profile nostr:{} and note nostr:{}", npub, note);

        let profiles = extract_profile_references(&content);
        assert_eq!(profiles.len(), 1);
        assert!(matches!(profiles[0].entity, Nip19Entity::Pubkey(_)));

        let events = extract_event_references(&content);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].entity, Nip19Entity::Note(_)));
    }

    #[test]
    fn test_has_references() {
        assert!(has_references("see nostr:npub1qqq"));
        assert!(!has_references("Just plain text #[0]"));
        assert!(!has_references(""));
    }
}
