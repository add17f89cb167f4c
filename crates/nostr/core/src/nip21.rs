//! NIP-21: `nostr:` URI scheme
//!
//! Portable identifiers show up in content either as URIs (`nostr:npub1…`),
//! as handles (`@npub1…`) or bare (`npub1…`). The [`identifiers`] scanner
//! finds all three forms; anything glued to the end of the bech32 body up to
//! the next whitespace is kept as trailing text so renderers can put it back.
//!
//! See: <https://github.com/nostr-protocol/nips/blob/master/21.md>

use thiserror::Error;

use crate::nip08::is_space;
use crate::nip19::{self, Nip19Entity, Nip19Error};

/// The URI scheme prefix, including the colon.
pub const NOSTR_URI_SCHEME: &str = "nostr:";

/// Identifier prefixes recognised in content, in match order.
const PREFIXES: [&str; 7] = [
    "nsec1",
    "npub1",
    "nevent1",
    "naddr1",
    "note1",
    "nprofile1",
    "nrelay1",
];

const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Errors that can occur during NIP-21 operations.
#[derive(Debug, Error)]
pub enum Nip21Error {
    #[error("missing nostr: scheme")]
    MissingScheme,

    #[error(transparent)]
    Nip19(#[from] Nip19Error),
}

pub fn is_nostr_uri(s: &str) -> bool {
    has_prefix_ci(s, NOSTR_URI_SCHEME)
}

/// Strip the scheme, if present.
pub fn strip_nostr_prefix(s: &str) -> &str {
    if is_nostr_uri(s) {
        &s[NOSTR_URI_SCHEME.len()..]
    } else {
        s
    }
}

pub fn to_nostr_uri(bech32: &str) -> String {
    format!("{}{}", NOSTR_URI_SCHEME, bech32)
}

/// Decode a full `nostr:` URI.
pub fn from_nostr_uri(uri: &str) -> Result<Nip19Entity, Nip21Error> {
    if !is_nostr_uri(uri) {
        return Err(Nip21Error::MissingScheme);
    }
    Ok(nip19::decode(strip_nostr_prefix(uri))?)
}

/// A portable identifier token found in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierToken<'a> {
    /// `nostr:` in whatever case it was written, if present
    pub uri_scheme: Option<&'a str>,
    /// `npub1`, `note1`, … as written
    pub type_prefix: &'a str,
    /// bech32 data part following the prefix
    pub body: &'a str,
    /// Non-whitespace text glued to the end of the body
    pub trailing: &'a str,
    /// Byte offset of the token (including scheme and `@`)
    pub start: usize,
    /// Byte offset just past the trailing text
    pub end: usize,
}

impl<'a> IdentifierToken<'a> {
    /// Token text from scheme to end of trailing text.
    pub fn as_str<'c>(&self, content: &'c str) -> &'c str {
        &content[self.start..self.end]
    }

    /// Decode this token; `None` when it doesn't decode to a reference.
    pub fn parse(&self) -> Option<ParsedReference> {
        parse_components(
            self.uri_scheme,
            self.type_prefix,
            self.body,
            Some(self.trailing).filter(|t| !t.is_empty()),
        )
    }
}

/// A successfully decoded in-text reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub entity: Nip19Entity,
    pub uri_scheme: Option<String>,
    pub trailing: Option<String>,
}

impl ParsedReference {
    /// Identifier as it would appear in element 1 of a tag.
    pub fn hex(&self) -> String {
        self.entity.hex()
    }
}

/// Decode the pieces of an identifier token.
///
/// Never fails loudly: undecodable bodies, `nsec` and `nrelay` yield `None`.
pub fn parse_components(
    uri_scheme: Option<&str>,
    type_prefix: &str,
    body: &str,
    trailing: Option<&str>,
) -> Option<ParsedReference> {
    let encoded = format!("{}{}", type_prefix, body);
    match nip19::decode(&encoded) {
        Ok(entity) => Some(ParsedReference {
            entity,
            uri_scheme: uri_scheme.map(str::to_string),
            trailing: trailing.map(str::to_string),
        }),
        Err(e) => {
            tracing::debug!("Skipping undecodable identifier {}: {}", encoded, e);
            None
        }
    }
}

/// Lazy scanner over the portable identifiers in `content`.
///
/// Clone the iterator to restart from the same position.
#[derive(Debug, Clone)]
pub struct Identifiers<'a> {
    content: &'a str,
    pos: usize,
}

/// Scan `content` for `nostr:`/`@`/bare bech32 identifiers.
pub fn identifiers(content: &str) -> Identifiers<'_> {
    Identifiers { content, pos: 0 }
}

impl<'a> Iterator for Identifiers<'a> {
    type Item = IdentifierToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.content.len() {
            let start = self.pos;
            if let Some(token) = match_at(self.content, start) {
                self.pos = token.end;
                return Some(token);
            }
            self.pos += self.content[start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
        }
        None
    }
}

fn has_prefix_ci(s: &str, prefix: &str) -> bool {
    s.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn is_bech32_char(b: u8) -> bool {
    BECH32_CHARSET.contains(&b.to_ascii_lowercase())
}

/// Try every optional-part combination at `start`, longest first.
fn match_at(content: &str, start: usize) -> Option<IdentifierToken<'_>> {
    let rest = &content[start..];
    let scheme_len = if is_nostr_uri(rest) {
        NOSTR_URI_SCHEME.len()
    } else {
        0
    };

    for scheme in [scheme_len, 0] {
        let after_scheme = start + scheme;
        let at_len = usize::from(content[after_scheme..].starts_with('@'));
        for at in [at_len, 0] {
            if let Some(token) = match_body(content, start, scheme, after_scheme + at) {
                return Some(token);
            }
            if at_len == 0 {
                break;
            }
        }
        if scheme_len == 0 {
            break;
        }
    }
    None
}

fn match_body(
    content: &str,
    start: usize,
    scheme_len: usize,
    prefix_start: usize,
) -> Option<IdentifierToken<'_>> {
    let rest = &content[prefix_start..];
    let prefix = PREFIXES.iter().find(|p| has_prefix_ci(rest, p))?;

    let body_start = prefix_start + prefix.len();
    let bytes = content.as_bytes();
    let body_len = bytes[body_start..]
        .iter()
        .take_while(|&&b| is_bech32_char(b))
        .count();
    if body_len == 0 {
        return None;
    }
    let body_end = body_start + body_len;

    let trailing_len = bytes[body_end..]
        .iter()
        .position(|&b| is_space(b))
        .unwrap_or(content.len() - body_end);
    let end = body_end + trailing_len;

    Some(IdentifierToken {
        uri_scheme: (scheme_len > 0).then(|| &content[start..start + scheme_len]),
        type_prefix: &content[prefix_start..body_start],
        body: &content[body_start..body_end],
        trailing: &content[body_end..end],
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nip19::{ReferenceKind, encode_note, encode_npub};

    #[test]
    fn test_uri_helpers() {
        assert!(is_nostr_uri("nostr:npub1xyz"));
        assert!(is_nostr_uri("NOSTR:npub1xyz"));
        assert!(!is_nostr_uri("npub1xyz"));
        assert_eq!(strip_nostr_prefix("nostr:note1abc"), "note1abc");
        assert_eq!(strip_nostr_prefix("note1abc"), "note1abc");
        assert_eq!(to_nostr_uri("npub1abc"), "nostr:npub1abc");
    }

    #[test]
    fn test_from_nostr_uri() {
        let npub = encode_npub(&[1u8; 32]).unwrap();
        let entity = from_nostr_uri(&to_nostr_uri(&npub)).unwrap();
        assert_eq!(entity, Nip19Entity::Pubkey([1u8; 32]));
        assert!(matches!(
            from_nostr_uri(&npub),
            Err(Nip21Error::MissingScheme)
        ));
    }

    #[test]
    fn test_scan_all_forms() {
        let npub = encode_npub(&[2u8; 32]).unwrap();
        let content = format!("a nostr:{} b @{} c {}", npub, npub, npub);

        let tokens: Vec<_> = identifiers(&content).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].uri_scheme, Some("nostr:"));
        assert_eq!(tokens[1].uri_scheme, None);
        assert_eq!(tokens[1].as_str(&content), format!("@{}", npub));
        assert_eq!(tokens[2].as_str(&content), npub);
        assert!(tokens.iter().all(|t| t.type_prefix == "npub1"));
    }

    #[test]
    fn test_trailing_stops_only_at_ascii_whitespace() {
        let npub = encode_npub(&[3u8; 32]).unwrap();
        let content = format!("nostr:{}!\u{a0}wow\tnext", npub);

        let token = identifiers(&content).next().unwrap();
        assert_eq!(token.trailing, "!\u{a0}wow");
        assert_eq!(&content[token.end..], "\tnext");
    }

    #[test]
    fn test_scheme_and_handle_together() {
        let note = encode_note(&[3u8; 32]).unwrap();
        let content = format!("nostr:@{}", note);

        let token = identifiers(&content).next().unwrap();
        assert_eq!(token.start, 0);
        assert_eq!(token.uri_scheme, Some("nostr:"));
        assert_eq!(token.type_prefix, "note1");
    }

    #[test]
    fn test_trailing_punctuation_is_kept_apart() {
        let npub = encode_npub(&[4u8; 32]).unwrap();
        let content = format!("hi {}, how are you", npub);

        let token = identifiers(&content).next().unwrap();
        assert_eq!(token.trailing, ",");
        let parsed = token.parse().unwrap();
        assert_eq!(parsed.trailing.as_deref(), Some(","));
        assert_eq!(parsed.hex(), hex::encode([4u8; 32]));
    }

    #[test]
    fn test_undecodable_token_yields_none() {
        let content = "see npub1qqqqqqqq and note1xyz";
        let tokens: Vec<_> = identifiers(content).collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.parse().is_none()));
    }

    #[test]
    fn test_prefix_without_body_is_skipped() {
        assert_eq!(identifiers("npub1 note1! nostr:").count(), 0);
    }

    #[test]
    fn test_case_insensitive_prefix() {
        let npub = encode_npub(&[5u8; 32]).unwrap().to_uppercase();
        let content = format!("NOSTR:{}", npub);

        let token = identifiers(&content).next().unwrap();
        assert_eq!(token.uri_scheme, Some("NOSTR:"));
        let parsed = token.parse().unwrap();
        assert_eq!(parsed.entity.kind(), ReferenceKind::User);
    }

    #[test]
    fn test_parse_components_rejects_nsec() {
        assert!(parse_components(None, "nsec1", "qqqq", None).is_none());
    }

    #[test]
    fn test_multibyte_content_does_not_panic() {
        let npub = encode_npub(&[6u8; 32]).unwrap();
        let content = format!("ñ🌍é{}ü", npub);
        let tokens: Vec<_> = identifiers(&content).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].trailing, "ü");
    }
}
