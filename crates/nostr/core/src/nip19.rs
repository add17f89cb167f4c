//! NIP-19: bech32-encoded entities
//!
//! Portable identifiers that can be decoded without consulting any tag list:
//!
//! - `npub` – bare public key
//! - `note` – bare event id
//! - `nprofile` – public key plus relay hints (TLV)
//! - `nevent` – event id plus relay, author and kind hints (TLV)
//! - `naddr` – addressable event coordinate plus relay hints (TLV)
//!
//! `nsec` and `nrelay` are recognised as prefixes but never decode to a
//! reference.
//!
//! See: <https://github.com/nostr-protocol/nips/blob/master/19.md>

use bech32::{Bech32, Hrp};
use thiserror::Error;

use crate::nip33::create_address;

pub const NPUB_HRP: &str = "npub";
pub const NSEC_HRP: &str = "nsec";
pub const NOTE_HRP: &str = "note";
pub const NPROFILE_HRP: &str = "nprofile";
pub const NEVENT_HRP: &str = "nevent";
pub const NADDR_HRP: &str = "naddr";
pub const NRELAY_HRP: &str = "nrelay";

const TLV_SPECIAL: u8 = 0;
const TLV_RELAY: u8 = 1;
const TLV_AUTHOR: u8 = 2;
const TLV_KIND: u8 = 3;

/// Errors that can occur during NIP-19 operations.
#[derive(Debug, Error)]
pub enum Nip19Error {
    #[error("bech32 encoding error: {0}")]
    Bech32Encode(String),

    #[error("bech32 decoding error: {0}")]
    Bech32Decode(String),

    #[error("unsupported prefix: {0}")]
    UnsupportedPrefix(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("malformed TLV: {0}")]
    MalformedTlv(String),

    #[error("missing TLV field: {0}")]
    MissingField(&'static str),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Which kind of thing a decoded identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    User,
    Note,
    Address,
}

/// A public key with relay hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePointer {
    pub pubkey: [u8; 32],
    pub relays: Vec<String>,
}

/// An event id with optional relay, author and kind hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPointer {
    pub id: [u8; 32],
    pub relays: Vec<String>,
    pub author: Option<[u8; 32]>,
    pub kind: Option<u32>,
}

/// Coordinate of an addressable event with relay hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPointer {
    pub identifier: String,
    pub pubkey: [u8; 32],
    pub kind: u32,
    pub relays: Vec<String>,
}

/// A decoded NIP-19 entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nip19Entity {
    Pubkey([u8; 32]),
    Profile(ProfilePointer),
    Note([u8; 32]),
    Event(EventPointer),
    Address(AddressPointer),
}

impl Nip19Entity {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Nip19Entity::Pubkey(_) | Nip19Entity::Profile(_) => ReferenceKind::User,
            Nip19Entity::Note(_) | Nip19Entity::Event(_) => ReferenceKind::Note,
            Nip19Entity::Address(_) => ReferenceKind::Address,
        }
    }

    /// The identifier as it appears in tags: lowercase hex for users and
    /// notes, `<kind>:<pubkey>:<identifier>` for addresses.
    pub fn hex(&self) -> String {
        match self {
            Nip19Entity::Pubkey(pk) => hex::encode(pk),
            Nip19Entity::Profile(p) => hex::encode(p.pubkey),
            Nip19Entity::Note(id) => hex::encode(id),
            Nip19Entity::Event(e) => hex::encode(e.id),
            Nip19Entity::Address(a) => {
                create_address(a.kind, &hex::encode(a.pubkey), &a.identifier)
            }
        }
    }

    pub fn relays(&self) -> &[String] {
        match self {
            Nip19Entity::Pubkey(_) | Nip19Entity::Note(_) => &[],
            Nip19Entity::Profile(p) => &p.relays,
            Nip19Entity::Event(e) => &e.relays,
            Nip19Entity::Address(a) => &a.relays,
        }
    }

    /// Author hint carried by `nevent` and `naddr`.
    pub fn author(&self) -> Option<String> {
        match self {
            Nip19Entity::Event(e) => e.author.map(hex::encode),
            Nip19Entity::Address(a) => Some(hex::encode(a.pubkey)),
            _ => None,
        }
    }

    /// Kind hint carried by `nevent` and `naddr`.
    pub fn kind_hint(&self) -> Option<u32> {
        match self {
            Nip19Entity::Event(e) => e.kind,
            Nip19Entity::Address(a) => Some(a.kind),
            _ => None,
        }
    }
}

/// Decode any supported bech32 entity.
pub fn decode(encoded: &str) -> Result<Nip19Entity, Nip19Error> {
    let (hrp, data) =
        bech32::decode(encoded).map_err(|e| Nip19Error::Bech32Decode(e.to_string()))?;

    match hrp.to_lowercase().as_str() {
        NPUB_HRP => Ok(Nip19Entity::Pubkey(to_array(&data)?)),
        NOTE_HRP => Ok(Nip19Entity::Note(to_array(&data)?)),
        NPROFILE_HRP => decode_nprofile(&data).map(Nip19Entity::Profile),
        NEVENT_HRP => decode_nevent(&data).map(Nip19Entity::Event),
        NADDR_HRP => decode_naddr(&data).map(Nip19Entity::Address),
        other => Err(Nip19Error::UnsupportedPrefix(other.to_string())),
    }
}

pub fn encode_npub(pubkey: &[u8; 32]) -> Result<String, Nip19Error> {
    encode_bech32(NPUB_HRP, pubkey)
}

pub fn encode_note(id: &[u8; 32]) -> Result<String, Nip19Error> {
    encode_bech32(NOTE_HRP, id)
}

pub fn encode_nprofile(profile: &ProfilePointer) -> Result<String, Nip19Error> {
    let mut tlv = Vec::new();
    push_tlv(&mut tlv, TLV_SPECIAL, &profile.pubkey)?;
    for relay in &profile.relays {
        push_tlv(&mut tlv, TLV_RELAY, relay.as_bytes())?;
    }
    encode_bech32(NPROFILE_HRP, &tlv)
}

pub fn encode_nevent(event: &EventPointer) -> Result<String, Nip19Error> {
    let mut tlv = Vec::new();
    push_tlv(&mut tlv, TLV_SPECIAL, &event.id)?;
    for relay in &event.relays {
        push_tlv(&mut tlv, TLV_RELAY, relay.as_bytes())?;
    }
    if let Some(author) = &event.author {
        push_tlv(&mut tlv, TLV_AUTHOR, author)?;
    }
    if let Some(kind) = event.kind {
        push_tlv(&mut tlv, TLV_KIND, &kind.to_be_bytes())?;
    }
    encode_bech32(NEVENT_HRP, &tlv)
}

pub fn encode_naddr(address: &AddressPointer) -> Result<String, Nip19Error> {
    let mut tlv = Vec::new();
    push_tlv(&mut tlv, TLV_SPECIAL, address.identifier.as_bytes())?;
    for relay in &address.relays {
        push_tlv(&mut tlv, TLV_RELAY, relay.as_bytes())?;
    }
    push_tlv(&mut tlv, TLV_AUTHOR, &address.pubkey)?;
    push_tlv(&mut tlv, TLV_KIND, &address.kind.to_be_bytes())?;
    encode_bech32(NADDR_HRP, &tlv)
}

/// Decode a public key given either as 64-char hex or as an `npub`.
pub fn decode_public_key(key: &str) -> Result<[u8; 32], Nip19Error> {
    let is_npub = key
        .get(..NPUB_HRP.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(NPUB_HRP));
    if is_npub {
        return match decode(key)? {
            Nip19Entity::Pubkey(pk) => Ok(pk),
            _ => Err(Nip19Error::UnsupportedPrefix(key.to_string())),
        };
    }

    let bytes = hex::decode(key).map_err(|e| Nip19Error::InvalidHex(e.to_string()))?;
    to_array(&bytes)
}

/// Validate a public key and return it as lowercase hex.
pub fn public_key_hex(key: &str) -> Result<String, Nip19Error> {
    decode_public_key(key).map(hex::encode)
}

fn encode_bech32(hrp: &str, data: &[u8]) -> Result<String, Nip19Error> {
    let hrp = Hrp::parse(hrp).map_err(|e| Nip19Error::Bech32Encode(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| Nip19Error::Bech32Encode(e.to_string()))
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32], Nip19Error> {
    bytes
        .try_into()
        .map_err(|_| Nip19Error::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })
}

fn push_tlv(out: &mut Vec<u8>, tlv_type: u8, value: &[u8]) -> Result<(), Nip19Error> {
    let len = u8::try_from(value.len()).map_err(|_| {
        Nip19Error::MalformedTlv(format!("value of {} bytes is too long", value.len()))
    })?;
    out.push(tlv_type);
    out.push(len);
    out.extend_from_slice(value);
    Ok(())
}

/// Entries of a TLV byte stream, in order.
fn parse_tlv(data: &[u8]) -> Result<Vec<(u8, &[u8])>, Nip19Error> {
    let mut entries = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let [tlv_type, len, tail @ ..] = rest else {
            return Err(Nip19Error::MalformedTlv("truncated header".to_string()));
        };
        let len = *len as usize;
        if tail.len() < len {
            return Err(Nip19Error::MalformedTlv(format!(
                "type {} declares {} bytes, {} left",
                tlv_type,
                len,
                tail.len()
            )));
        }
        entries.push((*tlv_type, &tail[..len]));
        rest = &tail[len..];
    }

    Ok(entries)
}

fn relay_hint(value: &[u8]) -> Option<String> {
    String::from_utf8(value.to_vec()).ok()
}

fn decode_kind(value: &[u8]) -> Result<u32, Nip19Error> {
    let bytes: [u8; 4] = value.try_into().map_err(|_| Nip19Error::InvalidLength {
        expected: 4,
        got: value.len(),
    })?;
    Ok(u32::from_be_bytes(bytes))
}

fn decode_nprofile(data: &[u8]) -> Result<ProfilePointer, Nip19Error> {
    let mut pubkey = None;
    let mut relays = Vec::new();

    for (tlv_type, value) in parse_tlv(data)? {
        match tlv_type {
            TLV_SPECIAL if pubkey.is_none() => pubkey = Some(to_array(value)?),
            TLV_RELAY => relays.extend(relay_hint(value)),
            _ => {}
        }
    }

    Ok(ProfilePointer {
        pubkey: pubkey.ok_or(Nip19Error::MissingField("pubkey"))?,
        relays,
    })
}

fn decode_nevent(data: &[u8]) -> Result<EventPointer, Nip19Error> {
    let mut id = None;
    let mut relays = Vec::new();
    let mut author = None;
    let mut kind = None;

    for (tlv_type, value) in parse_tlv(data)? {
        match tlv_type {
            TLV_SPECIAL if id.is_none() => id = Some(to_array(value)?),
            TLV_RELAY => relays.extend(relay_hint(value)),
            TLV_AUTHOR if author.is_none() => author = Some(to_array(value)?),
            TLV_KIND if kind.is_none() => kind = Some(decode_kind(value)?),
            _ => {}
        }
    }

    Ok(EventPointer {
        id: id.ok_or(Nip19Error::MissingField("id"))?,
        relays,
        author,
        kind,
    })
}

fn decode_naddr(data: &[u8]) -> Result<AddressPointer, Nip19Error> {
    let mut identifier = None;
    let mut relays = Vec::new();
    let mut pubkey = None;
    let mut kind = None;

    for (tlv_type, value) in parse_tlv(data)? {
        match tlv_type {
            TLV_SPECIAL if identifier.is_none() => {
                identifier = Some(String::from_utf8(value.to_vec()).map_err(|e| {
                    Nip19Error::MalformedTlv(format!("identifier is not utf-8: {}", e))
                })?)
            }
            TLV_RELAY => relays.extend(relay_hint(value)),
            TLV_AUTHOR if pubkey.is_none() => pubkey = Some(to_array(value)?),
            TLV_KIND if kind.is_none() => kind = Some(decode_kind(value)?),
            _ => {}
        }
    }

    Ok(AddressPointer {
        identifier: identifier.ok_or(Nip19Error::MissingField("identifier"))?,
        pubkey: pubkey.ok_or(Nip19Error::MissingField("author"))?,
        kind: kind.ok_or(Nip19Error::MissingField("kind"))?,
        relays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // From the NIP-19 document
    const NPUB_EXAMPLE: &str = "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg";
    const NPUB_EXAMPLE_HEX: &str =
        "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";

    #[test]
    fn test_decode_npub_example() {
        let entity = decode(NPUB_EXAMPLE).unwrap();
        assert_eq!(entity.kind(), ReferenceKind::User);
        assert_eq!(entity.hex(), NPUB_EXAMPLE_HEX);
        assert!(entity.relays().is_empty());
    }

    #[test]
    fn test_uppercase_npub_decodes() {
        let entity = decode(&NPUB_EXAMPLE.to_uppercase()).unwrap();
        assert_eq!(entity.hex(), NPUB_EXAMPLE_HEX);
    }

    #[test]
    fn test_note_roundtrip() {
        let id = [7u8; 32];
        let encoded = encode_note(&id).unwrap();
        assert!(encoded.starts_with("note1"));
        assert_eq!(decode(&encoded).unwrap(), Nip19Entity::Note(id));
    }

    #[test]
    fn test_nprofile_keeps_relays() {
        let profile = ProfilePointer {
            pubkey: [1u8; 32],
            relays: vec!["wss://r.x.com".to_string(), "wss://djbas.sadkb.com".to_string()],
        };
        let entity = decode(&encode_nprofile(&profile).unwrap()).unwrap();

        assert_eq!(entity.kind(), ReferenceKind::User);
        assert_eq!(entity.relays(), profile.relays.as_slice());
        assert_eq!(entity, Nip19Entity::Profile(profile));
    }

    #[test]
    fn test_nevent_hints() {
        let pointer = EventPointer {
            id: [2u8; 32],
            relays: vec!["wss://relay.damus.io".to_string()],
            author: Some([3u8; 32]),
            kind: Some(1),
        };
        let entity = decode(&encode_nevent(&pointer).unwrap()).unwrap();

        assert_eq!(entity.kind(), ReferenceKind::Note);
        assert_eq!(entity.hex(), hex::encode([2u8; 32]));
        assert_eq!(entity.author(), Some(hex::encode([3u8; 32])));
        assert_eq!(entity.kind_hint(), Some(1));
    }

    #[test]
    fn test_naddr_renders_coordinate() {
        let pointer = AddressPointer {
            identifier: "my-article".to_string(),
            pubkey: [4u8; 32],
            kind: 30023,
            relays: vec![],
        };
        let entity = decode(&encode_naddr(&pointer).unwrap()).unwrap();

        assert_eq!(entity.kind(), ReferenceKind::Address);
        assert_eq!(
            entity.hex(),
            format!("30023:{}:my-article", hex::encode([4u8; 32]))
        );
    }

    #[test]
    fn test_nsec_is_not_a_reference() {
        let encoded = encode_bech32(NSEC_HRP, &[5u8; 32]).unwrap();
        assert!(matches!(
            decode(&encoded),
            Err(Nip19Error::UnsupportedPrefix(_))
        ));
    }

    #[test]
    fn test_wrong_length_payload() {
        let encoded = encode_bech32(NPUB_HRP, &[5u8; 20]).unwrap();
        assert!(matches!(
            decode(&encoded),
            Err(Nip19Error::InvalidLength { expected: 32, got: 20 })
        ));
    }

    #[test]
    fn test_truncated_tlv() {
        let encoded = encode_bech32(NPROFILE_HRP, &[0, 32, 1, 2, 3]).unwrap();
        assert!(matches!(decode(&encoded), Err(Nip19Error::MalformedTlv(_))));
    }

    #[test]
    fn test_naddr_missing_kind() {
        let mut tlv = Vec::new();
        push_tlv(&mut tlv, TLV_SPECIAL, b"slug").unwrap();
        push_tlv(&mut tlv, TLV_AUTHOR, &[1u8; 32]).unwrap();
        let encoded = encode_bech32(NADDR_HRP, &tlv).unwrap();

        assert!(matches!(
            decode(&encoded),
            Err(Nip19Error::MissingField("kind"))
        ));
    }

    #[test]
    fn test_bad_checksum() {
        let mut broken = NPUB_EXAMPLE.to_string();
        broken.pop();
        broken.push('q');
        assert!(matches!(decode(&broken), Err(Nip19Error::Bech32Decode(_))));
    }

    #[test]
    fn test_decode_public_key_accepts_hex_and_npub() {
        assert_eq!(public_key_hex(NPUB_EXAMPLE).unwrap(), NPUB_EXAMPLE_HEX);
        assert_eq!(
            public_key_hex(&NPUB_EXAMPLE_HEX.to_uppercase()).unwrap(),
            NPUB_EXAMPLE_HEX
        );
    }

    #[test]
    fn test_decode_public_key_rejects_garbage() {
        assert!(decode_public_key("not-a-key").is_err());
        assert!(decode_public_key("abcd").is_err());
        assert!(decode_public_key(&encode_note(&[1u8; 32]).unwrap()).is_err());
    }
}
