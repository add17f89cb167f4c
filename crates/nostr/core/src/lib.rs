//! Nostr cross-reference resolution for OpenAgents.
//!
//! This crate provides:
//! - NIP-01: Basic protocol (events, signing, verification)
//! - NIP-02: Follow List (contact list decoding and creation)
//! - NIP-08: Positional `#[n]` mentions
//! - NIP-10: Text notes (mentions, reply targets, reply-vs-citation split)
//! - NIP-19: bech32-encoded entities
//! - NIP-21: nostr: URI scheme and in-text identifier scanning
//! - NIP-27: Text Note References (citation resolution)
//! - NIP-33: Addressable event coordinates
//!
//! # Features
//!
//! - `full` (default): Key handling and signing, needed to create contact lists
//! - `minimal`: Just the event model, codecs and resolvers

pub mod nip01;
pub mod nip02;
pub mod nip08;
pub mod nip10;
pub mod nip19;
pub mod nip21;
pub mod nip27;
pub mod nip33;
pub mod tags;


// NIP-01: Basic protocol (Event type always available)
pub use nip01::{
    Event, EventTemplate, KIND_CONTACTS, KIND_SHORT_TEXT_NOTE, Nip01Error, UnsignedEvent,
    serialize_event, validate_event, validate_unsigned_event,
};

// NIP-01: Crypto functions (require full feature)
#[cfg(feature = "full")]
pub use nip01::{
    finalize_event, generate_secret_key, get_event_hash, get_public_key, get_public_key_hex,
    verify_event,
};

// NIP-02: Follow List
pub use nip02::{
    CONTACT_LIST_KIND, Contact, ContactListEvent, Nip02Error, ReadWrite, RelayPreferences,
};

// NIP-08: Positional mentions
pub use nip08::{Backreference, Backreferences, backreferences};

// NIP-10: Text notes
pub use nip10::{TEXT_NOTE_KIND, TextNote};

// NIP-19: bech32-encoded entities
pub use nip19::{
    AddressPointer, EventPointer, Nip19Entity, Nip19Error, ProfilePointer, ReferenceKind,
    decode, decode_public_key, encode_naddr, encode_nevent, encode_note, encode_nprofile,
    encode_npub, public_key_hex,
};

// NIP-21: nostr: URI scheme
pub use nip21::{
    IdentifierToken, Identifiers, NOSTR_URI_SCHEME, Nip21Error, ParsedReference, from_nostr_uri,
    identifiers, is_nostr_uri, parse_components, strip_nostr_prefix, to_nostr_uri,
};

// NIP-27: Text Note References
pub use nip27::{
    MentionReference, cited_users, extract_event_references, extract_profile_references,
    extract_references, find_citations, has_references,
};

// NIP-33: Addressable event coordinates
pub use nip33::{Coordinate, Nip33Error, create_address, parse_address};

// Tag lookups
pub use tags::TagIndex;
