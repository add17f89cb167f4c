//! NIP-01: Basic protocol flow description.
//!
//! The signed event record every other module reads from:
//! - Event structure (id, pubkey, created_at, kind, tags, content, sig)
//! - Canonical serialization for hashing
//! - Event signing with Schnorr signatures (requires `full` feature)
//! - Event verification (requires `full` feature)
//!
//! Tag order is significant: in-text backreferences such as `#[2]` address
//! tags by position, so nothing in this crate reorders `tags`.

#[cfg(feature = "full")]
use bitcoin::hashes::{Hash, sha256};
#[cfg(feature = "full")]
use bitcoin::key::Secp256k1;
#[cfg(feature = "full")]
use bitcoin::secp256k1::{Message, SecretKey, XOnlyPublicKey, schnorr};
#[cfg(feature = "full")]
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tags::TagIndex;

/// Errors that can occur during NIP-01 operations.
#[derive(Debug, Error)]
pub enum Nip01Error {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("verification error: {0}")]
    Verification(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// A signed Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    pub id: String,
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind (integer between 0 and 65535)
    pub kind: u16,
    /// Ordered tag entries; positions are addressable from the content
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
    /// 64-bytes lowercase hex signature
    pub sig: String,
}

impl Event {
    /// Read-only view over this event's tags.
    pub fn tag_index(&self) -> TagIndex<'_> {
        TagIndex::new(&self.tags)
    }

    /// The signed portion of the event, as hashed into `id`.
    pub fn unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: self.pubkey.clone(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }
}

/// An unsigned event (before signing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
}

/// A template for creating events (without pubkey, which comes from the signing key).
///
/// ```
/// use nostr_refs::EventTemplate;
///
/// let template = EventTemplate {
///     created_at: 1_700_000_000,
///     kind: 1,
///     tags: vec![
///         vec!["e".to_string(), "event_id_to_reply_to".to_string()],
///         vec!["p".to_string(), "pubkey_to_mention".to_string()],
///     ],
///     content: "replying to #[0], hi #[1]".to_string(),
/// };
/// assert_eq!(template.tags.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
}

// Standard event kinds
pub const KIND_SHORT_TEXT_NOTE: u16 = 1;
pub const KIND_CONTACTS: u16 = 3;

/// Check that a string is 64 lowercase hex characters.
pub(crate) fn is_hex_key(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// Generate a random 32-byte secret key.
#[cfg(feature = "full")]
pub fn generate_secret_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Get the public key (x-only, 32 bytes) from a secret key.
#[cfg(feature = "full")]
pub fn get_public_key(secret_key: &[u8; 32]) -> Result<[u8; 32], Nip01Error> {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(secret_key)
        .map_err(|e| Nip01Error::InvalidPublicKey(e.to_string()))?;
    let (xonly, _parity) = sk.x_only_public_key(&secp);
    Ok(xonly.serialize())
}

/// Get the public key as a hex string from a secret key.
#[cfg(feature = "full")]
pub fn get_public_key_hex(secret_key: &[u8; 32]) -> Result<String, Nip01Error> {
    Ok(hex::encode(get_public_key(secret_key)?))
}

/// Serialize an unsigned event for hashing.
///
/// Format: `[0, pubkey, created_at, kind, tags, content]`
pub fn serialize_event(event: &UnsignedEvent) -> Result<String, Nip01Error> {
    if !validate_unsigned_event(event) {
        return Err(Nip01Error::InvalidEvent(
            "can't serialize event with wrong or missing properties".to_string(),
        ));
    }

    serde_json::to_string(&(
        0,
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    ))
    .map_err(|e| Nip01Error::Serialization(e.to_string()))
}

/// Get the event hash (id) from an unsigned event.
#[cfg(feature = "full")]
pub fn get_event_hash(event: &UnsignedEvent) -> Result<String, Nip01Error> {
    let serialized = serialize_event(event)?;
    let hash = sha256::Hash::hash(serialized.as_bytes());
    Ok(hex::encode(hash.as_byte_array()))
}

/// Validate an unsigned event structure.
pub fn validate_unsigned_event(event: &UnsignedEvent) -> bool {
    is_hex_key(&event.pubkey)
}

/// Validate a signed event structure (not including signature verification).
pub fn validate_event(event: &Event) -> bool {
    if event.id.len() != 64 || !event.id.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if !is_hex_key(&event.pubkey) {
        return false;
    }
    event.sig.len() == 128 && event.sig.chars().all(|c| c.is_ascii_hexdigit())
}

/// Sign an event template with a secret key, producing a complete signed event.
///
/// Signing uses no auxiliary randomness, so identical templates and keys
/// always produce byte-identical events.
#[cfg(feature = "full")]
pub fn finalize_event(
    template: &EventTemplate,
    secret_key: &[u8; 32],
) -> Result<Event, Nip01Error> {
    let secp = Secp256k1::new();

    let sk = SecretKey::from_slice(secret_key).map_err(|e| Nip01Error::Signing(e.to_string()))?;
    let (xonly_pk, _parity) = sk.x_only_public_key(&secp);
    let pubkey = hex::encode(xonly_pk.serialize());

    let unsigned = UnsignedEvent {
        pubkey: pubkey.clone(),
        created_at: template.created_at,
        kind: template.kind,
        tags: template.tags.clone(),
        content: template.content.clone(),
    };

    let id = get_event_hash(&unsigned)?;

    let id_bytes =
        hex::decode(&id).map_err(|e| Nip01Error::Signing(format!("invalid id hex: {}", e)))?;
    let message = Message::from_digest_slice(&id_bytes)
        .map_err(|e| Nip01Error::Signing(format!("invalid message: {}", e)))?;

    let keypair = bitcoin::secp256k1::Keypair::from_secret_key(&secp, &sk);
    let sig = secp.sign_schnorr_no_aux_rand(&message, &keypair);

    Ok(Event {
        id,
        pubkey,
        created_at: unsigned.created_at,
        kind: unsigned.kind,
        tags: unsigned.tags,
        content: unsigned.content,
        sig: hex::encode(sig.serialize()),
    })
}

/// Verify an event's signature and id.
#[cfg(feature = "full")]
pub fn verify_event(event: &Event) -> Result<bool, Nip01Error> {
    if !validate_event(event) {
        return Ok(false);
    }

    let computed_id = get_event_hash(&event.unsigned())?;
    if computed_id != event.id {
        return Ok(false);
    }

    let secp = Secp256k1::verification_only();

    let id_bytes = hex::decode(&event.id)
        .map_err(|e| Nip01Error::Verification(format!("invalid id hex: {}", e)))?;
    let message = Message::from_digest_slice(&id_bytes)
        .map_err(|e| Nip01Error::Verification(format!("invalid message: {}", e)))?;

    let sig_bytes = hex::decode(&event.sig)
        .map_err(|e| Nip01Error::Verification(format!("invalid sig hex: {}", e)))?;
    let sig = schnorr::Signature::from_slice(&sig_bytes)
        .map_err(|e| Nip01Error::Verification(format!("invalid signature: {}", e)))?;

    let pubkey_bytes = hex::decode(&event.pubkey)
        .map_err(|e| Nip01Error::Verification(format!("invalid pubkey hex: {}", e)))?;
    let pubkey = XOnlyPublicKey::from_slice(&pubkey_bytes)
        .map_err(|e| Nip01Error::Verification(format!("invalid pubkey: {}", e)))?;

    Ok(secp.verify_schnorr(&sig, &message, &pubkey).is_ok())
}
