//! Contact records
//!
//! One per known person: their account identifiers, profile and system names,
//! and per-conversation flags such as blocked or archived.
//!
//! # Example
//!
//! ```
//! use accountsync_core::records::ContactRecordBuilder;
//!
//! let contact = ContactRecordBuilder::new(vec![7u8; 16])
//!     .with_e164(Some("+15551234567"))
//!     .with_blocked(true)
//!     .build();
//!
//! assert_eq!(contact.e164(), Some("+15551234567"));
//! assert!(contact.is_blocked());
//! ```

use prost::Message;
use tracing::debug;

use crate::error::SyncResult;
use crate::proto::{self, contact_record, unknown_fields::reencode_nested, IdentityState};
use crate::records::diff::FieldDiff;
use crate::records::{non_empty_bytes, non_empty_string, utf8};
use crate::types::{is_valid_e164, Aci, Pni, StorageId};

/// A contact, as synced through the storage service.
///
/// Optional fields are validated when the record is constructed. A malformed
/// ACI, PNI, phone number or name (including text that isn't UTF-8) is
/// reported as absent; it never makes the record itself invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    id: StorageId,
    proto: proto::ContactRecord,
    unknown_fields: Option<Vec<u8>>,
    aci: Option<Aci>,
    pni: Option<Pni>,
    e164: Option<String>,
    profile_key: Option<Vec<u8>>,
    identity_key: Option<Vec<u8>>,
    given_name: Option<String>,
    family_name: Option<String>,
    system_given_name: Option<String>,
    system_family_name: Option<String>,
    system_nickname: Option<String>,
    username: Option<String>,
    nickname_given_name: Option<String>,
    nickname_family_name: Option<String>,
    note: Option<String>,
}

impl ContactRecord {
    /// Construct from a decoded payload, validating every optional field
    pub fn from_proto(
        raw_id: impl Into<Vec<u8>>,
        proto: proto::ContactRecord,
        unknown_fields: Option<Vec<u8>>,
    ) -> Self {
        let id = StorageId::for_contact(raw_id);

        let aci = utf8(&proto.aci).and_then(Aci::parse_or_none);
        if aci.is_none() && !proto.aci.is_empty() {
            debug!(%id, "Contact ACI is malformed, treating as absent");
        }
        let pni = utf8(&proto.pni).and_then(Pni::parse_or_none);
        if pni.is_none() && !proto.pni.is_empty() {
            debug!(%id, "Contact PNI is malformed, treating as absent");
        }
        let e164 = utf8(&proto.e164)
            .filter(|e| is_valid_e164(e))
            .map(str::to_string);
        if e164.is_none() && !proto.e164.is_empty() {
            debug!(%id, "Contact E164 is malformed, treating as absent");
        }

        let nickname = proto.nickname.as_deref().and_then(|bytes| {
            contact_record::Name::decode(bytes)
                .map_err(|err| debug!(%id, %err, "Contact nickname is malformed, treating as absent"))
                .ok()
        });
        let (nickname_given_name, nickname_family_name) = match &nickname {
            Some(name) => (non_empty_string(&name.given), non_empty_string(&name.family)),
            None => (None, None),
        };

        Self {
            aci,
            pni,
            e164,
            profile_key: non_empty_bytes(&proto.profile_key),
            identity_key: non_empty_bytes(&proto.identity_key),
            given_name: non_empty_string(&proto.given_name),
            family_name: non_empty_string(&proto.family_name),
            system_given_name: non_empty_string(&proto.system_given_name),
            system_family_name: non_empty_string(&proto.system_family_name),
            system_nickname: non_empty_string(&proto.system_nickname),
            username: non_empty_string(&proto.username),
            nickname_given_name,
            nickname_family_name,
            note: non_empty_string(&proto.note),
            id,
            proto,
            unknown_fields,
        }
    }

    /// Decode a plaintext record payload
    pub fn decode_payload(raw_id: impl Into<Vec<u8>>, payload: &[u8]) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(payload)?;
        Ok(Self::from_proto(raw_id, proto, unknown_fields))
    }

    /// Encode the payload, unknown fields included
    pub fn encode_payload(&self) -> Vec<u8> {
        proto::encode_with_unknown(&self.proto, self.unknown_fields.as_deref())
    }

    /// Same record under a different raw key
    pub fn with_raw_id(&self, raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            id: self.id.with_new_bytes(raw_id),
            ..self.clone()
        }
    }

    /// Builder seeded with this record's fields and unknown fields
    pub fn to_builder(&self) -> ContactRecordBuilder {
        ContactRecordBuilder {
            raw_id: self.id.raw().to_vec(),
            proto: self.proto.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }

    pub fn proto(&self) -> &proto::ContactRecord {
        &self.proto
    }

    pub fn has_unknown_fields(&self) -> bool {
        self.unknown_fields.is_some()
    }

    pub fn unknown_fields(&self) -> Option<&[u8]> {
        self.unknown_fields.as_deref()
    }

    pub fn aci(&self) -> Option<Aci> {
        self.aci
    }

    pub fn pni(&self) -> Option<Pni> {
        self.pni
    }

    pub fn e164(&self) -> Option<&str> {
        self.e164.as_deref()
    }

    pub fn profile_key(&self) -> Option<&[u8]> {
        self.profile_key.as_deref()
    }

    pub fn identity_key(&self) -> Option<&[u8]> {
        self.identity_key.as_deref()
    }

    /// Unrecognized states read as [`IdentityState::Default`]
    pub fn identity_state(&self) -> IdentityState {
        self.proto.identity_state()
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    pub fn system_given_name(&self) -> Option<&str> {
        self.system_given_name.as_deref()
    }

    pub fn system_family_name(&self) -> Option<&str> {
        self.system_family_name.as_deref()
    }

    pub fn system_nickname(&self) -> Option<&str> {
        self.system_nickname.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn nickname_given_name(&self) -> Option<&str> {
        self.nickname_given_name.as_deref()
    }

    pub fn nickname_family_name(&self) -> Option<&str> {
        self.nickname_family_name.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_blocked(&self) -> bool {
        self.proto.blocked
    }

    pub fn is_profile_sharing_enabled(&self) -> bool {
        self.proto.whitelisted
    }

    pub fn is_archived(&self) -> bool {
        self.proto.archived
    }

    pub fn is_forced_unread(&self) -> bool {
        self.proto.marked_unread
    }

    pub fn muted_until(&self) -> u64 {
        self.proto.muted_until_timestamp
    }

    pub fn should_hide_story(&self) -> bool {
        self.proto.hide_story
    }

    pub fn unregistered_timestamp(&self) -> u64 {
        self.proto.unregistered_at_timestamp
    }

    pub fn is_hidden(&self) -> bool {
        self.proto.hidden
    }

    pub fn is_pni_signature_verified(&self) -> bool {
        self.proto.pni_signature_verified
    }

    /// Names of the fields that differ from `other`, in declaration order
    pub fn describe_diff(&self, other: &ContactRecord) -> Vec<&'static str> {
        FieldDiff::new()
            .field("id", &self.id, &other.id)
            .field("aci", &self.aci, &other.aci)
            .field("pni", &self.pni, &other.pni)
            .field("e164", &self.e164, &other.e164)
            .field("profile_key", &self.profile_key, &other.profile_key)
            .field("identity_key", &self.identity_key, &other.identity_key)
            .field("identity_state", &self.identity_state(), &other.identity_state())
            .field("given_name", &self.given_name, &other.given_name)
            .field("family_name", &self.family_name, &other.family_name)
            .field("system_given_name", &self.system_given_name, &other.system_given_name)
            .field("system_family_name", &self.system_family_name, &other.system_family_name)
            .field("system_nickname", &self.system_nickname, &other.system_nickname)
            .field("username", &self.username, &other.username)
            .field("blocked", &self.is_blocked(), &other.is_blocked())
            .field(
                "profile_sharing",
                &self.is_profile_sharing_enabled(),
                &other.is_profile_sharing_enabled(),
            )
            .field("archived", &self.is_archived(), &other.is_archived())
            .field("forced_unread", &self.is_forced_unread(), &other.is_forced_unread())
            .field("muted_until", &self.muted_until(), &other.muted_until())
            .field("hide_story", &self.should_hide_story(), &other.should_hide_story())
            .field(
                "unregistered_timestamp",
                &self.unregistered_timestamp(),
                &other.unregistered_timestamp(),
            )
            .field("hidden", &self.is_hidden(), &other.is_hidden())
            .field(
                "pni_signature_verified",
                &self.is_pni_signature_verified(),
                &other.is_pni_signature_verified(),
            )
            .field("nickname_given_name", &self.nickname_given_name, &other.nickname_given_name)
            .field(
                "nickname_family_name",
                &self.nickname_family_name,
                &other.nickname_family_name,
            )
            .field("note", &self.note, &other.note)
            .field("unknown_fields", &self.unknown_fields, &other.unknown_fields)
            .finish()
    }
}

/// Mutable builder for [`ContactRecord`]
#[derive(Debug, Clone)]
pub struct ContactRecordBuilder {
    raw_id: Vec<u8>,
    proto: proto::ContactRecord,
    unknown_fields: Option<Vec<u8>>,
}

impl ContactRecordBuilder {
    pub fn new(raw_id: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_id: raw_id.into(),
            proto: proto::ContactRecord::default(),
            unknown_fields: None,
        }
    }

    /// Start from a previously captured unknown-field blob.
    ///
    /// Fields in the blob that this client now understands populate the
    /// builder; the rest are carried through to the built record.
    pub fn from_unknown_fields(
        raw_id: impl Into<Vec<u8>>,
        unknown_fields: &[u8],
    ) -> SyncResult<Self> {
        let (proto, unknown_fields) = proto::decode_with_unknown(unknown_fields)?;
        Ok(Self {
            raw_id: raw_id.into(),
            proto,
            unknown_fields,
        })
    }

    pub fn with_aci(mut self, aci: Option<Aci>) -> Self {
        self.proto.aci = aci
            .map(|a| a.to_service_id_string().into_bytes())
            .unwrap_or_default();
        self
    }

    pub fn with_pni(mut self, pni: Option<Pni>) -> Self {
        self.proto.pni = pni.map(|p| p.0.to_string().into_bytes()).unwrap_or_default();
        self
    }

    pub fn with_e164(mut self, e164: Option<&str>) -> Self {
        self.proto.e164 = e164.unwrap_or_default().as_bytes().to_vec();
        self
    }

    pub fn with_profile_key(mut self, profile_key: Option<&[u8]>) -> Self {
        self.proto.profile_key = profile_key.unwrap_or_default().to_vec();
        self
    }

    pub fn with_identity_key(mut self, identity_key: Option<&[u8]>) -> Self {
        self.proto.identity_key = identity_key.unwrap_or_default().to_vec();
        self
    }

    pub fn with_identity_state(mut self, state: IdentityState) -> Self {
        self.proto.set_identity_state(state);
        self
    }

    pub fn with_given_name(mut self, name: &str) -> Self {
        self.proto.given_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_family_name(mut self, name: &str) -> Self {
        self.proto.family_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_system_given_name(mut self, name: &str) -> Self {
        self.proto.system_given_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_system_family_name(mut self, name: &str) -> Self {
        self.proto.system_family_name = name.as_bytes().to_vec();
        self
    }

    pub fn with_system_nickname(mut self, name: &str) -> Self {
        self.proto.system_nickname = name.as_bytes().to_vec();
        self
    }

    pub fn with_username(mut self, username: Option<&str>) -> Self {
        self.proto.username = username.unwrap_or_default().as_bytes().to_vec();
        self
    }

    pub fn with_blocked(mut self, blocked: bool) -> Self {
        self.proto.blocked = blocked;
        self
    }

    pub fn with_profile_sharing(mut self, enabled: bool) -> Self {
        self.proto.whitelisted = enabled;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.proto.archived = archived;
        self
    }

    pub fn with_forced_unread(mut self, unread: bool) -> Self {
        self.proto.marked_unread = unread;
        self
    }

    pub fn with_muted_until(mut self, timestamp: u64) -> Self {
        self.proto.muted_until_timestamp = timestamp;
        self
    }

    pub fn with_hide_story(mut self, hide: bool) -> Self {
        self.proto.hide_story = hide;
        self
    }

    pub fn with_unregistered_timestamp(mut self, timestamp: u64) -> Self {
        self.proto.unregistered_at_timestamp = timestamp;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.proto.hidden = hidden;
        self
    }

    pub fn with_pni_signature_verified(mut self, verified: bool) -> Self {
        self.proto.pni_signature_verified = verified;
        self
    }

    /// Both parts blank clears the nickname. Otherwise fields of the previous
    /// nickname this client doesn't know are kept.
    pub fn with_nickname(mut self, given: &str, family: &str) -> Self {
        self.proto.nickname = if given.is_empty() && family.is_empty() {
            None
        } else {
            let name = contact_record::Name {
                given: given.as_bytes().to_vec(),
                family: family.as_bytes().to_vec(),
            };
            Some(reencode_nested(&name, self.proto.nickname.as_deref()))
        };
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.proto.note = note.as_bytes().to_vec();
        self
    }

    pub fn build(self) -> ContactRecord {
        ContactRecord::from_proto(self.raw_id, self.proto, self.unknown_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::unknown_fields::encode_len_field;
    use crate::types::StorageIdType;

    const ACI: &str = "5f8a0b3c-6d1e-4f2a-9b7c-0123456789ab";

    fn full_contact() -> ContactRecord {
        ContactRecordBuilder::new(vec![1u8; 16])
            .with_aci(Aci::parse_or_none(ACI))
            .with_pni(Pni::parse_or_none("PNI:0f8a0b3c-6d1e-4f2a-9b7c-0123456789ab"))
            .with_e164(Some("+15551234567"))
            .with_profile_key(Some(&[5u8; 32][..]))
            .with_identity_key(Some(&[6u8; 33][..]))
            .with_identity_state(IdentityState::Verified)
            .with_given_name("Ada")
            .with_family_name("Lovelace")
            .with_system_given_name("Augusta")
            .with_system_nickname("Countess")
            .with_username(Some("ada.01"))
            .with_blocked(true)
            .with_profile_sharing(true)
            .with_muted_until(1_700_000_000_000)
            .with_nickname("Ada", "")
            .with_note("met at the analytical engine demo")
            .build()
    }

    #[test]
    fn test_builder_sets_fields() {
        let contact = full_contact();

        assert_eq!(contact.id().id_type(), Some(StorageIdType::Contact));
        assert_eq!(contact.aci().unwrap().to_service_id_string(), ACI);
        assert!(contact.pni().is_some());
        assert_eq!(contact.e164(), Some("+15551234567"));
        assert_eq!(contact.profile_key(), Some(&[5u8; 32][..]));
        assert_eq!(contact.identity_state(), IdentityState::Verified);
        assert_eq!(contact.given_name(), Some("Ada"));
        assert_eq!(contact.system_family_name(), None);
        assert_eq!(contact.username(), Some("ada.01"));
        assert!(contact.is_blocked());
        assert!(contact.is_profile_sharing_enabled());
        assert!(!contact.is_archived());
        assert_eq!(contact.muted_until(), 1_700_000_000_000);
        assert_eq!(contact.nickname_given_name(), Some("Ada"));
        assert_eq!(contact.nickname_family_name(), None);
        assert!(!contact.has_unknown_fields());
    }

    #[test]
    fn test_payload_roundtrip() {
        let contact = full_contact();
        let decoded =
            ContactRecord::decode_payload(contact.id().raw().to_vec(), &contact.encode_payload())
                .unwrap();
        assert_eq!(decoded, contact);
        assert!(decoded.describe_diff(&contact).is_empty());
    }

    #[test]
    fn test_malformed_identifiers_degrade_to_absent() {
        let proto = proto::ContactRecord {
            aci: b"definitely-not-a-uuid".to_vec(),
            pni: b"PNI:also-not".to_vec(),
            e164: b"5551234567".to_vec(),
            blocked: true,
            ..Default::default()
        };
        let contact = ContactRecord::from_proto(vec![1u8; 16], proto, None);

        assert!(contact.aci().is_none());
        assert!(contact.pni().is_none());
        assert!(contact.e164().is_none());
        assert!(contact.is_blocked());
        // The raw payload is untouched
        assert_eq!(contact.proto().aci, b"definitely-not-a-uuid");
    }

    #[test]
    fn test_non_utf8_text_degrades_to_absent() {
        let proto = proto::ContactRecord {
            aci: vec![0xff, 0xfe, 0xfd],
            given_name: vec![b'A', 0xc3],
            note: vec![0x80],
            blocked: true,
            ..Default::default()
        };
        let contact = ContactRecord::from_proto(vec![1u8; 16], proto, None);

        assert!(contact.aci().is_none());
        assert!(contact.given_name().is_none());
        assert!(contact.note().is_none());
        assert!(contact.is_blocked());

        let decoded =
            ContactRecord::decode_payload(vec![1u8; 16], &contact.encode_payload()).unwrap();
        assert_eq!(decoded.proto().aci, vec![0xff, 0xfe, 0xfd]);
        assert_eq!(decoded.proto().given_name, vec![b'A', 0xc3]);
    }

    #[test]
    fn test_nickname_unknown_fields_survive() {
        let mut nickname = encode_len_field(1, b"Ada");
        nickname.extend(encode_len_field(7, b"pronunciation"));
        let payload = encode_len_field(22, &nickname);

        let contact = ContactRecord::decode_payload(vec![1u8; 16], &payload).unwrap();
        assert_eq!(contact.nickname_given_name(), Some("Ada"));
        assert!(!contact.has_unknown_fields());
        assert_eq!(contact.encode_payload(), payload);

        let renamed = contact.to_builder().with_nickname("Augusta", "King").build();
        let name_bytes = renamed.proto().nickname.clone().unwrap();
        assert!(name_bytes.ends_with(&encode_len_field(7, b"pronunciation")));
        assert_eq!(renamed.nickname_given_name(), Some("Augusta"));
        assert_eq!(renamed.nickname_family_name(), Some("King"));
    }

    #[test]
    fn test_malformed_nickname_reads_absent() {
        let proto = proto::ContactRecord {
            nickname: Some(vec![(1 << 3) | 2, 10, b'A']),
            ..Default::default()
        };
        let contact = ContactRecord::from_proto(vec![1u8; 16], proto, None);
        assert!(contact.nickname_given_name().is_none());
        assert!(contact.nickname_family_name().is_none());
    }

    #[test]
    fn test_unrecognized_identity_state_reads_default() {
        let proto = proto::ContactRecord {
            identity_state: 9,
            ..Default::default()
        };
        let contact = ContactRecord::from_proto(vec![1u8; 16], proto, None);
        assert_eq!(contact.identity_state(), IdentityState::Default);
        assert_eq!(contact.proto().identity_state, 9);
    }

    #[test]
    fn test_unknown_fields_survive_rebuild() {
        let future_field = encode_len_field(99, b"from a newer client");
        let mut payload = full_contact().encode_payload();
        payload.extend_from_slice(&future_field);

        let decoded = ContactRecord::decode_payload(vec![1u8; 16], &payload).unwrap();
        assert_eq!(decoded.unknown_fields(), Some(future_field.as_slice()));

        let rebuilt = ContactRecordBuilder::from_unknown_fields(
            vec![1u8; 16],
            decoded.unknown_fields().unwrap(),
        )
        .unwrap()
        .with_e164(Some("+15557654321"))
        .build();

        assert_eq!(rebuilt.unknown_fields(), Some(future_field.as_slice()));
        assert_eq!(rebuilt.e164(), Some("+15557654321"));
        assert!(rebuilt.encode_payload().ends_with(&future_field));
    }

    #[test]
    fn test_seed_picks_up_fields_now_known() {
        // A blob captured by a client that didn't know the `note` field
        let blob = encode_len_field(23, b"remember the milk");
        let contact = ContactRecordBuilder::from_unknown_fields(vec![1u8; 16], &blob)
            .unwrap()
            .build();

        assert_eq!(contact.note(), Some("remember the milk"));
        assert!(!contact.has_unknown_fields());
    }

    #[test]
    fn test_to_builder_updates_single_field() {
        let original = full_contact();
        let updated = original.to_builder().with_archived(true).build();
        assert_eq!(updated.describe_diff(&original), vec!["archived"]);
    }

    #[test]
    fn test_describe_diff_order() {
        let a = full_contact();
        let b = a
            .to_builder()
            .with_note("")
            .with_blocked(false)
            .with_given_name("Augusta")
            .build();
        assert_eq!(a.describe_diff(&b), vec!["given_name", "blocked", "note"]);
    }
}
